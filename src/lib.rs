//! Render Ableton Live sets (`.als`) as deterministic, diffable text.
//!
//! ```no_run
//! let bytes = std::fs::read("song.als").unwrap();
//! let project = alsdiff::decode(&bytes).unwrap();
//! print!("{}", alsdiff::render(&project));
//! ```

pub mod cli;
pub mod io;
pub mod model;
pub mod parse;
pub mod util;

pub use model::{Project, RenderOptions, Warning};
pub use parse::{DecodeError, decode, render, render_with};

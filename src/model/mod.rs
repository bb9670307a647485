pub mod clip;
pub mod config;
pub mod device;
pub mod project;
pub mod track;
pub mod warning;

pub use clip::*;
pub use config::*;
pub use device::*;
pub use project::*;
pub use track::*;
pub use warning::*;

pub mod clip_parser;
pub mod container;
pub mod context;
pub mod device_parser;
pub mod error;
pub mod project_parser;
pub mod project_serializer;
pub mod track_parser;
pub mod track_serializer;
pub mod tree;

pub use container::decompress;
pub use error::DecodeError;
pub use project_parser::extract_project;
pub use project_serializer::{render, render_with};
pub use tree::{Node, parse_tree};

use crate::model::project::Project;

/// Decode the raw bytes of a Live set into its semantic model:
/// decompress, parse the XML into a tree, then extract the project.
pub fn decode(bytes: &[u8]) -> Result<Project, DecodeError> {
    let xml = decompress(bytes)?;
    let tree = parse_tree(&xml)?;
    extract_project(&tree)
}

use std::fmt;

use serde::Serialize;

/// A non-fatal problem found while extracting the project model.
///
/// The entity named by `path` is degraded (dropped, or the field left absent)
/// and extraction continues for everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Warning {
    /// A required identity field is missing, so the entity was dropped
    #[serde(rename = "incomplete_project")]
    IncompleteProject { path: String, missing: String },
    /// A field that should be numeric holds something else
    #[serde(rename = "invalid_number")]
    InvalidNumber {
        path: String,
        field: String,
        raw: String,
    },
    /// A track points at a group that doesn't exist
    #[serde(rename = "unresolved_group")]
    UnresolvedGroup { path: String, group_id: String },
    /// Following group membership from this track leads back to it
    #[serde(rename = "group_cycle")]
    GroupCycle { path: String },
}

impl Warning {
    /// The entity path this warning refers to
    pub fn path(&self) -> &str {
        match self {
            Warning::IncompleteProject { path, .. }
            | Warning::InvalidNumber { path, .. }
            | Warning::UnresolvedGroup { path, .. }
            | Warning::GroupCycle { path } => path,
        }
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, Warning::IncompleteProject { .. })
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::IncompleteProject { path, missing } => {
                write!(f, "{}: missing {}", path, missing)
            }
            Warning::InvalidNumber { path, field, raw } => {
                write!(f, "{}: {} is not a number: {:?}", path, field, raw)
            }
            Warning::UnresolvedGroup { path, group_id } => {
                write!(f, "{}: group {} not found", path, group_id)
            }
            Warning::GroupCycle { path } => {
                write!(f, "{}: group membership forms a cycle", path)
            }
        }
    }
}

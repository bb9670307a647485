use serde::Serialize;

use crate::model::warning::Warning;

/// `check --json` output for one set
#[derive(Serialize)]
pub struct CheckJson {
    pub file: String,
    pub ok: bool,
    /// Kind of fatal decode error, when the set couldn't be decoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorJson>,
    pub warnings: Vec<Warning>,
}

#[derive(Serialize)]
pub struct ErrorJson {
    pub kind: String,
    pub message: String,
}

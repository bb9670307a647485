/// Fatal failure decoding one Live set
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("corrupt container: {0}")]
    CorruptContainer(String),
    #[error("unsupported container: {0}")]
    UnsupportedContainer(String),
    #[error("malformed structure at byte {position}: {message}")]
    MalformedStructure { position: u64, message: String },
}

impl DecodeError {
    pub(crate) fn malformed(position: u64, message: impl Into<String>) -> Self {
        DecodeError::MalformedStructure {
            position,
            message: message.into(),
        }
    }

    /// Short machine-friendly name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::CorruptContainer(_) => "corrupt_container",
            DecodeError::UnsupportedContainer(_) => "unsupported_container",
            DecodeError::MalformedStructure { .. } => "malformed_structure",
        }
    }
}

use thiserror::Error;

/// Failure of a single directory request. Never fatal: the screen only
/// reports that it cannot currently proceed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl DirectoryError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

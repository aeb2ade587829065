use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no relay accepted the message: {0}")]
    Unreachable(String),

    #[error("recipient rejected the message: {0}")]
    Rejected(String),

    #[error("payload of {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

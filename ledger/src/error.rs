use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger request failed: {0}")]
    Transport(String),

    #[error("ledger returned HTTP {status}")]
    Http { status: u16 },

    #[error("ledger error: {0}")]
    Node(String),

    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// `serde_json::Error` is not `Clone`; a cloned serialization error keeps
/// its message and its variant.
impl Clone for LedgerError {
    fn clone(&self) -> Self {
        match self {
            Self::Transport(msg) => Self::Transport(msg.clone()),
            Self::Http { status } => Self::Http { status: *status },
            Self::Node(msg) => Self::Node(msg.clone()),
            Self::InvalidResponse(msg) => Self::InvalidResponse(msg.clone()),
            Self::Serialization(e) => {
                Self::Serialization(<serde_json::Error as serde::de::Error>::custom(e))
            }
        }
    }
}

impl LedgerError {
    /// Failures worth retrying the same call for.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status } => *status >= 500,
            _ => false,
        }
    }
}

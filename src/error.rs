use std::fmt;

use thiserror::Error;

/// Remote operations a session performs against its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Save,
    Delete,
    LoadImageProfiles,
    SaveImageProfiles,
    Backup,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::Load => "load",
            Operation::Save => "save",
            Operation::Delete => "delete",
            Operation::LoadImageProfiles => "load image profiles",
            Operation::SaveImageProfiles => "save image profiles",
            Operation::Backup => "backup",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// Rejected before any network call; the session is untouched.
    #[error("{message}")]
    Validation { message: String, issues: Vec<String> },

    /// The store rejected the call. The user has already been notified.
    #[error("{operation} failed: {message}")]
    Transport { operation: Operation, message: String },

    #[error("a {0} is already in flight for this session")]
    OperationInProgress(Operation),

    #[error("no document is bound to this session")]
    Unbound,

    #[error("session is closed")]
    Closed,

    #[error("invalid document schema: {0}")]
    Schema(String),

    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode document: {0}")]
    Decode(#[source] serde_json::Error),
}

impl SessionError {
    pub fn validation(message: impl Into<String>) -> Self {
        SessionError::Validation {
            message: message.into(),
            issues: Vec::new(),
        }
    }

    pub(crate) fn transport(operation: Operation, err: &anyhow::Error) -> Self {
        SessionError::Transport {
            operation,
            message: format!("{err:#}"),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SessionError::Transport { .. })
    }
}

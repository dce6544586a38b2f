use thiserror::Error;

/// Failure of a single call against the remote service.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The call could not complete: connection refused, timeout, or a body
    /// that could not be decoded.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service rejected the credentials. The credential store has already
    /// been cleared by the time this reaches a caller.
    #[error("Not authorized")]
    Unauthorized { message: Option<String> },

    /// Any other non-success response.
    #[error("Remote call failed with status {status}")]
    Remote {
        status: u16,
        message: Option<String>,
    },
}

impl RemoteError {
    /// Human-readable message sent by the service, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Transport(_) => None,
            Self::Unauthorized { message } | Self::Remote { message, .. } => message.as_deref(),
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

use std::fmt;

use thiserror::Error;

/// Classification of a failed API call, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    RateLimited,
    /// Any other non-2xx response.
    Http(u16),
    NetworkFailure,
    DecodeFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "repository not found"),
            ErrorKind::RateLimited => write!(f, "API rate limit exceeded"),
            ErrorKind::Http(status) => write!(f, "request rejected with status {}", status),
            ErrorKind::NetworkFailure => write!(f, "network failure"),
            ErrorKind::DecodeFailure => write!(f, "unexpected response from the API"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LensError {
    #[error("API error: {kind}: {message}")]
    Api { kind: ErrorKind, message: String },

    #[error("Invalid repository identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Client error: {0}")]
    Client(String),
}

impl LensError {
    /// Kind used when the failure ends up on screen.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LensError::Api { kind, .. } => *kind,
            _ => ErrorKind::NetworkFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, LensError>;

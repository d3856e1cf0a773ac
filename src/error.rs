// Error module: every failure the client and the session loop can produce.
// Each error has two faces: a short public message that is safe to show to
// the user, and a diagnostic rendering with the full cause chain that is only
// printed when debug output is enabled.

use std::error::Error as StdError;
use std::fmt::{self, Write};

use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidConfig,
    Unexpected,
    Response,
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidConfig => "invalid_config",
            ErrorKind::Unexpected => "unexpected",
            ErrorKind::Response => "response",
            ErrorKind::NotFound => "not_found",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Settings or client configuration were rejected before any request.
    #[error("{0}")]
    InvalidConfig(String),

    /// The HTTP call itself failed (connect, timeout, body read).
    #[error("request failed")]
    Transport(#[source] reqwest::Error),

    /// The API answered with a non-200 status. `message` is already the
    /// public text (out-of-range pages get a friendlier one).
    #[error("invalid response")]
    Response {
        status: u16,
        code: i64,
        message: String,
    },

    /// A 200 body that does not look like a page of movies.
    #[error("cannot decode response body")]
    Decode(#[source] serde_json::Error),

    #[error("invalid type {0:?}")]
    UnknownKind(String),

    #[error("page {0} is less than one")]
    InvalidPage(i64),

    #[error("client connections already released")]
    Closed,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Error::Response { .. } => ErrorKind::Response,
            Error::UnknownKind(_) => ErrorKind::NotFound,
            Error::Transport(_) | Error::Decode(_) | Error::InvalidPage(_) | Error::Closed => {
                ErrorKind::Unexpected
            }
        }
    }

    /// Short, stable message meant for the user.
    pub fn public(&self) -> &str {
        match self {
            Error::InvalidConfig(_) => "Invalid configuration.",
            Error::Transport(_) => "Cannot fetch data from API.",
            Error::Response { message, .. } => message,
            Error::Decode(_) => "Unexpected response from the API.",
            Error::UnknownKind(_) => {
                r#"Unknown "-type" value for fetch. Allowed [playing,popular,top,upcoming]"#
            }
            Error::InvalidPage(_) => {
                "Invalid page: Pages start at 1 and max at 500. They are expected to be an integer."
            }
            Error::Closed => "Client connections are already closed.",
        }
    }

    /// Full rendering for debug output: classification, message, response
    /// context and every `source()` in the chain.
    pub fn diagnostic(&self) -> String {
        let mut out = format!("[{}] {}", self.kind(), self);
        if let Error::Response {
            status,
            code,
            message,
        } = self
        {
            let _ = write!(out, " (status={status}, code={code}, message={message:?})");
        }
        let mut source = self.source();
        while let Some(cause) = source {
            let _ = write!(out, ": {cause}");
            source = cause.source();
        }
        out
    }
}

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unexpected error received from server: status code={status} reason={reason}")]
    Server { status: u16, reason: String },

    #[error("failed to download log, error code: {status}, reason: {reason}")]
    Download { status: u16, reason: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("unrecognized build type: {0}")]
    UnrecognizedBuildType(String),

    #[error("{}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl Error {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

// The legacy client error only says "client error (Connect)", the cause is in the chain.
impl From<hyper_util::client::legacy::Error> for Error {
    fn from(e: hyper_util::client::legacy::Error) -> Self {
        let mut msg = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            msg.push_str(": ");
            msg.push_str(&cause.to_string());
            source = std::error::Error::source(cause);
        }
        Self::Transport(msg)
    }
}

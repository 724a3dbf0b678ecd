use thiserror::Error;

use crate::api::{RunId, RunStatus};

#[derive(Debug, Error)]
pub enum Error {
    /// The backend answered with a non-success status code.
    #[error("assistant api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure talking to the backend.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A run reached a terminal status other than completed.
    #[error("run {run_id} ended as {status}")]
    RunEnded { run_id: RunId, status: RunStatus },

    /// Polling was aborted by shutdown before the run completed.
    #[error("run polling cancelled")]
    PollCancelled,

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

/// One variant per pipeline stage, so a logged failure names the operation
/// that produced it.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Session(#[from] mantle_sessions::Error),

    #[error("message submission failed: {source}")]
    Submission {
        #[source]
        source: mantle_assistant::Error,
    },

    #[error("run polling failed: {source}")]
    Poll {
        #[source]
        source: mantle_assistant::Error,
    },

    #[error("reply retrieval failed: {source}")]
    Retrieval {
        #[source]
        source: mantle_assistant::Error,
    },

    #[error("reply delivery failed: {source}")]
    Outbound {
        #[source]
        source: mantle_channels::Error,
    },
}

impl Error {
    /// Whether this failure is a shutdown-driven poll abort, which is logged
    /// but never answered with the fallback message.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Poll {
                source: mantle_assistant::Error::PollCancelled,
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

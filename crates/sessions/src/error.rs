use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Backend thread creation failed. The session stays cold, so the next
    /// message for the identifier retries creation from scratch.
    #[error("thread creation failed for {identifier}: {source}")]
    ThreadCreation {
        identifier: String,
        #[source]
        source: mantle_assistant::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

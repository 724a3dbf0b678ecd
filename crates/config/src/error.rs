use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("missing required configuration: {}", keys.join(", "))]
    Missing { keys: Vec<String> },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn missing(keys: Vec<String>) -> Self {
        Self::Missing { keys }
    }
}

impl mantle_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

mantle_common::impl_context!();

//! Shared error machinery used across all mantle crates.

pub mod error;

pub use error::{Error, FromMessage, Result};

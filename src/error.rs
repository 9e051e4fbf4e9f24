//! Error types for itsy operations.

use thiserror::Error;

/// Errors that can occur while querying or mutating a document.
///
/// Mutation is forgiving: class, style, content, and child operations on
/// missing or non-element nodes are silent no-ops. The only fallible
/// surface is selector parsing.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

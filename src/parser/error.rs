use thiserror::Error;

/// Failure raised by a per-type parser. Never escapes the pipeline: the
/// dispatcher turns it into a stub record carrying the message.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A required element was not found in the component
    #[error("missing element: {0}")]
    Missing(&'static str),

    /// The element was found but its content could not be used
    #[error("invalid data: {0}")]
    Invalid(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ParseError>;

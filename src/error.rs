use std::fmt;

/// Errors that can occur in the request-scope crate.
#[derive(Debug)]
pub enum Error {
    /// A request context could not be retrieved from its carrier
    Extract(ExtractError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Extract(e) => write!(f, "Context extraction failed: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Extract(e) => Some(e),
        }
    }
}

impl From<ExtractError> for Error {
    fn from(e: ExtractError) -> Self {
        Error::Extract(e)
    }
}

/// A failed attempt to pull a `RequestContext` out of a carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractError {
    /// Why the extraction failed
    pub kind: ExtractErrorKind,
    /// Human-readable message describing the failure
    pub message: String,
}

impl ExtractError {
    /// Creates a new extraction error.
    pub fn new(kind: ExtractErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ExtractError {}

/// The kind of extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractErrorKind {
    /// No carrier was supplied
    NoCarrier,
    /// The carrier has nothing under the context key
    MissingKey,
    /// The value under the context key is not a `RequestContext`
    WrongType,
}

impl fmt::Display for ExtractErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractErrorKind::NoCarrier => write!(f, "NoCarrier"),
            ExtractErrorKind::MissingKey => write!(f, "MissingKey"),
            ExtractErrorKind::WrongType => write!(f, "WrongType"),
        }
    }
}

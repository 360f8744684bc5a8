//! Purpose: Numeric-code error taxonomy shared by validation and transport.
//! Exports: `Error`, `ErrorKind`, `to_code`.
//! Role: Every failure a caller can observe carries one of these codes.
//! Invariants: Code assignments are stable; new kinds append, never renumber.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Validation failed in a way no specific rule claims.
    Unclassified,
    /// A parameter failed a structural schema rule.
    InvalidParam,
    /// The element's type tag is not accepted by the target operation.
    InvalidElementType,
    /// A required element was null or missing entirely.
    NullElement,
    /// The element kind may only live on the main layer.
    LayerRestricted,
    /// An internal link did not name a destination page.
    MissingDestination,
    /// A rectangle had zero width or height.
    EmptyRect,
    /// The transport layer failed; the host never saw a well-formed call.
    Transport,
}

/// Wire code for each kind. 100 and 107 match the host's own taxonomy.
pub fn to_code(kind: ErrorKind) -> u32 {
    match kind {
        ErrorKind::Unclassified => 100,
        ErrorKind::InvalidParam => 107,
        ErrorKind::InvalidElementType => 201,
        ErrorKind::NullElement => 202,
        ErrorKind::LayerRestricted => 203,
        ErrorKind::MissingDestination => 204,
        ErrorKind::EmptyRect => 205,
        ErrorKind::Transport => 300,
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    path: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            path: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> u32 {
        to_code(self.kind)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Dotted field path for validation failures, e.g. `insertText.textBox`.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}", self.code())?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (at: {path})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

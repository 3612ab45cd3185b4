//! Error types for the document backends.
//!
//! Uses [`thiserror`] for derivation. [`BackendError`] wraps the failures of
//! lopdf, zip, and quick-xml and converts into the boundary
//! [`TranscriptError`].

use thiserror::Error;
use transcript_core::TranscriptError;

/// Error type for backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// PDF structure or syntax could not be read.
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Content stream interpretation failed.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// The Word archive could not be opened or is missing its body part.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The Word body XML is malformed.
    #[error("XML error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A core error (limits, deadline).
    #[error(transparent)]
    Core(#[from] TranscriptError),
}

impl From<quick_xml::Error> for BackendError {
    fn from(err: quick_xml::Error) -> Self {
        BackendError::Xml(err.to_string())
    }
}

impl From<BackendError> for TranscriptError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) | BackendError::Interpreter(msg) => TranscriptError::Pdf(msg),
            BackendError::Archive(e) => TranscriptError::Word(e.to_string()),
            BackendError::Xml(msg) => TranscriptError::Word(msg),
            BackendError::Io(e) => TranscriptError::Word(e.to_string()),
            BackendError::Core(e) => e,
        }
    }
}

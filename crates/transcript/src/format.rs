//! Document format tags and inference.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use transcript_core::TranscriptError;

/// The document formats the engine can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Recognize a format from the leading bytes of a document.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(Self::Pdf)
        } else if bytes.starts_with(b"PK\x03\x04") {
            Some(Self::Docx)
        } else {
            None
        }
    }

    /// Recognize a format from a file extension, ignoring case.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }

    /// Resolve the format of a document.
    ///
    /// An explicit tag wins. Otherwise the leading bytes are checked, then the
    /// file extension of `path` if one is given.
    pub fn infer(
        bytes: &[u8],
        tag: Option<&str>,
        path: Option<&Path>,
    ) -> Result<Self, TranscriptError> {
        if let Some(tag) = tag {
            return tag.parse();
        }
        if let Some(format) = Self::sniff(bytes) {
            return Ok(format);
        }
        if let Some(format) = path.and_then(Self::from_extension) {
            tracing::warn!(%format, "format taken from file extension; content signature not recognized");
            return Ok(format);
        }
        Err(TranscriptError::UnsupportedFormat(
            "could not determine document format".to_string(),
        ))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = TranscriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            other => Err(TranscriptError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

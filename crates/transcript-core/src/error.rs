//! Boundary error type and extraction options.
//!
//! Every [`TranscriptError`] is terminal for the document: callers get either
//! a complete best-effort result or one of these, never a partial result.
//! An empty transcript is not an error.

use std::time::{Duration, Instant};

use thiserror::Error;

/// Fatal extraction failure for one document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranscriptError {
    /// The document format tag was missing, unknown, or did not match the bytes.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
    /// The PDF could not be read or interpreted.
    #[error("PDF error: {0}")]
    Pdf(String),
    /// The Word document could not be read.
    #[error("Word document error: {0}")]
    Word(String),
    /// A configured resource limit was exceeded.
    #[error(
        "resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value})"
    )]
    ResourceLimitExceeded {
        /// Name of the limit that was exceeded (e.g., "max_pages").
        limit_name: String,
        limit_value: usize,
        actual_value: usize,
    },
    /// Extraction ran past its wall-clock budget.
    #[error("extraction deadline exceeded after {elapsed_ms} ms (limit: {limit_ms} ms)")]
    DeadlineExceeded { elapsed_ms: u128, limit_ms: u128 },
}

impl TranscriptError {
    pub fn limit(limit_name: &str, limit_value: usize, actual_value: usize) -> Self {
        TranscriptError::ResourceLimitExceeded {
            limit_name: limit_name.to_string(),
            limit_value,
            actual_value,
        }
    }
}

/// Resource limits applied while extracting one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Maximum input size in bytes (default: 50 MiB).
    pub max_input_bytes: usize,
    /// Maximum number of PDF pages (default: 500).
    pub max_pages: usize,
    /// Maximum nesting of Form XObjects (default: 10).
    pub max_recursion_depth: usize,
    /// Maximum content stream operators interpreted per page (default: 500,000).
    pub max_operators_per_page: usize,
    /// Wall-clock budget for the whole document (default: 30 s).
    pub deadline: Duration,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_input_bytes: 50 * 1024 * 1024,
            max_pages: 500,
            max_recursion_depth: 10,
            max_operators_per_page: 500_000,
            deadline: Duration::from_secs(30),
        }
    }
}

impl ExtractOptions {
    /// Fail if `len` input bytes exceed `max_input_bytes`.
    pub fn check_input_len(&self, len: usize) -> Result<(), TranscriptError> {
        if len > self.max_input_bytes {
            return Err(TranscriptError::limit(
                "max_input_bytes",
                self.max_input_bytes,
                len,
            ));
        }
        Ok(())
    }

    /// Start the wall-clock budget for one document.
    pub fn start_clock(&self) -> Deadline {
        Deadline {
            started: Instant::now(),
            limit: self.deadline,
        }
    }
}

/// A running wall-clock budget.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn unbounded() -> Self {
        Self {
            started: Instant::now(),
            limit: Duration::MAX,
        }
    }

    pub fn check(&self) -> Result<(), TranscriptError> {
        let elapsed = self.started.elapsed();
        if elapsed > self.limit {
            return Err(TranscriptError::DeadlineExceeded {
                elapsed_ms: elapsed.as_millis(),
                limit_ms: self.limit.as_millis(),
            });
        }
        Ok(())
    }
}

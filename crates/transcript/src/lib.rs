//! transcript: total the credits on an academic transcript.
//!
//! This is the public API facade crate. It re-exports types from
//! transcript-core and uses transcript-parse to read documents.
//!
//! # Architecture
//!
//! - **transcript-core**: backend-independent data types and algorithms
//! - **transcript-parse**: PDF content interpretation and Word table reading
//! - **transcript** (this crate): public API that ties everything together

mod document;
mod format;

pub use document::{Analysis, ExtractedTables, TableSource, Transcript};
pub use format::DocumentFormat;
pub use transcript_core;
pub use transcript_core::{
    AggregateResult, Category, Column, CourseRecord, ExtractOptions, Field, RawTable, RuleSet,
    StandardTable, TableSettings, TranscriptError,
};
pub use transcript_parse;

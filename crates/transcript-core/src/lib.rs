//! transcript-core: Backend-independent data types and algorithms.
//!
//! This crate provides the geometry and lattice table detection used by the
//! PDF backend, the raw grid model every backend produces, and the stages
//! that turn grids into credit totals: column standardization, the
//! text-line fallback, course classification, grade evaluation, and
//! aggregation.

pub mod aggregate;
pub mod classify;
pub mod columns;
pub mod curriculum;
pub mod edges;
pub mod error;
pub mod fallback;
pub mod geometry;
pub mod grade;
pub mod grid;
pub mod table;
pub mod text;

pub use aggregate::{AggregateResult, CourseRecord, CreditAggregator, aggregate, parse_credit};
pub use classify::{Category, RuleSet, normalize_course_name};
pub use columns::{Column, Field, FieldIndex, StandardTable, standardize, standardize_header};
pub use edges::{Edge, EdgeSource};
pub use error::{Deadline, ExtractOptions, TranscriptError};
pub use fallback::{FallbackRow, fallback_table};
pub use geometry::{BBox, Ctm, Orientation};
pub use grade::is_passing;
pub use grid::RawTable;
pub use table::{Cell, Table, TableFinder, TableSettings};
pub use text::{Glyph, LineOptions, normalize_opt, normalize_text};

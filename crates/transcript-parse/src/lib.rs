//! transcript-parse: document backends for transcript-credits.
//!
//! The PDF side opens documents with [`lopdf`] and interprets page content
//! streams into positioned glyphs and ruling edges. The Word side reads the
//! tables of a `.docx` body directly. Both depend on transcript-core for the
//! shared data types.

pub mod cmap;
pub mod docx;
pub mod error;
pub mod font;
pub mod interpreter;
pub mod lopdf_backend;
pub mod tokenizer;

pub use docx::read_word_tables;
pub use error::BackendError;
pub use interpreter::{PageContent, PageInterpreter};
pub use lopdf_backend::PdfDocument;
pub use transcript_core;

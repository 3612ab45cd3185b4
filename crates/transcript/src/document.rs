//! Top-level document type: table extraction and credit analysis.

use transcript_core::text::assemble_lines;
use transcript_core::{
    AggregateResult, Deadline, ExtractOptions, Glyph, RawTable, RuleSet, StandardTable,
    TableFinder, TableSettings, TranscriptError, aggregate, fallback_table, standardize,
};
use transcript_parse::{PageContent, PdfDocument, read_word_tables};

use crate::format::DocumentFormat;

/// Where a document's tables came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TableSource {
    /// Ruled tables detected on PDF pages.
    Tables,
    /// Text lines of a PDF without ruled tables.
    TextFallback,
    /// Tables of a Word document.
    Word,
}

/// Raw tables of one document plus where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTables {
    pub source: TableSource,
    pub tables: Vec<RawTable>,
}

/// Outcome of analyzing one document.
///
/// An empty transcript is [`Analysis::NoDataFound`], not an error; failures
/// to read the document are reported as [`TranscriptError`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum Analysis {
    Extracted {
        source: TableSource,
        result: AggregateResult,
    },
    NoDataFound,
}

impl Analysis {
    /// The aggregate, or `None` when the document held no course rows.
    pub fn result(&self) -> Option<&AggregateResult> {
        match self {
            Analysis::Extracted { result, .. } => Some(result),
            Analysis::NoDataFound => None,
        }
    }

    /// The aggregate; all totals are zero for [`Analysis::NoDataFound`].
    pub fn into_result(self) -> AggregateResult {
        match self {
            Analysis::Extracted { result, .. } => result,
            Analysis::NoDataFound => AggregateResult::default(),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Analysis::NoDataFound)
    }
}

enum Backend {
    Pdf(PdfDocument),
    /// Word tables are read in full when the document is opened.
    Word(Vec<RawTable>),
}

/// A transcript document opened for extraction.
///
/// # Example
///
/// ```ignore
/// let transcript = Transcript::open(&bytes, DocumentFormat::Pdf, None)?;
/// match transcript.analyze()? {
///     Analysis::Extracted { result, .. } => println!("{:.2}", result.total),
///     Analysis::NoDataFound => println!("no course rows"),
/// }
/// ```
pub struct Transcript {
    format: DocumentFormat,
    backend: Backend,
    options: ExtractOptions,
    settings: TableSettings,
    deadline: Deadline,
}

impl Transcript {
    /// Open a document from bytes.
    ///
    /// `options` defaults to [`ExtractOptions::default`] when `None`. The
    /// wall-clock budget starts here and covers the later extraction calls.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptError`] if the bytes exceed the input limit or
    /// cannot be read as `format`.
    pub fn open(
        bytes: &[u8],
        format: DocumentFormat,
        options: Option<ExtractOptions>,
    ) -> Result<Self, TranscriptError> {
        let options = options.unwrap_or_default();
        let deadline = options.start_clock();
        let backend = match format {
            DocumentFormat::Pdf => Backend::Pdf(PdfDocument::open(bytes, &options)?),
            DocumentFormat::Docx => Backend::Word(read_word_tables(bytes, &options)?),
        };
        deadline.check()?;
        Ok(Self {
            format,
            backend,
            options,
            settings: TableSettings::default(),
            deadline,
        })
    }

    /// Replace the lattice detection tolerances used for PDF pages.
    pub fn with_table_settings(mut self, settings: TableSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Raw tables in extraction order.
    ///
    /// For PDFs, ruled tables are collected page by page. Tables without a
    /// data row are dropped. If no page yields a table, every page's text
    /// lines go through the fallback pattern instead; when nothing matches
    /// the returned list is empty.
    pub fn tables(&self) -> Result<ExtractedTables, TranscriptError> {
        match &self.backend {
            Backend::Pdf(doc) => self.pdf_tables(doc),
            Backend::Word(tables) => Ok(ExtractedTables {
                source: TableSource::Word,
                tables: tables.clone(),
            }),
        }
    }

    /// Tables with their headers mapped onto the canonical schema.
    pub fn standardized_tables(&self) -> Result<(TableSource, Vec<StandardTable>), TranscriptError> {
        let extracted = self.tables()?;
        let tables = extracted.tables.into_iter().map(standardize).collect();
        Ok((extracted.source, tables))
    }

    /// Analyze against the built-in curriculum.
    pub fn analyze(&self) -> Result<Analysis, TranscriptError> {
        self.analyze_with(RuleSet::builtin())
    }

    /// Analyze against a caller-supplied rule set.
    pub fn analyze_with(&self, rules: &RuleSet) -> Result<Analysis, TranscriptError> {
        let (source, tables) = self.standardized_tables()?;
        if tables.is_empty() {
            tracing::debug!(format = %self.format, "no course rows found");
            return Ok(Analysis::NoDataFound);
        }
        let result = aggregate(&tables, rules);
        tracing::debug!(
            ?source,
            tables = tables.len(),
            passed = result.passed.len(),
            failed = result.failed.len(),
            total = result.total,
            "analysis finished"
        );
        Ok(Analysis::Extracted { source, result })
    }

    fn pdf_tables(&self, doc: &PdfDocument) -> Result<ExtractedTables, TranscriptError> {
        let mut tables = Vec::new();
        // Only needed while no table has been found.
        let mut lines: Vec<String> = Vec::new();

        for index in 0..doc.page_count() {
            let PageContent { glyphs, edges } =
                doc.page_content(index, &self.options, self.deadline)?;
            let found = TableFinder::new(edges, self.settings.clone())
                .with_deadline(self.deadline)
                .extract(&glyphs)?;
            tracing::debug!(page = index + 1, tables = found.len(), "lattice detection");

            tables.extend(
                found
                    .iter()
                    .filter_map(|table| RawTable::from_grid(table.to_grid()))
                    .filter(|table| !table.is_empty()),
            );
            if tables.is_empty() {
                let refs: Vec<&Glyph> = glyphs.iter().collect();
                lines.extend(assemble_lines(&refs, &self.settings.text));
            }
        }

        if !tables.is_empty() {
            return Ok(ExtractedTables {
                source: TableSource::Tables,
                tables,
            });
        }

        self.deadline.check()?;
        tracing::debug!(lines = lines.len(), "no ruled tables; trying text fallback");
        Ok(ExtractedTables {
            source: TableSource::TextFallback,
            tables: fallback_table(lines.iter().map(String::as_str))
                .into_iter()
                .collect(),
        })
    }
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcript")
            .field("format", &self.format)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

//! Word (`.docx`) table reader.
//!
//! Reads `word/document.xml` from the package and walks it with a pull
//! parser. Every top-level `<w:tbl>` becomes one grid; tables nested inside
//! cells are skipped along with their text. A cell spanning several grid
//! columns (`<w:gridSpan>`) is followed by empty cells for the columns it
//! covers, so the grid keeps one string per column.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use transcript_core::{ExtractOptions, RawTable, TranscriptError};

use crate::error::BackendError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Read every usable table from a `.docx` package.
///
/// Tables with fewer than two rows, or with no non-empty data row, are
/// dropped.
pub fn read_word_tables(bytes: &[u8], options: &ExtractOptions) -> Result<Vec<RawTable>, BackendError> {
    options.check_input_len(bytes.len())?;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let part = archive.by_name(DOCUMENT_PART)?;

    // Cap the inflated size as well, so a small archive cannot expand without bound.
    let limit = options.max_input_bytes;
    let mut raw = Vec::new();
    part.take(limit as u64 + 1).read_to_end(&mut raw)?;
    if raw.len() > limit {
        return Err(TranscriptError::limit("max_input_bytes", limit, raw.len()).into());
    }
    let xml = String::from_utf8(raw)
        .map_err(|e| BackendError::Xml(format!("{DOCUMENT_PART} is not UTF-8: {e}")))?;

    let grids = table_grids(&xml)?;
    tracing::debug!(tables = grids.len(), "read Word tables");

    Ok(grids
        .into_iter()
        .filter(|grid| grid.len() >= 2)
        .filter_map(RawTable::from_grid)
        .filter(|table| !table.is_empty())
        .collect())
}

#[derive(Default)]
struct TableWalker {
    depth: usize,
    tables: Vec<Vec<Vec<String>>>,
    rows: Vec<Vec<String>>,
    row: Option<Vec<String>>,
    cell: Option<String>,
    span: usize,
    paragraphs: usize,
    in_text: bool,
}

impl TableWalker {
    /// Whether we are directly inside a top-level table.
    fn top_level(&self) -> bool {
        self.depth == 1
    }

    fn start(&mut self, e: &BytesStart<'_>) -> Result<(), BackendError> {
        let name = e.name();
        if name.as_ref() == b"w:tbl" {
            self.depth += 1;
            if self.top_level() {
                self.rows.clear();
            }
            return Ok(());
        }
        if !self.top_level() {
            return Ok(());
        }
        match name.as_ref() {
            b"w:tr" => self.row = Some(Vec::new()),
            b"w:tc" => {
                self.cell = Some(String::new());
                self.span = 1;
                self.paragraphs = 0;
            }
            b"w:p" => {
                if let Some(cell) = self.cell.as_mut() {
                    if self.paragraphs > 0 {
                        cell.push('\n');
                    }
                    self.paragraphs += 1;
                }
            }
            b"w:t" => self.in_text = true,
            _ => self.empty(e)?,
        }
        Ok(())
    }

    fn empty(&mut self, e: &BytesStart<'_>) -> Result<(), BackendError> {
        if !self.top_level() {
            return Ok(());
        }
        match e.name().as_ref() {
            b"w:gridSpan" => {
                if let Some(attr) = e
                    .try_get_attribute("w:val")
                    .map_err(|err| BackendError::Xml(err.to_string()))?
                {
                    let value = attr.unescape_value()?;
                    self.span = value.trim().parse::<usize>().unwrap_or(1).clamp(1, 64);
                }
            }
            b"w:tc" => {
                if let (None, Some(row)) = (&self.cell, self.row.as_mut()) {
                    row.push(String::new());
                }
            }
            b"w:tab" => self.push_text(" "),
            b"w:br" | b"w:cr" => self.push_text("\n"),
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        if name == b"w:tbl" {
            if self.top_level() {
                self.tables.push(std::mem::take(&mut self.rows));
            }
            self.depth = self.depth.saturating_sub(1);
            return;
        }
        if !self.top_level() {
            return;
        }
        match name {
            b"w:tr" => {
                if let Some(row) = self.row.take() {
                    self.rows.push(row);
                }
            }
            b"w:tc" => {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    row.push(cell);
                    row.extend(std::iter::repeat_n(String::new(), self.span - 1));
                }
            }
            b"w:t" => self.in_text = false,
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.push_str(text);
        }
    }
}

/// Cell text of every top-level table, in document order.
pub fn table_grids(xml: &str) -> Result<Vec<Vec<Vec<String>>>, BackendError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut walker = TableWalker::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => walker.start(e)?,
            Event::Empty(ref e) => walker.empty(e)?,
            Event::End(ref e) => walker.end(e.name().as_ref()),
            Event::Text(ref e) if walker.in_text && walker.top_level() => {
                let text = e.unescape()?;
                walker.push_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.tables)
}

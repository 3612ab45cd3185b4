//! Raw extracted grids.
//!
//! Every backend hands its tables over as a [`RawTable`]: a normalized header
//! row plus data rows that are each exactly as wide as the header.

use crate::text::normalize_text;

/// A header row plus data rows of identical width.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from a cell grid whose first row is the header.
    ///
    /// All cells are whitespace-normalized, data rows are reconciled to the
    /// header width, and rows that are empty after normalization are dropped.
    /// Returns `None` when the grid has no header row.
    pub fn from_grid<R, C>(grid: impl IntoIterator<Item = R>) -> Option<Self>
    where
        R: IntoIterator<Item = C>,
        C: AsRef<str>,
    {
        let mut grid = grid.into_iter();
        let header: Vec<String> = grid
            .next()?
            .into_iter()
            .map(|c| normalize_text(c.as_ref()))
            .collect();

        let width = header.len();
        let rows = grid
            .map(|row| {
                reconcile_row(
                    row.into_iter().map(|c| normalize_text(c.as_ref())).collect(),
                    width,
                )
            })
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .collect();

        Some(Self { header, rows })
    }

    /// Number of header columns; every data row has exactly this many cells.
    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Right-pad with empty strings or right-truncate `row` to `width` cells.
pub fn reconcile_row(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

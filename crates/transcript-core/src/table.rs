//! Lattice table detection.
//!
//! Ruling edges are snapped onto shared coordinates, collinear pieces are
//! joined, crossings become intersection points, and every grid rectangle
//! whose four corners exist becomes a cell. Cells that share a border are
//! grouped into one table. Text is assigned afterwards by glyph center.
//!
//! Every stage polls the document [`Deadline`], so a dense page fails with
//! `DeadlineExceeded` instead of running unbounded.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::edges::Edge;
use crate::error::{Deadline, TranscriptError};
use crate::geometry::{BBox, Orientation};
use crate::text::{Glyph, LineOptions, text_within};

/// Tolerances for lattice detection. Defaults to 3.0 points throughout.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSettings {
    /// Parallel edges closer than this are snapped onto their mean position.
    pub snap_tolerance: f64,
    /// Collinear segments with a gap up to this are joined.
    pub join_tolerance: f64,
    /// Edges shorter than this are ignored.
    pub edge_min_length: f64,
    /// Slack when testing whether a horizontal and a vertical edge cross.
    pub intersection_tolerance: f64,
    /// Line assembly tolerances for cell text.
    pub text: LineOptions,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            edge_min_length: 3.0,
            intersection_tolerance: 3.0,
            text: LineOptions::default(),
        }
    }
}

/// A detected table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub bbox: BBox,
    /// Text inside the cell; `None` until text has been assigned or when empty.
    pub text: Option<String>,
}

/// A detected table: cells organized into rows, top-to-bottom, left-to-right.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub bbox: BBox,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Cell texts as a string grid (missing text becomes `""`).
    ///
    /// Rows can differ in length where cells are merged; callers reconcile.
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| c.text.clone().unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// Fill in each cell's text from the page glyphs.
    pub fn assign_text(
        &mut self,
        glyphs: &[Glyph],
        options: &LineOptions,
        deadline: Deadline,
    ) -> Result<(), TranscriptError> {
        for row in &mut self.rows {
            deadline.check()?;
            for cell in row {
                let text = text_within(glyphs, &cell.bbox, options);
                cell.text = if text.is_empty() { None } else { Some(text) };
            }
        }
        Ok(())
    }
}

/// Snap parallel edges whose perpendicular coordinate lies within `tolerance`
/// onto the cluster mean.
pub fn snap_edges(edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    let (mut horizontals, mut verticals): (Vec<Edge>, Vec<Edge>) = edges
        .into_iter()
        .partition(|e| e.orientation == Orientation::Horizontal);

    snap_cluster(&mut horizontals, tolerance, |e| e.top, |e, v| {
        e.top = v;
        e.bottom = v;
    });
    snap_cluster(&mut verticals, tolerance, |e| e.x0, |e, v| {
        e.x0 = v;
        e.x1 = v;
    });

    horizontals.extend(verticals);
    horizontals
}

fn snap_cluster<K, S>(edges: &mut [Edge], tolerance: f64, key: K, mut set: S)
where
    K: Fn(&Edge) -> f64,
    S: FnMut(&mut Edge, f64),
{
    edges.sort_by(|a, b| key(a).total_cmp(&key(b)));
    let mut start = 0;
    for i in 1..=edges.len() {
        // Chain to the previous member so evenly spaced rules stay apart.
        if i == edges.len() || key(&edges[i]) - key(&edges[i - 1]) > tolerance {
            let mean = edges[start..i].iter().map(&key).sum::<f64>() / (i - start) as f64;
            for edge in &mut edges[start..i] {
                set(edge, mean);
            }
            start = i;
        }
    }
}

/// Merge overlapping or nearly-touching collinear segments.
pub fn join_edges(edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    let mut groups: BTreeMap<(u8, i64), Vec<Edge>> = BTreeMap::new();
    for edge in edges {
        let key = match edge.orientation {
            Orientation::Horizontal => (0, coord_key(edge.top)),
            Orientation::Vertical => (1, coord_key(edge.x0)),
        };
        groups.entry(key).or_default().push(edge);
    }

    let mut joined = Vec::new();
    for (_, mut group) in groups {
        let span = |e: &Edge| match e.orientation {
            Orientation::Horizontal => (e.x0, e.x1),
            Orientation::Vertical => (e.top, e.bottom),
        };
        group.sort_by(|a, b| span(a).0.total_cmp(&span(b).0));

        let mut iter = group.into_iter();
        let Some(mut current) = iter.next() else {
            continue;
        };
        for next in iter {
            let (start, end) = span(&next);
            let (_, cur_end) = span(&current);
            if start <= cur_end + tolerance {
                match current.orientation {
                    Orientation::Horizontal => current.x1 = cur_end.max(end),
                    Orientation::Vertical => current.bottom = cur_end.max(end),
                }
            } else {
                joined.push(std::mem::replace(&mut current, next));
            }
        }
        joined.push(current);
    }
    joined
}

/// Points where a horizontal and a vertical edge cross, within `tolerance`.
pub fn edges_to_intersections(
    edges: &[Edge],
    tolerance: f64,
    deadline: Deadline,
) -> Result<BTreeSet<(i64, i64)>, TranscriptError> {
    let (horizontals, verticals): (Vec<&Edge>, Vec<&Edge>) = edges
        .iter()
        .partition(|e| e.orientation == Orientation::Horizontal);

    let mut points = BTreeSet::new();
    for h in &horizontals {
        deadline.check()?;
        for v in &verticals {
            if v.x0 >= h.x0 - tolerance
                && v.x0 <= h.x1 + tolerance
                && h.top >= v.top - tolerance
                && h.top <= v.bottom + tolerance
            {
                points.insert((coord_key(v.x0), coord_key(h.top)));
            }
        }
    }
    Ok(points)
}

/// Build cells from every grid rectangle whose four corners are intersections.
///
/// Each cell spans to the nearest corner-complete neighbour, so a missing
/// interior rule (a merged cell) yields one wide cell rather than none.
pub fn intersections_to_cells(
    points: &BTreeSet<(i64, i64)>,
    deadline: Deadline,
) -> Result<Vec<Cell>, TranscriptError> {
    let xs: BTreeSet<i64> = points.iter().map(|&(x, _)| x).collect();
    let ys: BTreeSet<i64> = points.iter().map(|&(_, y)| y).collect();
    let xs: Vec<i64> = xs.into_iter().collect();
    let ys: Vec<i64> = ys.into_iter().collect();

    let mut cells = Vec::new();
    for (yi, &top) in ys.iter().enumerate() {
        deadline.check()?;
        for (xi, &x0) in xs.iter().enumerate() {
            if !points.contains(&(x0, top)) {
                continue;
            }
            deadline.check()?;
            let corner = ys[yi + 1..]
                .iter()
                .filter(|&&y| points.contains(&(x0, y)))
                .find_map(|&bottom| {
                    xs[xi + 1..]
                        .iter()
                        .find(|&&x| points.contains(&(x, top)) && points.contains(&(x, bottom)))
                        .map(|&x1| (x1, bottom))
                });
            if let Some((x1, bottom)) = corner {
                cells.push(Cell {
                    bbox: BBox::new(
                        key_coord(x0),
                        key_coord(top),
                        key_coord(x1),
                        key_coord(bottom),
                    ),
                    text: None,
                });
            }
        }
    }
    Ok(cells)
}

/// Group cells that share a border into tables, ordered top-to-bottom.
///
/// Cell sides are bucketed by border coordinate and each bucket is swept
/// once along the border, so grouping is `O(n log n)` in the cell count.
pub fn cells_to_tables(cells: Vec<Cell>, deadline: Deadline) -> Result<Vec<Table>, TranscriptError> {
    let mut sets = DisjointSet::new(cells.len());
    link_shared_borders(&cells, &mut sets, deadline)?;

    let mut groups: HashMap<usize, Vec<Cell>> = HashMap::new();
    for (i, cell) in cells.into_iter().enumerate() {
        groups.entry(sets.find(i)).or_default().push(cell);
    }

    let mut tables: Vec<Table> = groups
        .into_values()
        .map(|group| {
            let bbox = group
                .iter()
                .skip(1)
                .fold(group[0].bbox, |acc, c| acc.union(&c.bbox));
            let mut rows: BTreeMap<i64, Vec<Cell>> = BTreeMap::new();
            for cell in group {
                rows.entry(coord_key(cell.bbox.top)).or_default().push(cell);
            }
            let rows = rows
                .into_values()
                .map(|mut row| {
                    row.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
                    row
                })
                .collect();
            Table { bbox, rows }
        })
        .collect();

    tables.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    Ok(tables)
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// The extent of one cell side along a border line.
#[derive(Debug, Clone, Copy)]
struct BorderSpan {
    start: i64,
    end: i64,
    /// The cell lies before the border (left of it, or above it).
    before: bool,
    cell: usize,
}

fn link_shared_borders(
    cells: &[Cell],
    sets: &mut DisjointSet,
    deadline: Deadline,
) -> Result<(), TranscriptError> {
    let mut vertical: HashMap<i64, Vec<BorderSpan>> = HashMap::new();
    let mut horizontal: HashMap<i64, Vec<BorderSpan>> = HashMap::new();
    for (cell, Cell { bbox, .. }) in cells.iter().enumerate() {
        let (top, bottom) = (coord_key(bbox.top), coord_key(bbox.bottom));
        let (x0, x1) = (coord_key(bbox.x0), coord_key(bbox.x1));
        let side = |start, end, before| BorderSpan {
            start,
            end,
            before,
            cell,
        };
        vertical.entry(x1).or_default().push(side(top, bottom, true));
        vertical.entry(x0).or_default().push(side(top, bottom, false));
        horizontal.entry(bottom).or_default().push(side(x0, x1, true));
        horizontal.entry(top).or_default().push(side(x0, x1, false));
    }

    for spans in vertical.into_values().chain(horizontal.into_values()) {
        deadline.check()?;
        sweep_border(spans, sets);
    }
    Ok(())
}

/// Union every pair of spans on one border line whose extents overlap.
///
/// Per side, the open span reaching furthest is kept. Every span still open
/// when a new one starts has already been joined to that one, so linking to
/// it is enough.
fn sweep_border(mut spans: Vec<BorderSpan>, sets: &mut DisjointSet) {
    spans.sort_by_key(|s| s.start);
    let mut open: [Option<(i64, usize)>; 2] = [None, None];
    for span in spans {
        for &(end, cell) in open.iter().flatten() {
            if end > span.start {
                sets.union(cell, span.cell);
            }
        }
        let side = usize::from(span.before);
        if open[side].is_none_or(|(end, _)| span.end > end) {
            open[side] = Some((span.end, span.cell));
        }
    }
}

/// Quantize a coordinate to thousandths for exact set membership.
fn coord_key(v: f64) -> i64 {
    (v * 1000.0).round() as i64
}

fn key_coord(k: i64) -> f64 {
    k as f64 / 1000.0
}

/// Runs the lattice pipeline over one page's edges.
#[derive(Debug, Clone)]
pub struct TableFinder {
    edges: Vec<Edge>,
    settings: TableSettings,
    deadline: Deadline,
}

impl TableFinder {
    pub fn new(edges: Vec<Edge>, settings: TableSettings) -> Self {
        Self {
            edges,
            settings,
            deadline: Deadline::unbounded(),
        }
    }

    /// Fail with `DeadlineExceeded` once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Pipeline: filter by length → snap → join → intersections → cells → tables.
    pub fn find_tables(&self) -> Result<Vec<Table>, TranscriptError> {
        let edges: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| e.length() >= self.settings.edge_min_length)
            .cloned()
            .collect();
        if edges.is_empty() {
            return Ok(Vec::new());
        }

        let deadline = self.deadline;
        let edges = snap_edges(edges, self.settings.snap_tolerance);
        deadline.check()?;
        let edges = join_edges(edges, self.settings.join_tolerance);
        deadline.check()?;
        let points =
            edges_to_intersections(&edges, self.settings.intersection_tolerance, deadline)?;
        let cells = intersections_to_cells(&points, deadline)?;
        tracing::trace!(
            edges = edges.len(),
            points = points.len(),
            cells = cells.len(),
            "lattice stages"
        );
        cells_to_tables(cells, deadline)
    }

    /// Detect tables and fill their cell text from `glyphs`.
    pub fn extract(&self, glyphs: &[Glyph]) -> Result<Vec<Table>, TranscriptError> {
        let mut tables = self.find_tables()?;
        for table in &mut tables {
            table.assign_text(glyphs, &self.settings.text, self.deadline)?;
        }
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::EdgeSource;

    /// Ruled grid with the given column x positions and row y positions.
    fn grid_edges(xs: &[f64], ys: &[f64]) -> Vec<Edge> {
        let (left, right) = (xs[0], xs[xs.len() - 1]);
        let (top, bottom) = (ys[0], ys[ys.len() - 1]);
        let mut edges: Vec<Edge> = ys
            .iter()
            .map(|&y| Edge::horizontal(left, right, y, EdgeSource::Line))
            .collect();
        edges.extend(
            xs.iter()
                .map(|&x| Edge::vertical(x, top, bottom, EdgeSource::Line)),
        );
        edges
    }

    #[test]
    fn snap_merges_close_parallels_only() {
        let edges = vec![
            Edge::horizontal(0.0, 10.0, 100.0, EdgeSource::Line),
            Edge::horizontal(0.0, 10.0, 101.0, EdgeSource::Line),
            Edge::horizontal(0.0, 10.0, 120.0, EdgeSource::Line),
        ];
        let snapped = snap_edges(edges, 3.0);
        let mut ys: Vec<f64> = snapped.iter().map(|e| e.top).collect();
        ys.sort_by(f64::total_cmp);
        assert_eq!(ys, vec![100.5, 100.5, 120.0]);
    }

    #[test]
    fn join_merges_touching_segments() {
        let edges = vec![
            Edge::horizontal(0.0, 50.0, 10.0, EdgeSource::Line),
            Edge::horizontal(51.0, 100.0, 10.0, EdgeSource::Line),
            Edge::horizontal(150.0, 200.0, 10.0, EdgeSource::Line),
        ];
        let joined = join_edges(edges, 3.0);
        assert_eq!(joined.len(), 2);
        assert_eq!((joined[0].x0, joined[0].x1), (0.0, 100.0));
    }

    #[test]
    fn two_by_two_grid_yields_one_table() {
        let finder = TableFinder::new(
            grid_edges(&[100.0, 200.0, 300.0], &[92.0, 112.0, 132.0]),
            TableSettings::default(),
        );
        let tables = finder.find_tables().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 2);
        assert!(tables[0].rows.iter().all(|r| r.len() == 2));
        assert_eq!(tables[0].bbox, BBox::new(100.0, 92.0, 300.0, 132.0));
    }

    #[test]
    fn merged_cell_spans_missing_rule() {
        // Second row lacks the middle vertical rule.
        let mut edges = grid_edges(&[0.0, 100.0], &[0.0, 20.0, 40.0]);
        edges.push(Edge::vertical(50.0, 0.0, 20.0, EdgeSource::Line));
        let tables = TableFinder::new(edges, TableSettings::default()).find_tables().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0].len(), 2);
        assert_eq!(tables[0].rows[1].len(), 1);
        assert_eq!(tables[0].rows[1][0].bbox.width(), 100.0);
    }

    #[test]
    fn separate_grids_become_separate_tables() {
        let mut edges = grid_edges(&[0.0, 50.0, 100.0], &[0.0, 20.0]);
        edges.extend(grid_edges(&[0.0, 50.0, 100.0], &[300.0, 320.0]));
        let tables = TableFinder::new(edges, TableSettings::default()).find_tables().unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables[0].bbox.top < tables[1].bbox.top);
    }

    #[test]
    fn no_edges_no_tables() {
        assert!(
            TableFinder::new(Vec::new(), TableSettings::default())
                .find_tables()
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn extract_assigns_text_by_center() {
        let finder = TableFinder::new(
            grid_edges(&[0.0, 100.0, 200.0], &[0.0, 20.0]),
            TableSettings::default(),
        );
        let glyphs = vec![
            Glyph::new("A", BBox::new(10.0, 5.0, 16.0, 15.0)),
            Glyph::new("B", BBox::new(110.0, 5.0, 116.0, 15.0)),
        ];
        let tables = finder.extract(&glyphs).unwrap();
        assert_eq!(tables[0].to_grid(), vec![vec!["A".to_string(), "B".to_string()]]);
    }

    fn cell(x0: f64, top: f64, x1: f64, bottom: f64) -> Cell {
        Cell {
            bbox: BBox::new(x0, top, x1, bottom),
            text: None,
        }
    }

    #[test]
    fn cells_meeting_at_a_corner_stay_apart() {
        let cells = vec![cell(0.0, 0.0, 10.0, 10.0), cell(10.0, 10.0, 20.0, 20.0)];
        let tables = cells_to_tables(cells, Deadline::unbounded()).unwrap();
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn tall_cell_links_every_neighbour_along_its_border() {
        // One merged cell on the left, three rows on the right, plus a
        // separate cell further down the same border line.
        let cells = vec![
            cell(0.0, 0.0, 10.0, 30.0),
            cell(10.0, 0.0, 20.0, 10.0),
            cell(10.0, 10.0, 20.0, 20.0),
            cell(10.0, 20.0, 20.0, 30.0),
            cell(10.0, 100.0, 20.0, 110.0),
        ];
        let tables = cells_to_tables(cells, Deadline::unbounded()).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.iter().map(Vec::len).sum::<usize>(), 4);
        assert_eq!(tables[1].rows.len(), 1);
    }

    #[test]
    fn dense_grid_groups_into_one_table() {
        let steps: Vec<f64> = (0..=120).map(|i| f64::from(i) * 5.0).collect();
        let tables = TableFinder::new(grid_edges(&steps, &steps), TableSettings::default())
            .find_tables()
            .unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 120);
        assert!(tables[0].rows.iter().all(|r| r.len() == 120));
    }

    #[test]
    fn expired_deadline_stops_detection() {
        let deadline = crate::ExtractOptions {
            deadline: std::time::Duration::ZERO,
            ..crate::ExtractOptions::default()
        }
        .start_clock();
        std::thread::sleep(std::time::Duration::from_millis(2));

        let finder = TableFinder::new(
            grid_edges(&[0.0, 100.0, 200.0], &[0.0, 20.0, 40.0]),
            TableSettings::default(),
        )
        .with_deadline(deadline);
        assert!(matches!(
            finder.find_tables(),
            Err(TranscriptError::DeadlineExceeded { limit_ms: 0, .. })
        ));
        assert!(matches!(
            finder.extract(&[]),
            Err(TranscriptError::DeadlineExceeded { .. })
        ));
    }
}

//! Text normalization and glyph-to-line assembly.
//!
//! [`normalize_text`] is applied to every cell, header, and line that leaves a
//! document backend. [`Glyph`]s are the positioned characters emitted by the
//! PDF interpreter; they are grouped into lines either for a whole page (text
//! fallback) or within a table cell.

use crate::geometry::BBox;

/// Collapse every whitespace run to a single ASCII space and trim both ends.
///
/// Covers Unicode whitespace, so the ideographic space (U+3000) and NBSP
/// produced by CJK transcript generators collapse the same way as ASCII.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// [`normalize_text`] for a possibly-absent value; `None` yields `""`.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize_text).unwrap_or_default()
}

/// A positioned, decoded character (or short ligature string).
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub bbox: BBox,
}

impl Glyph {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Tolerances for assembling glyphs into lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOptions {
    /// Horizontal gap above which a space is inserted between glyphs.
    pub x_tolerance: f64,
    /// Maximum difference in vertical center for glyphs on the same line.
    pub y_tolerance: f64,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            x_tolerance: 3.0,
            y_tolerance: 3.0,
        }
    }
}

/// Group glyphs into text lines, top-to-bottom, each read left-to-right.
///
/// Returned lines are whitespace-normalized; blank lines are dropped.
pub fn assemble_lines(glyphs: &[&Glyph], options: &LineOptions) -> Vec<String> {
    let mut sorted: Vec<&Glyph> = glyphs.to_vec();
    sorted.sort_by(|a, b| {
        a.bbox
            .center()
            .1
            .total_cmp(&b.bbox.center().1)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines: Vec<(f64, Vec<&Glyph>)> = Vec::new();
    for glyph in sorted {
        let cy = glyph.bbox.center().1;
        match lines.last_mut() {
            Some((anchor, members)) if (cy - *anchor).abs() <= options.y_tolerance => {
                members.push(glyph);
            }
            _ => lines.push((cy, vec![glyph])),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            let mut text = String::new();
            let mut prev_x1: Option<f64> = None;
            for g in members {
                if let Some(x1) = prev_x1 {
                    if g.bbox.x0 - x1 > options.x_tolerance {
                        text.push(' ');
                    }
                }
                text.push_str(&g.text);
                prev_x1 = Some(prev_x1.map_or(g.bbox.x1, |x| x.max(g.bbox.x1)));
            }
            normalize_text(&text)
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Text of the glyphs whose center falls inside `bbox`, lines joined by `\n`.
pub fn text_within(glyphs: &[Glyph], bbox: &BBox, options: &LineOptions) -> String {
    let inside: Vec<&Glyph> = glyphs
        .iter()
        .filter(|g| {
            let (cx, cy) = g.bbox.center();
            bbox.contains_point(cx, cy)
        })
        .collect();
    assemble_lines(&inside, options).join("\n")
}

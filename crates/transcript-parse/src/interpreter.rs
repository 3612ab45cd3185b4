//! Content stream interpreter.
//!
//! Walks a page's operators and collects what table extraction needs:
//! positioned [`Glyph`]s from text-showing operators and ruling [`Edge`]s
//! from stroked lines and rectangles. Colors, images, clipping, and curves
//! are ignored. Form XObjects are interpreted recursively up to
//! [`ExtractOptions::max_recursion_depth`].

use std::collections::HashMap;
use std::rc::Rc;

use transcript_core::edges::edges_from_rect;
use transcript_core::{BBox, Ctm, Deadline, Edge, EdgeSource, ExtractOptions, Glyph, TranscriptError};

use crate::error::BackendError;
use crate::font::Font;
use crate::lopdf_backend::{decode_stream, object_to_f64, resolve_ref};
use crate::tokenizer::{Operand, Operator, tokenize};

/// Segments this far off axis still count as horizontal/vertical rules.
const AXIS_SLOP: f64 = 0.5;
/// Deadline is polled every this many operators.
const DEADLINE_POLL: usize = 1024;

/// Everything extracted from one page, in top-left page coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub glyphs: Vec<Glyph>,
    pub edges: Vec<Edge>,
}

/// Graphics state saved by `q` and restored by `Q`, text parameters included.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Ctm,
    font: Option<Rc<Font>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    h_scaling: f64,
    leading: f64,
    rise: f64,
}

impl GraphicsState {
    fn new(ctm: Ctm) -> Self {
        Self {
            ctm,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Path under construction, in device space (y up).
#[derive(Debug, Default)]
struct PathBuilder {
    segments: Vec<((f64, f64), (f64, f64))>,
    rects: Vec<BBox>,
    current: Option<(f64, f64)>,
    start: Option<(f64, f64)>,
}

impl PathBuilder {
    fn move_to(&mut self, p: (f64, f64)) {
        self.current = Some(p);
        self.start = Some(p);
    }

    fn line_to(&mut self, p: (f64, f64)) {
        if let Some(from) = self.current {
            self.segments.push((from, p));
        }
        self.current = Some(p);
        self.start.get_or_insert(p);
    }

    fn close(&mut self) {
        if let (Some(from), Some(to)) = (self.current, self.start) {
            if from != to {
                self.segments.push((from, to));
            }
            self.current = Some(to);
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Interprets the content of one page.
pub struct PageInterpreter<'a> {
    doc: &'a lopdf::Document,
    options: &'a ExtractOptions,
    deadline: Deadline,
    page_height: f64,
    operators: usize,
    out: PageContent,
}

impl<'a> PageInterpreter<'a> {
    pub fn new(
        doc: &'a lopdf::Document,
        options: &'a ExtractOptions,
        deadline: Deadline,
        page_height: f64,
    ) -> Self {
        Self {
            doc,
            options,
            deadline,
            page_height,
            operators: 0,
            out: PageContent::default(),
        }
    }

    /// Interpret page-level content under the base matrix `ctm`.
    pub fn run(
        mut self,
        content: &[u8],
        resources: &'a lopdf::Dictionary,
        ctm: Ctm,
    ) -> Result<PageContent, BackendError> {
        self.interpret(content, resources, ctm, 0)?;
        Ok(self.out)
    }

    fn interpret(
        &mut self,
        content: &[u8],
        resources: &'a lopdf::Dictionary,
        ctm: Ctm,
        depth: usize,
    ) -> Result<(), BackendError> {
        let ops = tokenize(content)?;
        let mut fonts: HashMap<String, Rc<Font>> = HashMap::new();
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut gs = GraphicsState::new(ctm);
        let mut tm = Ctm::identity();
        let mut tlm = Ctm::identity();
        let mut path = PathBuilder::default();

        for op in &ops {
            self.count_operator()?;
            let num = |i: usize| op.operands.get(i).and_then(Operand::as_f64);
            match op.name.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operands(op) {
                        gs.ctm = m.concat(&gs.ctm);
                    }
                }

                // Path construction
                "m" => {
                    if let (Some(x), Some(y)) = (num(0), num(1)) {
                        path.move_to(gs.ctm.transform_point(x, y));
                    }
                }
                "l" => {
                    if let (Some(x), Some(y)) = (num(0), num(1)) {
                        path.line_to(gs.ctm.transform_point(x, y));
                    }
                }
                "c" | "v" | "y" => {
                    let n = op.operands.len();
                    if let (Some(x), Some(y)) = (
                        n.checked_sub(2).and_then(num),
                        n.checked_sub(1).and_then(num),
                    ) {
                        let end = gs.ctm.transform_point(x, y);
                        path.current = Some(end);
                    }
                }
                "h" => path.close(),
                "re" => {
                    if let (Some(x), Some(y), Some(w), Some(h)) = (num(0), num(1), num(2), num(3)) {
                        let corners = [
                            gs.ctm.transform_point(x, y),
                            gs.ctm.transform_point(x + w, y),
                            gs.ctm.transform_point(x + w, y + h),
                            gs.ctm.transform_point(x, y + h),
                        ];
                        if is_axis_aligned(&gs.ctm) {
                            path.rects.push(self.device_rect(&corners));
                        } else {
                            path.move_to(corners[0]);
                            for corner in &corners[1..] {
                                path.line_to(*corner);
                            }
                            path.close();
                        }
                        path.current = Some(corners[0]);
                        path.start = Some(corners[0]);
                    }
                }

                // Path painting
                "S" | "s" | "B" | "B*" | "b" | "b*" => {
                    if matches!(op.name.as_str(), "s" | "b" | "b*") {
                        path.close();
                    }
                    self.stroke(&path);
                    path.clear();
                }
                "f" | "F" | "f*" => {
                    self.fill(&path);
                    path.clear();
                }
                "n" => path.clear(),

                // Text objects and state
                "BT" => {
                    tm = Ctm::identity();
                    tlm = Ctm::identity();
                }
                "ET" => {}
                "Tf" => {
                    if let (Some(name), Some(size)) =
                        (op.operands.first().and_then(Operand::as_name), num(1))
                    {
                        gs.font = Some(self.font(&mut fonts, resources, name));
                        gs.font_size = size;
                    }
                }
                "Tc" => gs.char_spacing = num(0).unwrap_or(0.0),
                "Tw" => gs.word_spacing = num(0).unwrap_or(0.0),
                "Tz" => gs.h_scaling = num(0).unwrap_or(100.0) / 100.0,
                "TL" => gs.leading = num(0).unwrap_or(0.0),
                "Ts" => gs.rise = num(0).unwrap_or(0.0),
                "Td" | "TD" => {
                    if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                        if op.name == "TD" {
                            gs.leading = -ty;
                        }
                        tlm = Ctm::translation(tx, ty).concat(&tlm);
                        tm = tlm;
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operands(op) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = Ctm::translation(0.0, -gs.leading).concat(&tlm);
                    tm = tlm;
                }

                // Text showing
                "Tj" => {
                    if let Some(bytes) = op.operands.first().and_then(Operand::as_bytes) {
                        self.show(&gs, &mut tm, bytes);
                    }
                }
                "'" | "\"" => {
                    if op.name == "\"" {
                        gs.word_spacing = num(0).unwrap_or(gs.word_spacing);
                        gs.char_spacing = num(1).unwrap_or(gs.char_spacing);
                    }
                    tlm = Ctm::translation(0.0, -gs.leading).concat(&tlm);
                    tm = tlm;
                    if let Some(bytes) = op.operands.last().and_then(Operand::as_bytes) {
                        self.show(&gs, &mut tm, bytes);
                    }
                }
                "TJ" => {
                    if let Some(Operand::Array(items)) = op.operands.first() {
                        for item in items {
                            match item {
                                Operand::Str(bytes) => self.show(&gs, &mut tm, bytes),
                                Operand::Number(adjust) => {
                                    let tx = -adjust / 1000.0 * gs.font_size * gs.h_scaling;
                                    tm = Ctm::translation(tx, 0.0).concat(&tm);
                                }
                                _ => {}
                            }
                        }
                    }
                }

                "Do" => {
                    if let Some(name) = op.operands.first().and_then(Operand::as_name) {
                        self.paint_xobject(name, resources, gs.ctm, depth)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn count_operator(&mut self) -> Result<(), BackendError> {
        self.operators += 1;
        if self.operators > self.options.max_operators_per_page {
            return Err(TranscriptError::limit(
                "max_operators_per_page",
                self.options.max_operators_per_page,
                self.operators,
            )
            .into());
        }
        if self.operators % DEADLINE_POLL == 0 {
            self.deadline.check()?;
        }
        Ok(())
    }

    fn font(
        &self,
        cache: &mut HashMap<String, Rc<Font>>,
        resources: &lopdf::Dictionary,
        name: &str,
    ) -> Rc<Font> {
        if let Some(font) = cache.get(name) {
            return Rc::clone(font);
        }
        let dict = resources
            .get(b"Font")
            .ok()
            .and_then(|o| resolve_ref(self.doc, o).as_dict().ok())
            .and_then(|fonts| fonts.get(name.as_bytes()).ok())
            .and_then(|o| resolve_ref(self.doc, o).as_dict().ok());
        let font = match dict {
            Some(dict) => Font::load(self.doc, dict, name, self.options.max_input_bytes),
            None => {
                tracing::warn!(font = name, "font not found in resources, using defaults");
                Font::fallback(name)
            }
        };
        let font = Rc::new(font);
        cache.insert(name.to_string(), Rc::clone(&font));
        font
    }

    fn show(&mut self, gs: &GraphicsState, tm: &mut Ctm, bytes: &[u8]) {
        let Some(font) = gs.font.as_ref() else {
            tracing::trace!("text shown before any font was selected");
            return;
        };
        for code in font.decode(bytes) {
            let params = Ctm::new(
                gs.font_size * gs.h_scaling,
                0.0,
                0.0,
                gs.font_size,
                0.0,
                gs.rise,
            );
            let trm = params.concat(tm).concat(&gs.ctm);
            if !code.text.is_empty() {
                let (x0, baseline) = trm.transform_point(0.0, 0.0);
                let (x1, _) = trm.transform_point(code.width, 0.0);
                let size = trm.vertical_scale();
                let bbox = BBox::new(
                    x0.min(x1),
                    self.page_height - (baseline + size),
                    x0.max(x1),
                    self.page_height - baseline,
                );
                self.out.glyphs.push(Glyph::new(code.text, bbox));
            }

            let spacing = gs.char_spacing + if code.is_word_space { gs.word_spacing } else { 0.0 };
            let tx = (code.width * gs.font_size + spacing) * gs.h_scaling;
            *tm = Ctm::translation(tx, 0.0).concat(tm);
        }
    }

    fn stroke(&mut self, path: &PathBuilder) {
        for (a, b) in &path.segments {
            let (a, b) = (self.flip(*a), self.flip(*b));
            if let Some(edge) = Edge::from_segment(a, b, AXIS_SLOP, EdgeSource::Line) {
                self.out.edges.push(edge);
            }
        }
        for rect in &path.rects {
            self.out.edges.extend(edges_from_rect(rect));
        }
    }

    /// Filled rectangles are treated as rules: thin bars and cell borders
    /// drawn as filled boxes both end up as edges.
    fn fill(&mut self, path: &PathBuilder) {
        for rect in &path.rects {
            self.out.edges.extend(edges_from_rect(rect));
        }
    }

    fn flip(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (x, self.page_height - y)
    }

    fn device_rect(&self, corners: &[(f64, f64); 4]) -> BBox {
        let xs = corners.iter().map(|c| c.0);
        let ys = corners.iter().map(|c| c.1);
        let x0 = xs.clone().fold(f64::INFINITY, f64::min);
        let x1 = xs.fold(f64::NEG_INFINITY, f64::max);
        let y0 = ys.clone().fold(f64::INFINITY, f64::min);
        let y1 = ys.fold(f64::NEG_INFINITY, f64::max);
        BBox::new(x0, self.page_height - y1, x1, self.page_height - y0)
    }

    fn paint_xobject(
        &mut self,
        name: &str,
        resources: &'a lopdf::Dictionary,
        ctm: Ctm,
        depth: usize,
    ) -> Result<(), BackendError> {
        let doc = self.doc;
        let Some(stream) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| resolve_ref(doc, o).as_dict().ok())
            .and_then(|xobjects| xobjects.get(name.as_bytes()).ok())
            .and_then(|o| resolve_ref(doc, o).as_stream().ok())
        else {
            tracing::debug!(xobject = name, "XObject not found");
            return Ok(());
        };

        let is_form = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|n| n == b"Form");
        if !is_form {
            return Ok(());
        }

        let next_depth = depth + 1;
        if next_depth > self.options.max_recursion_depth {
            return Err(TranscriptError::limit(
                "max_recursion_depth",
                self.options.max_recursion_depth,
                next_depth,
            )
            .into());
        }

        let matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| resolve_ref(doc, o).as_array().ok())
            .and_then(|arr| array_matrix(doc, arr))
            .unwrap_or_default();
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve_ref(doc, o).as_dict().ok())
            .unwrap_or(resources);
        let content = decode_stream(stream, self.options.max_input_bytes)?;
        self.interpret(&content, form_resources, matrix.concat(&ctm), next_depth)
    }
}

fn matrix_operands(op: &Operator) -> Option<Ctm> {
    let v: Vec<f64> = op.operands.iter().filter_map(Operand::as_f64).collect();
    match v.as_slice() {
        [a, b, c, d, e, f] => Some(Ctm::new(*a, *b, *c, *d, *e, *f)),
        _ => None,
    }
}

fn array_matrix(doc: &lopdf::Document, arr: &[lopdf::Object]) -> Option<Ctm> {
    let v: Vec<f64> = arr
        .iter()
        .filter_map(|o| object_to_f64(resolve_ref(doc, o)).ok())
        .collect();
    match v.as_slice() {
        [a, b, c, d, e, f] => Some(Ctm::new(*a, *b, *c, *d, *e, *f)),
        _ => None,
    }
}

/// Whether the matrix maps axis-aligned rectangles to axis-aligned rectangles.
fn is_axis_aligned(m: &Ctm) -> bool {
    (m.b.abs() < 1e-9 && m.c.abs() < 1e-9) || (m.a.abs() < 1e-9 && m.d.abs() < 1e-9)
}

//! lopdf-based PDF document access.
//!
//! Opens a document with [`lopdf`], enforces input limits, and runs the
//! [`PageInterpreter`] over each page's content with inherited resources and
//! media box resolved.

use std::io::Read;
use std::sync::LazyLock;

use flate2::read::ZlibDecoder;
use transcript_core::{BBox, Ctm, Deadline, ExtractOptions, TranscriptError};

use crate::error::BackendError;
use crate::interpreter::{PageContent, PageInterpreter};

/// A parsed PDF document.
pub struct PdfDocument {
    inner: lopdf::Document,
    /// Page object ids in page order.
    page_ids: Vec<lopdf::ObjectId>,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl PdfDocument {
    /// Parse `bytes`, rejecting encrypted documents and documents over the
    /// size or page limits.
    pub fn open(bytes: &[u8], options: &ExtractOptions) -> Result<Self, BackendError> {
        options.check_input_len(bytes.len())?;
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;
        if inner.is_encrypted() {
            return Err(BackendError::Parse(
                "encrypted PDFs are not supported".to_string(),
            ));
        }

        // get_pages is keyed by 1-based page number, so values are in page order.
        let page_ids: Vec<lopdf::ObjectId> = inner.get_pages().values().copied().collect();
        if page_ids.len() > options.max_pages {
            return Err(TranscriptError::limit("max_pages", options.max_pages, page_ids.len()).into());
        }
        tracing::debug!(pages = page_ids.len(), "opened PDF");
        Ok(Self { inner, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Media box of page `index` in PDF user space (y up).
    pub fn media_box(&self, index: usize) -> Result<BBox, BackendError> {
        let page_id = self.page_id(index)?;
        let obj = resolve_inherited(&self.inner, page_id, b"MediaBox")?
            .ok_or_else(|| BackendError::Parse("MediaBox not found on page or ancestors".into()))?;
        let array = resolve_ref(&self.inner, obj)
            .as_array()
            .map_err(|e| BackendError::Parse(format!("MediaBox is not an array: {e}")))?;
        extract_bbox_from_array(&self.inner, array)
    }

    /// Interpret page `index` into glyphs and edges in top-left coordinates.
    pub fn page_content(
        &self,
        index: usize,
        options: &ExtractOptions,
        deadline: Deadline,
    ) -> Result<PageContent, BackendError> {
        deadline.check()?;
        let page_id = self.page_id(index)?;
        let page_dict = self
            .inner
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        // MediaBox is stored as [llx lly urx ury]; normalize so the origin is
        // the lower-left corner and the height is positive.
        let media = self.media_box(index)?;
        let (llx, lly) = (media.x0.min(media.x1), media.top.min(media.bottom));
        let height = (media.bottom - media.top).abs();

        let content = page_content_bytes(&self.inner, page_dict, options.max_input_bytes)?;
        let resources = page_resources(&self.inner, page_id)?;
        let page = PageInterpreter::new(&self.inner, options, deadline, height).run(
            &content,
            resources,
            Ctm::translation(-llx, -lly),
        )?;
        tracing::debug!(
            page = index + 1,
            glyphs = page.glyphs.len(),
            edges = page.edges.len(),
            "interpreted page"
        );
        Ok(page)
    }

    fn page_id(&self, index: usize) -> Result<lopdf::ObjectId, BackendError> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            BackendError::Parse(format!(
                "page index {index} out of range (0..{})",
                self.page_ids.len()
            ))
        })
    }
}

/// Build a [`BBox`] from `[x0 y0 x1 y1]`, keeping PDF's bottom-up values.
fn extract_bbox_from_array(
    doc: &lopdf::Document,
    array: &[lopdf::Object],
) -> Result<BBox, BackendError> {
    if array.len() != 4 {
        return Err(BackendError::Parse(format!(
            "expected 4-element array for box, got {}",
            array.len()
        )));
    }
    let n = |i: usize| object_to_f64(resolve_ref(doc, &array[i]));
    Ok(BBox::new(n(0)?, n(1)?, n(2)?, n(3)?))
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &lopdf::Object) -> Result<f64, BackendError> {
    match obj {
        lopdf::Object::Integer(i) => Ok(*i as f64),
        lopdf::Object::Real(f) => Ok(*f as f64),
        _ => Err(BackendError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// Follow an indirect reference; non-references and dangling references
/// are returned as-is.
pub(crate) fn resolve_ref<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Stream bytes, decompressed when a `/Filter` is present.
///
/// The decoded length may not exceed `limit` bytes. A lone `FlateDecode`
/// filter without parameters is inflated incrementally, so the cap holds
/// while inflating; other filter chains are checked once decoded.
pub(crate) fn decode_stream(stream: &lopdf::Stream, limit: usize) -> Result<Vec<u8>, BackendError> {
    let data = match stream.dict.get(b"Filter").ok() {
        None => stream.content.clone(),
        Some(filter) if is_plain_flate(stream, filter) => {
            let mut data = Vec::new();
            ZlibDecoder::new(stream.content.as_slice())
                .take((limit as u64).saturating_add(1))
                .read_to_end(&mut data)
                .map_err(|e| BackendError::Parse(format!("failed to inflate stream: {e}")))?;
            data
        }
        Some(_) => stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress stream: {e}")))?,
    };
    if data.len() > limit {
        return Err(TranscriptError::limit("max_input_bytes", limit, data.len()).into());
    }
    Ok(data)
}

fn is_plain_flate(stream: &lopdf::Stream, filter: &lopdf::Object) -> bool {
    let flate = |o: &lopdf::Object| o.as_name().is_ok_and(|n| n == b"FlateDecode");
    let single = match filter {
        lopdf::Object::Array(filters) => filters.len() == 1 && flate(&filters[0]),
        other => flate(other),
    };
    single && stream.dict.get(b"DecodeParms").is_err()
}

/// Look up `key` on the page, walking `/Parent` links up the page tree.
fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: lopdf::ObjectId,
    key: &[u8],
) -> Result<Option<&'a lopdf::Object>, BackendError> {
    let mut current_id = page_id;
    // Bounded walk: a malformed tree may contain a Parent cycle.
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page tree node: {e}")))?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }
        match dict.get(b"Parent") {
            Ok(parent) => {
                current_id = parent
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Ok(None)
}

/// Concatenated content of a page's `/Contents` (single stream or array).
fn page_content_bytes(
    doc: &lopdf::Document,
    page_dict: &lopdf::Dictionary,
    limit: usize,
) -> Result<Vec<u8>, BackendError> {
    let Ok(contents) = page_dict.get(b"Contents") else {
        return Ok(Vec::new());
    };
    match resolve_ref(doc, contents) {
        lopdf::Object::Stream(stream) => decode_stream(stream, limit),
        lopdf::Object::Array(parts) => {
            let mut content = Vec::new();
            for part in parts {
                let stream = resolve_ref(doc, part).as_stream().map_err(|e| {
                    BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                if !content.is_empty() {
                    content.push(b'\n');
                }
                content.extend_from_slice(&decode_stream(stream, limit)?);
                if content.len() > limit {
                    return Err(TranscriptError::limit("max_input_bytes", limit, content.len()).into());
                }
            }
            Ok(content)
        }
        _ => Err(BackendError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}

static EMPTY_RESOURCES: LazyLock<lopdf::Dictionary> = LazyLock::new(lopdf::Dictionary::new);

fn page_resources(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<&lopdf::Dictionary, BackendError> {
    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => resolve_ref(doc, obj)
            .as_dict()
            .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => Ok(&EMPTY_RESOURCES),
    }
}

//! Font loading: code splitting, Unicode decoding, and glyph widths.
//!
//! Simple fonts use one byte per code and `/Widths` from `/FirstChar`.
//! Type0 fonts use two bytes per code (Identity or UCS-2 CMaps) or a legacy
//! CJK multi-byte encoding such as Big5 (`ETen-B5-H`), with widths from the
//! descendant's `/W` and `/DW`.

use std::collections::HashMap;

use encoding_rs::Encoding;

use crate::cmap::ToUnicode;
use crate::lopdf_backend::{decode_stream, object_to_f64, resolve_ref};

/// Width of a simple-font glyph missing from `/Widths` (glyph units).
const SIMPLE_DEFAULT_WIDTH: f64 = 500.0;
/// Default `/DW` of a CID font (glyph units).
const CID_DEFAULT_WIDTH: f64 = 1000.0;

/// How a shown string is split into character codes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CodeScheme {
    /// One byte per code.
    Single,
    /// Two bytes per code, no intrinsic Unicode meaning (`Identity-H`).
    Identity,
    /// Two bytes per code holding UCS-2 (`UniCNS-UCS2-H` and friends).
    Ucs2,
    /// Legacy multi-byte encoding from a predefined CJK CMap.
    Legacy(&'static Encoding),
}

#[derive(Debug, Clone)]
enum Widths {
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        missing: f64,
    },
    Cid {
        widths: HashMap<u32, f64>,
        default: f64,
    },
}

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCode {
    pub code: u32,
    pub text: String,
    /// Advance in text space units per unit of font size (glyph width / 1000).
    pub width: f64,
    /// Single-byte code 32, which also receives word spacing.
    pub is_word_space: bool,
}

/// A loaded font, ready to decode shown strings.
#[derive(Debug, Clone)]
pub struct Font {
    pub base_name: String,
    scheme: CodeScheme,
    to_unicode: Option<ToUnicode>,
    widths: Widths,
}

impl Font {
    /// Fallback for a font missing from the resources: WinAnsi, 500-unit widths.
    pub fn fallback(name: &str) -> Self {
        Self {
            base_name: name.to_string(),
            scheme: CodeScheme::Single,
            to_unicode: None,
            widths: Widths::Simple {
                first_char: 0,
                widths: Vec::new(),
                missing: SIMPLE_DEFAULT_WIDTH,
            },
        }
    }

    /// Load from a font dictionary. Embedded CMap streams larger than
    /// `max_stream_bytes` once decoded are ignored.
    pub fn load(
        doc: &lopdf::Document,
        dict: &lopdf::Dictionary,
        resource_name: &str,
        max_stream_bytes: usize,
    ) -> Self {
        let base_name = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| strip_subset_prefix(&String::from_utf8_lossy(n)).to_string())
            .unwrap_or_else(|| resource_name.to_string());

        let to_unicode = load_to_unicode(doc, dict, max_stream_bytes);
        let is_type0 = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|n| n == b"Type0");

        let (scheme, widths) = if is_type0 {
            (type0_scheme(doc, dict), cid_widths(doc, dict))
        } else {
            (CodeScheme::Single, simple_widths(doc, dict))
        };

        if to_unicode.is_none() && scheme == CodeScheme::Identity {
            tracing::warn!(font = %base_name, "Identity-encoded font without ToUnicode; its text is dropped");
        }
        tracing::debug!(font = %base_name, ?scheme, "loaded font");

        Self {
            base_name,
            scheme,
            to_unicode,
            widths,
        }
    }

    pub fn scheme(&self) -> CodeScheme {
        self.scheme
    }

    /// Split `bytes` into codes and decode each.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedCode> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let len = self.code_len(bytes, i);
            let Some(chunk) = bytes.get(i..i + len) else {
                break;
            };
            let code = chunk.iter().fold(0u32, |acc, b| acc << 8 | u32::from(*b));
            out.push(DecodedCode {
                code,
                text: self.text_for(code, chunk),
                width: self.width_for(code) / 1000.0,
                is_word_space: len == 1 && code == 32,
            });
            i += len;
        }
        out
    }

    fn code_len(&self, bytes: &[u8], at: usize) -> usize {
        match self.scheme {
            CodeScheme::Single => 1,
            CodeScheme::Identity | CodeScheme::Ucs2 => 2,
            CodeScheme::Legacy(_) => {
                if (0x81..=0xFE).contains(&bytes[at]) {
                    2
                } else {
                    1
                }
            }
        }
    }

    fn text_for(&self, code: u32, chunk: &[u8]) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.lookup(code)) {
            return text.to_string();
        }
        match self.scheme {
            CodeScheme::Single => {
                let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(chunk);
                text.into_owned()
            }
            CodeScheme::Identity => String::new(),
            CodeScheme::Ucs2 => char::from_u32(code).map(String::from).unwrap_or_default(),
            CodeScheme::Legacy(encoding) => {
                let (text, _, had_errors) = encoding.decode(chunk);
                if had_errors {
                    String::new()
                } else {
                    text.into_owned()
                }
            }
        }
    }

    fn width_for(&self, code: u32) -> f64 {
        match &self.widths {
            Widths::Simple {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing),
            Widths::Cid { widths, default } => {
                if matches!(self.scheme, CodeScheme::Legacy(_)) {
                    return *default;
                }
                widths.get(&code).copied().unwrap_or(*default)
            }
        }
    }
}

/// Strip a subset tag such as `ABCDEF+` from a base font name.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

fn load_to_unicode(
    doc: &lopdf::Document,
    dict: &lopdf::Dictionary,
    max_bytes: usize,
) -> Option<ToUnicode> {
    let stream = resolve_ref(doc, dict.get(b"ToUnicode").ok()?).as_stream().ok()?;
    let data = decode_stream(stream, max_bytes)
        .map_err(|e| tracing::warn!(error = %e, "unreadable ToUnicode stream"))
        .ok()?;
    match ToUnicode::parse(&data) {
        Ok(cmap) => Some(cmap),
        Err(e) => {
            tracing::warn!(error = %e, "malformed ToUnicode CMap");
            None
        }
    }
}

/// Map a Type0 `/Encoding` onto a code scheme.
pub fn scheme_for_cmap_name(name: &str) -> CodeScheme {
    let base = name
        .strip_suffix("-H")
        .or_else(|| name.strip_suffix("-V"))
        .unwrap_or(name);
    match base {
        "B5pc" | "ETen-B5" | "ETenms-B5" | "HKscs-B5" => CodeScheme::Legacy(encoding_rs::BIG5),
        "GBK-EUC" | "GB-EUC" | "GBpc-EUC" | "GBK2K" => CodeScheme::Legacy(encoding_rs::GBK),
        "UniCNS-UCS2" | "UniGB-UCS2" | "UniJIS-UCS2" | "UniKS-UCS2" | "UniCNS-UTF16"
        | "UniGB-UTF16" => CodeScheme::Ucs2,
        _ => CodeScheme::Identity,
    }
}

fn type0_scheme(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> CodeScheme {
    match dict.get(b"Encoding").map(|o| resolve_ref(doc, o)) {
        Ok(lopdf::Object::Name(name)) => scheme_for_cmap_name(&String::from_utf8_lossy(name)),
        // Embedded CMap streams are treated as two-byte codes.
        _ => CodeScheme::Identity,
    }
}

fn simple_widths(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Widths {
    let first_char = dict
        .get(b"FirstChar")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);
    let widths = dict
        .get(b"Widths")
        .ok()
        .map(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_array().ok())
        .map(|arr| {
            arr.iter()
                .map(|w| object_to_f64(resolve_ref(doc, w)).unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default();
    let missing = dict
        .get(b"FontDescriptor")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_dict().ok())
        .and_then(|fd| fd.get(b"MissingWidth").ok())
        .and_then(|w| object_to_f64(w).ok())
        .unwrap_or(SIMPLE_DEFAULT_WIDTH);
    Widths::Simple {
        first_char,
        widths,
        missing,
    }
}

fn cid_widths(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Widths {
    let descendant = dict
        .get(b"DescendantFonts")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_array().ok())
        .and_then(|arr| arr.first())
        .and_then(|o| resolve_ref(doc, o).as_dict().ok());
    let Some(descendant) = descendant else {
        return Widths::Cid {
            widths: HashMap::new(),
            default: CID_DEFAULT_WIDTH,
        };
    };

    let default = descendant
        .get(b"DW")
        .ok()
        .and_then(|o| object_to_f64(resolve_ref(doc, o)).ok())
        .unwrap_or(CID_DEFAULT_WIDTH);
    let widths = descendant
        .get(b"W")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_array().ok())
        .map(|w| parse_w_array(doc, w))
        .unwrap_or_default();
    Widths::Cid { widths, default }
}

/// Parse a CID `/W` array: `c [w1 w2 ...]` and `c_first c_last w` entries.
fn parse_w_array(doc: &lopdf::Document, items: &[lopdf::Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let number = |o: &lopdf::Object| object_to_f64(resolve_ref(doc, o)).ok();
    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(&items[i]) else { break };
        let first = first as u32;
        match items.get(i + 1).map(|o| resolve_ref(doc, o)) {
            Some(lopdf::Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let Some(code) = u32::try_from(offset)
                        .ok()
                        .and_then(|offset| first.checked_add(offset))
                    else {
                        break;
                    };
                    if let Some(w) = number(w) {
                        widths.insert(code, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (number(last), items.get(i + 2).and_then(number))
                else {
                    break;
                };
                let last = (last as u32).min(first.saturating_add(0xFFFF));
                for code in first..=last {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, Stream, dictionary};

    #[test]
    fn simple_font_widths_and_winansi() {
        let doc = lopdf::Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "ABCDEF+Arial",
            "FirstChar" => 65i64,
            "Widths" => vec![Object::Integer(600), Object::Integer(700)],
        };
        let font = Font::load(&doc, &dict, "F1", 1 << 20);
        assert_eq!(font.base_name, "Arial");
        let codes = font.decode(b"AB \xe9");
        assert_eq!(codes.len(), 4);
        assert_eq!(codes[0].text, "A");
        assert_eq!(codes[0].width, 0.6);
        assert_eq!(codes[1].width, 0.7);
        assert!(codes[2].is_word_space);
        assert_eq!(codes[2].width, 0.5);
        assert_eq!(codes[3].text, "é");
    }

    #[test]
    fn type0_identity_uses_to_unicode_and_w() {
        let mut doc = lopdf::Document::with_version("1.5");
        let cmap = doc.add_object(Stream::new(
            dictionary! {},
            b"1 begincodespacerange <0000> <FFFF> endcodespacerange \
              2 beginbfchar <0001> <5B78> <0002> <5206> endbfchar"
                .to_vec(),
        ));
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "DW" => 900i64,
            "W" => vec![Object::Integer(1), Object::Array(vec![Object::Integer(800)])],
        });
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "MingLiU",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant)],
            "ToUnicode" => cmap,
        };
        let font = Font::load(&doc, &dict, "F2", 1 << 20);
        assert_eq!(font.scheme(), CodeScheme::Identity);
        let codes = font.decode(&[0x00, 0x01, 0x00, 0x02]);
        let text: String = codes.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(text, "學分");
        assert_eq!(codes[0].width, 0.8);
        assert_eq!(codes[1].width, 0.9);
        assert!(!codes[0].is_word_space);
    }

    #[test]
    fn big5_predefined_cmap_decodes_without_to_unicode() {
        let doc = lopdf::Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "MingLiU",
            "Encoding" => "ETen-B5-H",
        };
        let font = Font::load(&doc, &dict, "F3", 1 << 20);
        // "成績" in Big5, followed by an ASCII digit.
        let codes = font.decode(&[0xA6, 0xA8, 0xC1, 0x5A, b'3']);
        let text: Vec<&str> = codes.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(text, ["成", "績", "3"]);
        assert_eq!(codes[0].width, 1.0);
    }

    #[test]
    fn w_array_ranges() {
        let doc = lopdf::Document::with_version("1.5");
        let w = vec![
            Object::Integer(10),
            Object::Integer(12),
            Object::Integer(250),
            Object::Integer(20),
            Object::Array(vec![Object::Integer(300), Object::Integer(400)]),
        ];
        let widths = parse_w_array(&doc, &w);
        assert_eq!(widths.get(&11), Some(&250.0));
        assert_eq!(widths.get(&21), Some(&400.0));
        assert_eq!(widths.get(&13), None);
    }

    #[test]
    fn w_array_near_code_space_end() {
        let doc = lopdf::Document::with_version("1.5");
        let max = i64::from(u32::MAX);
        let w = vec![
            Object::Integer(max),
            Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
            Object::Integer(max - 1),
            Object::Integer(max),
            Object::Integer(700),
        ];
        let widths = parse_w_array(&doc, &w);
        assert_eq!(widths.len(), 2);
        assert_eq!(widths.get(&(u32::MAX - 1)), Some(&700.0));
        assert_eq!(widths.get(&u32::MAX), Some(&700.0));
    }

    #[test]
    fn subset_prefix() {
        assert_eq!(strip_subset_prefix("ABCDEF+Helvetica"), "Helvetica");
        assert_eq!(strip_subset_prefix("Helvetica"), "Helvetica");
        assert_eq!(strip_subset_prefix("abc+X"), "abc+X");
    }

    #[test]
    fn cmap_names() {
        assert_eq!(scheme_for_cmap_name("Identity-H"), CodeScheme::Identity);
        assert_eq!(scheme_for_cmap_name("UniCNS-UCS2-H"), CodeScheme::Ucs2);
        assert_eq!(
            scheme_for_cmap_name("ETen-B5-V"),
            CodeScheme::Legacy(encoding_rs::BIG5)
        );
    }
}

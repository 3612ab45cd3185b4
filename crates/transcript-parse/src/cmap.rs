//! ToUnicode CMap parsing.
//!
//! A ToUnicode stream is PostScript-like, so it is run through the content
//! [`tokenize`](crate::tokenizer::tokenize)r: every `endbfchar` operator then
//! carries `<src> <dst>` pairs and every `endbfrange` carries
//! `<lo> <hi> <dst>` or `<lo> <hi> [<dst>...]` triples. Destination strings
//! are UTF-16BE.

use std::collections::HashMap;

use crate::error::BackendError;
use crate::tokenizer::{Operand, tokenize};

/// Ranges wider than this are clamped; real CMaps never come close.
const MAX_RANGE: u32 = 0xFFFF;

/// Character code to Unicode mapping from a `/ToUnicode` stream.
#[derive(Debug, Clone, Default)]
pub struct ToUnicode {
    mappings: HashMap<u32, String>,
    /// Byte length of codes, from the first `codespacerange` entry.
    code_len: Option<usize>,
}

impl ToUnicode {
    pub fn parse(data: &[u8]) -> Result<Self, BackendError> {
        let mut cmap = ToUnicode::default();
        for op in tokenize(data)? {
            match op.name.as_str() {
                "endcodespacerange" => {
                    if let Some(lo) = op.operands.first().and_then(Operand::as_bytes) {
                        cmap.code_len.get_or_insert(lo.len().max(1));
                    }
                }
                "endbfchar" => {
                    for pair in op.operands.chunks_exact(2) {
                        if let (Some(src), Some(dst)) = (pair[0].as_bytes(), pair[1].as_bytes()) {
                            cmap.mappings.insert(code_of(src), decode_utf16be(dst));
                        }
                    }
                }
                "endbfrange" => {
                    for triple in op.operands.chunks_exact(3) {
                        cmap.insert_range(&triple[0], &triple[1], &triple[2]);
                    }
                }
                _ => {}
            }
        }
        Ok(cmap)
    }

    fn insert_range(&mut self, lo: &Operand, hi: &Operand, dst: &Operand) {
        let (Some(lo), Some(hi)) = (lo.as_bytes(), hi.as_bytes()) else {
            return;
        };
        let (lo, hi) = (code_of(lo), code_of(hi));
        if hi < lo {
            return;
        }
        let span = (hi - lo).min(MAX_RANGE);
        match dst {
            Operand::Str(start) => {
                let mut units = utf16_units(start);
                let Some(last) = units.pop() else { return };
                for offset in 0..=span {
                    let mut mapped = units.clone();
                    mapped.push(last.wrapping_add(offset as u16));
                    self.mappings
                        .insert(lo + offset, String::from_utf16_lossy(&mapped));
                }
            }
            Operand::Array(items) => {
                for (offset, item) in items.iter().enumerate().take(span as usize + 1) {
                    if let Some(bytes) = item.as_bytes() {
                        self.mappings
                            .insert(lo + offset as u32, decode_utf16be(bytes));
                    }
                }
            }
            _ => {}
        }
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    pub fn code_len(&self) -> Option<usize> {
        self.code_len
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, b| acc << 8 | u32::from(*b))
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    if bytes.len() == 1 {
        return vec![u16::from(bytes[0])];
    }
    bytes
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect()
}

fn decode_utf16be(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

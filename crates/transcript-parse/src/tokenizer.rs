//! Content stream tokenizer.
//!
//! Splits raw content stream bytes into [`Operator`]s, each carrying the
//! operands that preceded it. Only what text and ruling-line extraction needs
//! is kept: numbers, names, strings, and arrays. Dictionaries (marked-content
//! properties) are parsed and discarded, and inline image data is skipped.

use crate::error::BackendError;

/// A content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    /// Name without the leading `/`.
    Name(String),
    /// Literal or hex string, as raw bytes.
    Str(Vec<u8>),
    Array(Vec<Operand>),
    /// Booleans, null, and dictionaries.
    Other,
}

impl Operand {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Operand::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// An operator with its operands, e.g. `Tf` with `[/F1, 10]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub operands: Vec<Operand>,
}

/// Parse content stream bytes into operators.
///
/// # Errors
///
/// Returns [`BackendError::Interpreter`] for unterminated strings, arrays,
/// or dictionaries.
pub fn tokenize(input: &[u8]) -> Result<Vec<Operator>, BackendError> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut ops = Vec::new();
    let mut stack: Vec<Operand> = Vec::new();

    loop {
        lexer.skip_whitespace_and_comments();
        let Some(b) = lexer.peek() else { break };
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'*' | b'\'' | b'"' => {
                let keyword = lexer.keyword();
                match keyword.as_str() {
                    "true" | "false" | "null" => stack.push(Operand::Other),
                    "BI" => {
                        lexer.skip_inline_image();
                        stack.clear();
                    }
                    _ => ops.push(Operator {
                        name: keyword,
                        operands: std::mem::take(&mut stack),
                    }),
                }
            }
            b']' | b'>' | b')' | b'{' | b'}' => lexer.pos += 1,
            _ => stack.push(lexer.operand()?),
        }
    }

    Ok(ops)
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Lexer<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while self.peek().is_some_and(|c| c != b'\n' && c != b'\r') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn operand(&mut self) -> Result<Operand, BackendError> {
        match self.peek() {
            Some(b'(') => self.literal_string().map(Operand::Str),
            Some(b'<') if self.input.get(self.pos + 1) == Some(&b'<') => {
                self.dictionary()?;
                Ok(Operand::Other)
            }
            Some(b'<') => self.hex_string().map(Operand::Str),
            Some(b'[') => {
                self.pos += 1;
                self.array().map(Operand::Array)
            }
            Some(b'/') => Ok(Operand::Name(self.name())),
            Some(b'0'..=b'9' | b'+' | b'-' | b'.') => Ok(self.number()),
            Some(b'a'..=b'z' | b'A'..=b'Z') => {
                let keyword = self.keyword();
                Ok(match keyword.as_str() {
                    "true" | "false" | "null" => Operand::Other,
                    _ => Operand::Name(keyword),
                })
            }
            Some(other) => {
                self.pos += 1;
                tracing::trace!(byte = other, "skipping stray content byte");
                Ok(Operand::Other)
            }
            None => Err(BackendError::Interpreter(
                "unexpected end of content stream".to_string(),
            )),
        }
    }

    fn keyword(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !is_whitespace(b) && !is_delimiter(b))
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn name(&mut self) -> String {
        self.pos += 1;
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !is_whitespace(b) && !is_delimiter(b))
        {
            self.pos += 1;
        }
        let raw = &self.input[start..self.pos];
        let mut decoded = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'#' && i + 2 < raw.len() {
                if let (Some(hi), Some(lo)) = (hex_value(raw[i + 1]), hex_value(raw[i + 2])) {
                    decoded.push(hi << 4 | lo);
                    i += 3;
                    continue;
                }
            }
            decoded.push(raw[i]);
            i += 1;
        }
        String::from_utf8_lossy(&decoded).into_owned()
    }

    fn number(&mut self) -> Operand {
        let start = self.pos;
        self.pos += 1;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_digit() || b == b'.')
        {
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.input[start..self.pos]);
        match text.parse::<f64>() {
            Ok(n) => Operand::Number(n),
            // A lone sign or dot reads as zero, as most viewers do.
            Err(_) => Operand::Number(0.0),
        }
    }

    fn literal_string(&mut self) -> Result<Vec<u8>, BackendError> {
        self.pos += 1;
        let mut out = Vec::new();
        let mut depth = 1u32;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(b);
                }
                b'\\' => {
                    let Some(escaped) = self.peek() else { break };
                    self.pos += 1;
                    match escaped {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'\r' => {
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut value = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(d - b'0');
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((value & 0xFF) as u8);
                        }
                        other => out.push(other),
                    }
                }
                _ => out.push(b),
            }
        }
        Err(BackendError::Interpreter(
            "unterminated literal string".to_string(),
        ))
    }

    fn hex_string(&mut self) -> Result<Vec<u8>, BackendError> {
        self.pos += 1;
        let mut digits = Vec::new();
        loop {
            match self.peek() {
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b) => {
                    self.pos += 1;
                    if let Some(v) = hex_value(b) {
                        digits.push(v);
                    }
                }
                None => {
                    return Err(BackendError::Interpreter(
                        "unterminated hex string".to_string(),
                    ));
                }
            }
        }
        if digits.len() % 2 != 0 {
            digits.push(0);
        }
        Ok(digits.chunks(2).map(|p| p[0] << 4 | p[1]).collect())
    }

    fn array(&mut self) -> Result<Vec<Operand>, BackendError> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => items.push(self.operand()?),
                None => return Err(BackendError::Interpreter("unterminated array".to_string())),
            }
        }
    }

    fn dictionary(&mut self) -> Result<(), BackendError> {
        self.pos += 2;
        loop {
            self.skip_whitespace_and_comments();
            match self.peek() {
                Some(b'>') if self.input.get(self.pos + 1) == Some(&b'>') => {
                    self.pos += 2;
                    return Ok(());
                }
                Some(_) => {
                    self.operand()?;
                }
                None => {
                    return Err(BackendError::Interpreter(
                        "unterminated dictionary".to_string(),
                    ));
                }
            }
        }
    }

    /// Skip `BI <dict> ID <data> EI`, leaving the position after `EI`.
    fn skip_inline_image(&mut self) {
        while self.pos + 1 < self.input.len() {
            let at_id = &self.input[self.pos..self.pos + 2] == b"ID"
                && self.input.get(self.pos + 2).is_none_or(|b| is_whitespace(*b));
            self.pos += 1;
            if at_id {
                self.pos += 2;
                break;
            }
        }
        while self.pos + 1 < self.input.len() {
            let preceded = self.pos == 0 || is_whitespace(self.input[self.pos - 1]);
            let at_ei = &self.input[self.pos..self.pos + 2] == b"EI"
                && self.input.get(self.pos + 2).is_none_or(|b| is_whitespace(*b));
            if preceded && at_ei {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
        self.pos = self.input.len();
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ops: &[Operator]) -> Vec<&str> {
        ops.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn text_object() {
        let ops = tokenize(b"BT /F1 12 Tf 72 700 Td (Hello) Tj ET").unwrap();
        assert_eq!(names(&ops), ["BT", "Tf", "Td", "Tj", "ET"]);
        assert_eq!(
            ops[1].operands,
            vec![Operand::Name("F1".into()), Operand::Number(12.0)]
        );
        assert_eq!(ops[3].operands, vec![Operand::Str(b"Hello".to_vec())]);
    }

    #[test]
    fn path_operators_and_reals() {
        let ops = tokenize(b"0.5 w 10 20 m 30.25 -4 l S 1 2 3 4 re f*").unwrap();
        assert_eq!(names(&ops), ["w", "m", "l", "S", "re", "f*"]);
        assert_eq!(
            ops[2].operands,
            vec![Operand::Number(30.25), Operand::Number(-4.0)]
        );
    }

    #[test]
    fn tj_array_with_hex_and_kerning() {
        let ops = tokenize(b"[(A) -120 <0042> .5] TJ").unwrap();
        assert_eq!(
            ops[0].operands,
            vec![Operand::Array(vec![
                Operand::Str(b"A".to_vec()),
                Operand::Number(-120.0),
                Operand::Str(vec![0x00, 0x42]),
                Operand::Number(0.5),
            ])]
        );
    }

    #[test]
    fn literal_string_escapes_and_nesting() {
        let ops = tokenize(br"(a\(b\) (c) \101\n) Tj").unwrap();
        assert_eq!(ops[0].operands, vec![Operand::Str(b"a(b) (c) A\n".to_vec())]);
    }

    #[test]
    fn comments_and_dictionaries_are_skipped() {
        let ops = tokenize(b"% header\n/P << /MCID 0 /Alt (x) >> BDC EMC").unwrap();
        assert_eq!(names(&ops), ["BDC", "EMC"]);
        assert_eq!(
            ops[0].operands,
            vec![Operand::Name("P".into()), Operand::Other]
        );
    }

    #[test]
    fn inline_image_is_skipped() {
        let ops = tokenize(b"q BI /W 1 /H 1 /BPC 8 ID \x00\xffEI\x01 EI Q").unwrap();
        assert_eq!(names(&ops), ["q", "Q"]);
    }

    #[test]
    fn name_hex_escapes() {
        let ops = tokenize(b"/A#20B Do").unwrap();
        assert_eq!(ops[0].operands, vec![Operand::Name("A B".into())]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(matches!(
            tokenize(b"(abc Tj"),
            Err(BackendError::Interpreter(_))
        ));
    }
}

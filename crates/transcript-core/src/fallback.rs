//! Line-oriented record recovery for PDFs without ruled tables.
//!
//! Each text line is matched against one positional pattern:
//! `<year> <term> <course name> <credit> <grade>`, e.g. `112 上 微積分 3 A-`.
//! Non-matching lines are skipped; they are headings, totals, or notes.

use std::sync::LazyLock;

use regex::Regex;

use crate::grid::RawTable;

/// Header of the table built from fallback matches. The name, credit, and
/// grade labels are the canonical ones, so standardization keeps them.
pub const FALLBACK_HEADER: [&str; 5] = ["學年", "學期", "科目名稱", "學分", "成績"];

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<year>\d{3,4})\s*(?P<term>[上下])\s*(?P<name>\S.*\S|\S)\s+(?P<credit>\d+(?:\.\d+)?)\s+(?P<grade>[A-FX][+\-]?|抵免|通過)$",
    )
    .expect("fallback line pattern is valid")
});

/// One transcript line recovered by the fallback pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackRow {
    pub year: String,
    pub term: String,
    pub name: String,
    pub credit: String,
    pub grade: String,
}

impl FallbackRow {
    fn into_cells(self) -> Vec<String> {
        vec![self.year, self.term, self.name, self.credit, self.grade]
    }
}

/// Match a single (already whitespace-normalized) line.
pub fn parse_line(line: &str) -> Option<FallbackRow> {
    let caps = LINE_PATTERN.captures(line.trim())?;
    Some(FallbackRow {
        year: caps["year"].to_string(),
        term: caps["term"].to_string(),
        name: caps["name"].to_string(),
        credit: caps["credit"].to_string(),
        grade: caps["grade"].to_string(),
    })
}

/// Collect every matching line into one table, or `None` if nothing matched.
pub fn fallback_table<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<RawTable> {
    let rows: Vec<Vec<String>> = lines
        .into_iter()
        .filter_map(parse_line)
        .map(FallbackRow::into_cells)
        .collect();
    tracing::debug!(matched = rows.len(), "fallback line matching finished");
    if rows.is_empty() {
        return None;
    }
    Some(RawTable {
        header: FALLBACK_HEADER.iter().map(|h| h.to_string()).collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_line() {
        let row = parse_line("112 上 CourseName 3 A-").unwrap();
        assert_eq!(row.year, "112");
        assert_eq!(row.term, "上");
        assert_eq!(row.name, "CourseName");
        assert_eq!(row.credit, "3");
        assert_eq!(row.grade, "A-");
    }

    #[test]
    fn name_may_contain_spaces_and_digits() {
        let row = parse_line("1101 下 程式設計 (二) 2 3.0 B+").unwrap();
        assert_eq!(row.name, "程式設計 (二) 2");
        assert_eq!(row.credit, "3.0");
    }

    #[test]
    fn pass_equivalents_are_grades() {
        assert_eq!(parse_line("111 下 服務學習 0 通過").unwrap().grade, "通過");
        assert_eq!(parse_line("110 上 英文 2 抵免").unwrap().grade, "抵免");
    }

    #[test]
    fn term_may_touch_year() {
        assert_eq!(parse_line("112上 微積分 3 C-").unwrap().name, "微積分");
    }

    #[test]
    fn non_conforming_lines_are_skipped() {
        assert!(parse_line("學年 學期 科目 學分 成績").is_none());
        assert!(parse_line("112 秋 微積分 3 A").is_none());
        assert!(parse_line("12 上 微積分 3 A").is_none());
        assert!(parse_line("112 上 微積分 3").is_none());
        assert!(parse_line("112 上 3 A").is_none());
        assert!(parse_line("總學分 128").is_none());
    }

    #[test]
    fn table_accumulates_matches_in_order() {
        let table = fallback_table([
            "國立某大學 成績單",
            "112 上 微積分 3 A-",
            "備註",
            "112 下 普通物理 3 D",
        ])
        .unwrap();
        assert_eq!(table.header.len(), 5);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][2], "普通物理");
        assert!(table.rows.iter().all(|r| r.len() == table.width()));
    }

    #[test]
    fn no_matches_no_table() {
        assert!(fallback_table(["nothing here"]).is_none());
    }
}

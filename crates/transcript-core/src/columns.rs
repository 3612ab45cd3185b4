//! Column standardization.
//!
//! Header cells are mapped onto the canonical `{name, credit, grade}` schema
//! through an ordered alias table. The column positions of each canonical
//! field are resolved once per table, so later stages never re-inspect
//! header strings row by row.

use crate::grid::RawTable;

/// A canonical transcript field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Field {
    Name,
    Credit,
    Grade,
}

impl Field {
    /// Canonical header label written back into standardized tables.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "科目名稱",
            Field::Credit => "學分",
            Field::Grade => "成績",
        }
    }
}

/// Keyword aliases per field, in priority order: name > credit > grade.
///
/// Matching is case-insensitive substring search against the header with
/// all whitespace removed.
pub const FIELD_ALIASES: [(Field, &[&str]); 3] = [
    (
        Field::Name,
        &["科目", "課程", "名稱", "subject", "course", "name"],
    ),
    (Field::Credit, &["學分", "credit"]),
    (Field::Grade, &["成績", "gpa", "grade", "score"]),
];

/// Markers of a course-code header such as `科目代碼`. Such a header still
/// maps to [`Field::Name`], but a name column without a marker is preferred
/// when reading rows.
const IDENTIFIER_MARKERS: &[&str] = &["代碼", "代號", "編號", "序號", "code"];

/// Lowercased header with all whitespace removed.
fn header_key(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A standardized header cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Column {
    /// Mapped onto a canonical field.
    Field(Field),
    /// Kept as its normalized original text.
    Other(String),
}

impl Column {
    pub fn label(&self) -> &str {
        match self {
            Column::Field(field) => field.label(),
            Column::Other(raw) => raw,
        }
    }
}

/// Map one normalized header cell onto the canonical schema.
pub fn standardize_header(header: &str) -> Column {
    let key = header_key(header);
    for (field, aliases) in FIELD_ALIASES {
        if aliases.iter().any(|alias| key.contains(alias)) {
            return Column::Field(field);
        }
    }
    Column::Other(header.to_string())
}

/// Column index of each canonical field, first matching column wins.
///
/// For the name, a column whose original header is not a course code wins
/// over an earlier code column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldIndex {
    pub name: Option<usize>,
    pub credit: Option<usize>,
    pub grade: Option<usize>,
}

impl FieldIndex {
    fn resolve(header: &[String], columns: &[Column]) -> Self {
        let position = |wanted: Field| {
            columns
                .iter()
                .position(|c| matches!(c, Column::Field(f) if *f == wanted))
        };
        let descriptive_name = columns.iter().zip(header).position(|(c, h)| {
            *c == Column::Field(Field::Name) && {
                let key = header_key(h);
                !IDENTIFIER_MARKERS.iter().any(|m| key.contains(m))
            }
        });
        Self {
            name: descriptive_name.or_else(|| position(Field::Name)),
            credit: position(Field::Credit),
            grade: position(Field::Grade),
        }
    }

    /// Whether no canonical column was found at all.
    pub fn is_unmapped(&self) -> bool {
        self.name.is_none() && self.credit.is_none() && self.grade.is_none()
    }
}

/// A table whose header has been mapped onto the canonical schema.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StandardTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    fields: FieldIndex,
}

impl StandardTable {
    pub fn fields(&self) -> FieldIndex {
        self.fields
    }

    /// Header labels after standardization.
    pub fn header_labels(&self) -> Vec<&str> {
        self.columns.iter().map(Column::label).collect()
    }

    /// Cell of `field` in `row`, or `""` when the table has no such column.
    pub fn cell<'a>(&self, row: &'a [String], field: Field) -> &'a str {
        let index = match field {
            Field::Name => self.fields.name,
            Field::Credit => self.fields.credit,
            Field::Grade => self.fields.grade,
        };
        index
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Standardize a raw table's header and resolve the canonical field columns.
pub fn standardize(table: RawTable) -> StandardTable {
    let columns: Vec<Column> = table
        .header
        .iter()
        .map(|h| standardize_header(h))
        .collect();
    let fields = FieldIndex::resolve(&table.header, &columns);
    if fields.is_unmapped() {
        tracing::debug!(header = ?table.header, "no canonical columns in table header");
    }
    StandardTable {
        columns,
        rows: table.rows,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_headers_map_to_fields() {
        assert_eq!(standardize_header("Course"), Column::Field(Field::Name));
        assert_eq!(standardize_header("Credits"), Column::Field(Field::Credit));
        assert_eq!(standardize_header("Grade"), Column::Field(Field::Grade));
        assert_eq!(standardize_header("GPA"), Column::Field(Field::Grade));
    }

    #[test]
    fn chinese_headers_map_to_fields() {
        assert_eq!(standardize_header("科目名稱"), Column::Field(Field::Name));
        assert_eq!(standardize_header("課程"), Column::Field(Field::Name));
        assert_eq!(standardize_header("學 分"), Column::Field(Field::Credit));
        assert_eq!(standardize_header("學期成績"), Column::Field(Field::Grade));
    }

    #[test]
    fn name_wins_over_grade_for_ambiguous_header() {
        assert_eq!(standardize_header("Course Score"), Column::Field(Field::Name));
        assert_eq!(standardize_header("Course Credit"), Column::Field(Field::Name));
        assert_eq!(standardize_header("Credit Score"), Column::Field(Field::Credit));
    }

    #[test]
    fn unknown_headers_pass_through() {
        assert_eq!(standardize_header("學年"), Column::Other("學年".to_string()));
        assert_eq!(standardize_header("備註"), Column::Other("備註".to_string()));
    }

    #[test]
    fn code_headers_are_name_columns() {
        assert_eq!(standardize_header("科目代碼"), Column::Field(Field::Name));
        assert_eq!(standardize_header("Course Code"), Column::Field(Field::Name));
    }

    #[test]
    fn descriptive_name_column_wins_over_code_column() {
        let table = standardize(RawTable {
            header: vec!["科目代碼".into(), "科目名稱".into(), "學分".into()],
            rows: vec![vec!["CS101".into(), "微積分".into(), "3".into()]],
        });
        assert_eq!(table.header_labels(), vec!["科目名稱", "科目名稱", "學分"]);
        assert_eq!(table.fields().name, Some(1));
        assert_eq!(table.cell(&table.rows[0], Field::Name), "微積分");
    }

    #[test]
    fn lone_code_column_still_names_the_course() {
        let table = standardize(RawTable {
            header: vec!["Course Code".into(), "Credits".into()],
            rows: vec![vec!["CS101".into(), "3".into()]],
        });
        assert_eq!(table.fields().name, Some(0));
    }

    #[test]
    fn standardize_resolves_first_matching_column() {
        let raw = RawTable {
            header: vec![
                "學期".into(),
                "科目名稱".into(),
                "學分".into(),
                "成績".into(),
                "備註成績".into(),
            ],
            rows: vec![vec![
                "上".into(),
                "微積分".into(),
                "3".into(),
                "A".into(),
                "x".into(),
            ]],
        };
        let table = standardize(raw);
        assert_eq!(
            table.fields(),
            FieldIndex {
                name: Some(1),
                credit: Some(2),
                grade: Some(3),
            }
        );
        assert_eq!(table.header_labels(), vec!["學期", "科目名稱", "學分", "成績", "成績"]);
        let row = &table.rows[0];
        assert_eq!(table.cell(row, Field::Name), "微積分");
        assert_eq!(table.cell(row, Field::Grade), "A");
    }

    #[test]
    fn missing_field_reads_as_empty() {
        let table = standardize(RawTable {
            header: vec!["Course".into()],
            rows: vec![vec!["X".into()]],
        });
        assert_eq!(table.cell(&table.rows[0], Field::Credit), "");
    }
}

//! Course-name classification into credit categories.
//!
//! Names are reduced to a dense token (no brackets, term suffixes,
//! punctuation, or whitespace) and prefix-matched against curated lists.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::curriculum;

/// Credit category of a course. Every course resolves to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Category {
    Required,
    ElectiveI,
    #[cfg_attr(feature = "serde", serde(rename = "elective_ii"))]
    ElectiveII,
    ElectiveOther,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Required,
        Category::ElectiveI,
        Category::ElectiveII,
        Category::ElectiveOther,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Required => "required",
            Category::ElectiveI => "elective I",
            Category::ElectiveII => "elective II",
            Category::ElectiveOther => "other elective",
        };
        f.write_str(label)
    }
}

/// General-education domain markers (humanities, social science, natural
/// science). A name starting with one of these is always required.
pub const GENERAL_EDUCATION_PREFIXES: &[&str] =
    &["人文：", "人文:", "社會：", "社會:", "自然：", "自然:"];

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(.*?\)|\[.*?\]|【.*?】|〔.*?〕|「.*?」|『.*?』")
        .expect("bracket pattern is valid")
});

static TERM_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[上下]學期|第[一二]學期").expect("term suffix pattern is valid")
});

fn is_separator(c: char) -> bool {
    c.is_whitespace()
        || c.is_ascii_punctuation()
        || matches!(c,
            '\u{2010}'..='\u{2027}'   // dashes, quotes, bullets, ellipsis
            | '\u{3000}'..='\u{303F}' // CJK symbols and punctuation
            | '\u{FE30}'..='\u{FE4F}' // CJK compatibility forms
            | '\u{00B7}' | '\u{30FB}' | '\u{FF65}'
        )
}

/// Reduce a course name to the dense token used for matching.
///
/// Applies NFKC (so full-width brackets and colons fold to ASCII), removes
/// bracketed content and term suffixes, drops punctuation and whitespace,
/// then lowercases.
pub fn normalize_course_name(name: &str) -> String {
    let folded: String = name.nfkc().collect();
    let unbracketed = BRACKETED.replace_all(&folded, "");
    let without_term = TERM_SUFFIX.replace_all(&unbracketed, "");
    without_term
        .chars()
        .filter(|c| !is_separator(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Immutable reference tokens per category, normalized at construction.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    required: Vec<String>,
    elective_i: Vec<String>,
    elective_ii: Vec<String>,
}

static BUILTIN: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        curriculum::REQUIRED,
        curriculum::ELECTIVE_I,
        curriculum::ELECTIVE_II,
    )
});

impl RuleSet {
    pub fn new<S: AsRef<str>>(required: &[S], elective_i: &[S], elective_ii: &[S]) -> Self {
        Self {
            required: prepare(required),
            elective_i: prepare(elective_i),
            elective_ii: prepare(elective_ii),
        }
    }

    /// The compiled-in curriculum, built once per process.
    pub fn builtin() -> &'static RuleSet {
        &BUILTIN
    }

    /// Classify a raw course name.
    pub fn classify(&self, name: &str) -> Category {
        let trimmed = name.trim_start();
        if GENERAL_EDUCATION_PREFIXES
            .iter()
            .any(|prefix| trimmed.starts_with(prefix))
        {
            return Category::Required;
        }

        let token = normalize_course_name(name);
        if token.is_empty() {
            return Category::ElectiveOther;
        }
        let ordered = [
            (Category::Required, &self.required),
            (Category::ElectiveI, &self.elective_i),
            (Category::ElectiveII, &self.elective_ii),
        ];
        for (category, references) in ordered {
            if references.iter().any(|r| token.starts_with(r.as_str())) {
                return category;
            }
        }
        Category::ElectiveOther
    }
}

fn prepare<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| normalize_course_name(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect()
}

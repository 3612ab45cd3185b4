//! Pass/fail evaluation of grade tokens.

use std::sync::LazyLock;

use regex::Regex;

/// Markers that count as passing wherever they appear in the token.
const PASS_MARKERS: &[&str] = &["抵免", "通過", "PASS", "EXEMPT"];

static LETTER_PASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ABC][+\-]?$").expect("letter grade pattern is valid"));

/// Whether `grade` is a passing grade.
///
/// Passing tokens are A, B, or C with an optional `+`/`-` (so `C-` passes),
/// or anything containing an exemption or pass marker. Everything else,
/// including empty tokens, fails.
///
/// Markers match anywhere in the token, so a negated marker still passes:
/// `未通過` ("not passed") contains `通過` and counts as passing.
pub fn is_passing(grade: &str) -> bool {
    let token = grade.trim().to_uppercase();
    if PASS_MARKERS.iter().any(|marker| token.contains(marker)) {
        return true;
    }
    LETTER_PASS.is_match(&token)
}

use transcript::{Analysis, Category};

use crate::cli::{DocumentArgs, OutputFormat};
use crate::shared::{open_transcript, print_json};

pub fn run(document: &DocumentArgs, format: OutputFormat, details: bool) -> Result<(), i32> {
    let transcript = open_transcript(document)?;
    let analysis = transcript.analyze().map_err(|e| {
        eprintln!("Error: failed to extract transcript: {e}");
        1
    })?;

    match format {
        OutputFormat::Json => print_json(&analysis),
        OutputFormat::Text => {
            for line in summary_lines(&analysis, details) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

/// Text report: total, per-category credits, and optionally course lists.
fn summary_lines(analysis: &Analysis, details: bool) -> Vec<String> {
    let Some(result) = analysis.result() else {
        return vec!["No course records found.".to_string()];
    };

    let mut lines = vec![format!("Total credits: {:.2}", result.total)];
    for category in Category::ALL {
        lines.push(format!(
            "  {:<15} {:.0}",
            category.to_string(),
            result.category_total(category)
        ));
    }
    lines.push(format!(
        "Passed: {}  Failed: {}",
        result.passed.len(),
        result.failed.len()
    ));

    if details {
        for category in Category::ALL {
            let mut courses = result.passed_in(category).peekable();
            if courses.peek().is_none() {
                continue;
            }
            lines.push(String::new());
            lines.push(format!("{category}:"));
            lines.extend(
                courses.map(|r| format!("  {}  {} credits  {}", r.name, r.credit, r.grade)),
            );
        }
        if !result.failed.is_empty() {
            lines.push(String::new());
            lines.push("failed:".to_string());
            lines.extend(
                result
                    .failed
                    .iter()
                    .map(|r| format!("  {}  {} credits  {}", r.name, r.credit, r.grade)),
            );
        }
    }
    lines
}

use transcript::{StandardTable, TableSource};

use crate::cli::{DocumentArgs, OutputFormat};
use crate::shared::{format_grid, open_transcript, print_json};

pub fn run(document: &DocumentArgs, format: OutputFormat) -> Result<(), i32> {
    let transcript = open_transcript(document)?;
    let (source, tables) = transcript.standardized_tables().map_err(|e| {
        eprintln!("Error: failed to extract tables: {e}");
        1
    })?;

    match format {
        OutputFormat::Text => {
            for line in table_lines(source, &tables) {
                println!("{line}");
            }
            Ok(())
        }
        OutputFormat::Json => {
            let tables: Vec<serde_json::Value> = tables
                .iter()
                .map(|table| {
                    serde_json::json!({
                        "columns": table.header_labels(),
                        "rows": table.rows,
                    })
                })
                .collect();
            print_json(&serde_json::json!({
                "source": source,
                "tables": tables,
            }))
        }
    }
}

fn source_label(source: TableSource) -> &'static str {
    match source {
        TableSource::Tables => "ruled tables",
        TableSource::TextFallback => "text lines",
        TableSource::Word => "Word tables",
    }
}

fn table_lines(source: TableSource, tables: &[StandardTable]) -> Vec<String> {
    if tables.is_empty() {
        return vec!["No tables found.".to_string()];
    }
    let mut lines = Vec::new();
    for (i, table) in tables.iter().enumerate() {
        lines.push(format!(
            "--- Table {} ({}, {} rows) ---",
            i + 1,
            source_label(source),
            table.rows.len()
        ));
        lines.extend(format_grid(&table.header_labels(), &table.rows));
        lines.push(String::new());
    }
    lines
}

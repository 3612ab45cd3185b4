use transcript::{DocumentFormat, Transcript};
use tracing_subscriber::EnvFilter;

use crate::cli::DocumentArgs;

/// Install the stderr log subscriber.
///
/// `-v`/`-vv` select debug/trace; otherwise `RUST_LOG` applies, falling back
/// to warnings only.
pub fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read and open the transcript named on the command line.
///
/// Returns `Err(1)` with a message printed to stderr if the file is missing,
/// its format cannot be determined, or it cannot be read.
pub fn open_transcript(args: &DocumentArgs) -> Result<Transcript, i32> {
    if !args.file.exists() {
        eprintln!("Error: file not found: {}", args.file.display());
        return Err(1);
    }
    let bytes = std::fs::read(&args.file).map_err(|e| {
        eprintln!("Error: failed to read {}: {e}", args.file.display());
        1
    })?;

    let format = match args.doc_type {
        Some(doc_type) => DocumentFormat::from(doc_type),
        None => DocumentFormat::infer(&bytes, None, Some(&args.file)).map_err(|e| {
            eprintln!("Error: {e} (use --type pdf|docx)");
            1
        })?,
    };
    tracing::debug!(%format, bytes = bytes.len(), "opening transcript");

    Transcript::open(&bytes, format, Some(args.extract_options())).map_err(|e| {
        eprintln!("Error: failed to read transcript: {e}");
        1
    })
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), i32> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        eprintln!("Error: failed to serialize output: {e}");
        1
    })?;
    println!("{json}");
    Ok(())
}

/// Format rows as a `|`-separated grid with left-aligned columns.
///
/// Widths are counted in characters.
pub fn format_grid(header: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count().max(1)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(text, &width)| format!("{text:<width$}"))
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut out = vec![line(header.to_vec())];
    out.extend(rows.iter().map(|row| line(row.iter().map(String::as_str).collect())));
    out
}

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use transcript::{DocumentFormat, ExtractOptions};

/// Total the credits on an academic transcript (PDF or Word).
#[derive(Debug, Parser)]
#[command(name = "transcript-credits", about, version)]
pub struct Cli {
    /// Log extraction details to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify passed courses and total their credits
    Credits {
        #[command(flatten)]
        document: DocumentArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// List passed courses per category and every failed course
        #[arg(long)]
        details: bool,
    },

    /// Show the standardized tables extracted from the document
    Tables {
        #[command(flatten)]
        document: DocumentArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Input file and extraction limits shared by all subcommands.
#[derive(Debug, Args)]
pub struct DocumentArgs {
    /// Path to the transcript file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Document type. Default: inferred from content, then file extension
    #[arg(long = "type", value_enum)]
    pub doc_type: Option<DocType>,

    /// Maximum number of PDF pages to accept
    #[arg(long, default_value_t = 500)]
    pub max_pages: usize,

    /// Wall-clock limit for reading the document, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl DocumentArgs {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            max_pages: self.max_pages,
            deadline: Duration::from_secs(self.timeout_secs),
            ..ExtractOptions::default()
        }
    }
}

/// Output format for all subcommands.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Document type given with `--type`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DocType {
    Pdf,
    Docx,
}

impl From<DocType> for DocumentFormat {
    fn from(value: DocType) -> Self {
        match value {
            DocType::Pdf => DocumentFormat::Pdf,
            DocType::Docx => DocumentFormat::Docx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_credits_with_file() {
        let cli = Cli::parse_from(["transcript-credits", "credits", "transcript.pdf"]);
        match cli.command {
            Commands::Credits {
                ref document,
                format,
                details,
            } => {
                assert_eq!(document.file, PathBuf::from("transcript.pdf"));
                assert!(document.doc_type.is_none());
                assert!(matches!(format, OutputFormat::Text));
                assert!(!details);
            }
            _ => panic!("expected Credits subcommand"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parse_credits_with_all_flags() {
        let cli = Cli::parse_from([
            "transcript-credits",
            "-vv",
            "credits",
            "upload.bin",
            "--type",
            "docx",
            "--format",
            "json",
            "--max-pages",
            "20",
            "--timeout-secs",
            "5",
            "--details",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Credits {
                ref document,
                format,
                details,
            } => {
                assert!(matches!(document.doc_type, Some(DocType::Docx)));
                assert!(matches!(format, OutputFormat::Json));
                assert!(details);
                let options = document.extract_options();
                assert_eq!(options.max_pages, 20);
                assert_eq!(options.deadline, Duration::from_secs(5));
                assert_eq!(options.max_input_bytes, ExtractOptions::default().max_input_bytes);
            }
            _ => panic!("expected Credits subcommand"),
        }
    }

    #[test]
    fn parse_tables_subcommand() {
        let cli = Cli::parse_from(["transcript-credits", "tables", "t.docx", "--verbose"]);
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Commands::Tables { .. }));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = Cli::try_parse_from(["transcript-credits", "credits", "a.pdf", "--type", "xlsx"]);
        assert!(result.is_err());
    }

    #[test]
    fn doc_type_maps_to_format() {
        assert_eq!(DocumentFormat::from(DocType::Pdf), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from(DocType::Docx), DocumentFormat::Docx);
    }
}

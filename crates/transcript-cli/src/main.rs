mod cli;
mod credits_cmd;
mod shared;
mod tables_cmd;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();
    shared::init_logging(cli.verbose);

    let result = match cli.command {
        cli::Commands::Credits {
            ref document,
            format,
            details,
        } => credits_cmd::run(document, format, details),
        cli::Commands::Tables {
            ref document,
            format,
        } => tables_cmd::run(document, format),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}

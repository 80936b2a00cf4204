// vidprep-cli/src/main.rs
//
// Entry point of the vidprep command-line tool: parses arguments, sets up
// logging, routes the chosen subcommand into the core job dispatcher, and
// maps failures onto styled output and a non-zero exit code.

use clap::Parser;
use console::style;
use std::process;

use vidprep_cli::{execute, logging, Cli};

fn main() {
    logging::init();
    let cli = Cli::parse();

    if let Err(e) = execute(cli) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        process::exit(1);
    }
}

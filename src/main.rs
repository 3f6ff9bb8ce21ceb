mod app;

use std::process::ExitCode;

use clap::Parser;

use app::cli::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = app::logging::init(&cli.log_level, cli.log_file.as_deref()) {
        eprintln!("[ERROR]: {e}");
        return ExitCode::FAILURE;
    }

    cli::run_cli(cli)
}

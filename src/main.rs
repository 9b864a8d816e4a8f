use std::process::ExitCode;

use bsedit::cli::{self, CliArgs};
use bsedit::logger;
use clap::Parser;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    logger::init();
    bsedit::log_info!("Starting BSEdit {}", env!("CARGO_PKG_VERSION"));
    cli::run(args)
}

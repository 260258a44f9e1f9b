//! CC-News dataset fetcher binary

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use ccnews_core::{ProgressContext, init_logging, install_signal_handlers};
use ccnews_fetcher::{Cli, RunConfig, run};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let progress = Arc::new(ProgressContext::new());
    let multi = if progress.is_tty() {
        Some(progress.multi())
    } else {
        None
    };
    init_logging(cli.quiet, cli.verbose, multi);
    install_signal_handlers();

    let config = match RunConfig::try_from(cli) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Configuration error: {e:#}");
            return ExitCode::from(2);
        }
    };

    match run(&config, progress) {
        Ok(code) => code,
        Err(e) => {
            log::error!("Fatal error: {e:#}");
            ExitCode::from(1)
        }
    }
}

mod cli;
mod config;
mod core;
mod error;
mod models;
mod sources;

#[cfg(feature = "gui")]
mod gui;

use clap::Parser;
use log::LevelFilter;

/// Log level from `XIMAEXPORT_LOG`, warnings by default.
fn log_level() -> LevelFilter {
    std::env::var("XIMAEXPORT_LOG")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

fn main() {
    let mut clog = colog::default_builder();
    clog.filter(None, log_level());
    clog.init();

    let cli = cli::Cli::parse();

    match cli::run(cli) {
        Ok(status) => std::process::exit(status),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

//! SourceChat CLI: chat with your projects' knowledge sources from a terminal.
//!
//! Thin front end over `sourcechat-core`; every command drives one view model
//! and prints its state.

mod commands;
mod context;
mod output;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}

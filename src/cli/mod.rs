//! CLI for the persona gateway

pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "persona-gateway", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP gateway (default)
    Serve,
}

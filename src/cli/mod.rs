//! CLI module - Command-line interface for Bistro
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Bistro - restaurant ordering backend
#[derive(Parser)]
#[command(name = "bistro")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run migrations and serve the HTTP API (default)
    #[command(alias = "-s", alias = "--serve")]
    Serve,

    /// Validate the configuration and check database connectivity
    #[command(alias = "-c", alias = "--check")]
    Check,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["bistro"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = Cli::try_parse_from(["bistro", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));

        let cli = Cli::try_parse_from(["bistro", "init"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Init)));

        assert!(Cli::try_parse_from(["bistro", "bogus"]).is_err());
    }
}

//! Command-line interface for the scout-server binary
//!
//! Parsed with clap; colored output goes through [`output::Output`].

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scout - company research server
#[derive(Parser, Debug)]
#[command(
    name = "scout-server",
    version,
    about = "Scout - company research server",
    long_about = "Research companies with GPT-4, Claude, Mistral or Grok and keep a\n\
                  structured, annotated history of the reports.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  scout-server                      # Start the server (reads scout.toml)\n    \
                  scout-server --config my.toml     # Use a custom config file\n    \
                  scout-server config --validate    # Check the configuration and exit\n    \
                  scout-server migrate              # Backfill legacy records"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "scout.toml", global = true)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Show configuration information
    Config {
        /// Validate the configuration file and exit
        #[arg(long)]
        validate: bool,
    },

    /// Run the data migrations against the configured database
    Migrate,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run, `serve` when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["scout-server"]);
        assert_eq!(cli.command(), Commands::Serve);
        assert_eq!(cli.config, PathBuf::from("scout.toml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "scout-server",
            "config",
            "--validate",
            "--config",
            "custom.toml",
            "--no-color",
        ]);
        assert_eq!(cli.command(), Commands::Config { validate: true });
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert!(cli.no_color);
    }

    #[test]
    fn test_migrate_command() {
        let cli = Cli::parse_from(["scout-server", "-v", "migrate"]);
        assert_eq!(cli.command(), Commands::Migrate);
        assert!(cli.verbose);
    }
}

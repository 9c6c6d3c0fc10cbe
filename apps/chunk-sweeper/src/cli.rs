//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::CONFIG_ENV;

/// Removes abandoned chunk upload fragments from the chunk directory.
#[derive(Debug, Parser)]
#[command(name = "chunk-sweeper", version, about)]
pub struct Cli {
    /// Sweep once and exit instead of following the configured schedule
    #[arg(long)]
    pub once: bool,

    /// Configuration file (created with defaults when missing)
    #[arg(short, long, env = CONFIG_ENV, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_once_and_config() {
        let cli = Cli::try_parse_from(["chunk-sweeper", "--once", "--config", "/etc/sweep.toml"])
            .unwrap();
        assert!(cli.once);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/sweep.toml")));
    }

    #[test]
    fn scheduled_by_default() {
        let cli = Cli::try_parse_from(["chunk-sweeper", "-c", "sweep.toml"]).unwrap();
        assert!(!cli.once);
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let err = Cli::try_parse_from(["chunk-sweeper", "--onc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}

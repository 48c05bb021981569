//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "cellblock.toml";

#[derive(Parser)]
#[command(name = "cellblock")]
#[command(about = "Run untrusted Python snippets behind a denylist and resource limits")]
#[command(
    long_about = r#"Run untrusted Python snippets behind a denylist and resource limits

USAGE:
  cellblock run script.py              # Execute a file, print the result as JSON
  echo "print(1)" | cellblock run -    # Execute code read from stdin
  cellblock check script.py            # Static analysis only
  cellblock serve-json                 # One JSON request per line on stdin
  cellblock config show                # Show the effective configuration

Results always carry `success`; the exit status is non-zero only when no
result could be produced."#
)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (defaults are used when it does not exist)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE, env = "CELLBLOCK_CONFIG")]
    pub config_file: PathBuf,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute code and print the result as JSON
    Run {
        /// Source file, or `-` for stdin
        #[arg(default_value = "-")]
        file: String,

        /// Text fed to the program's stdin
        #[arg(long, default_value = "")]
        stdin: String,

        /// User id recorded with the result
        #[arg(long, default_value = "anonymous")]
        user: String,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },

    /// Run the static analyzer only and print the verdict
    Check {
        /// Source file, or `-` for stdin
        #[arg(default_value = "-")]
        file: String,
    },

    /// Read one JSON payload per line from stdin, write one JSON result per line
    ServeJson,

    /// Print the built-in example programs
    Examples,

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Display the effective configuration as TOML
    Show,

    /// Validate the configuration file
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from(["cellblock", "run", "main.py", "--stdin", "42", "--user", "alice"]);
        match cli.command {
            Commands::Run {
                file, stdin, user, ..
            } => {
                assert_eq!(file, "main.py");
                assert_eq!(stdin, "42");
                assert_eq!(user, "alice");
            }
            _ => panic!("expected run"),
        }
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "cellblock",
            "serve-json",
            "--log-format",
            "json",
            "--config-file",
            "/etc/cellblock.yaml",
        ]);
        assert!(matches!(cli.command, Commands::ServeJson));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.config_file, PathBuf::from("/etc/cellblock.yaml"));
    }
}

use std::path::PathBuf;

use clap::Parser;

use crate::logging::LogLevel;

/// Replay an input script through the control mapper and print its output
#[derive(Parser, Debug)]
#[command(name = "ctrlmap-replay")]
#[command(version)]
#[command(about = "Replay input scripts through the control mapper", long_about = None)]
pub struct Cli {
    /// Script to replay; one command per line
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Mapper config file (TOML); defaults are used when omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace or 0-6)
    #[arg(short, long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: LogLevel,

    /// Print the mapper state after the last command
    #[arg(short, long)]
    pub dump_at_end: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["ctrlmap-replay", "moves.txt"]).unwrap();
        assert_eq!(cli.script, PathBuf::from("moves.txt"));
        assert_eq!(cli.config, None);
        assert_eq!(cli.log_level, LogLevel::Warning);
        assert!(!cli.dump_at_end);
    }

    #[test]
    fn test_parse_all_options() {
        let cli = Cli::try_parse_from([
            "ctrlmap-replay",
            "--config",
            "mapper.toml",
            "--log-level",
            "debug",
            "--dump-at-end",
            "moves.txt",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("mapper.toml")));
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(cli.dump_at_end);
    }

    #[test]
    fn test_bad_log_level() {
        assert!(Cli::try_parse_from(["ctrlmap-replay", "-l", "loud", "moves.txt"]).is_err());
    }

    #[test]
    fn test_script_required() {
        assert!(Cli::try_parse_from(["ctrlmap-replay"]).is_err());
    }
}

//! Logging CLI arguments.

use clap::Args;
use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    #[serde(skip)] // CLI-only, count action doesn't make sense in config
    pub verbosity: u8,

    /// Log filter directive (e.g., "tessera_sealing=debug,reqwest=warn").
    #[arg(long = "log.filter", value_name = "DIRECTIVE", global = true)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json", global = true)]
    pub json: bool,
}

impl LogArgs {
    /// Base level implied by `--quiet` and the verbosity count.
    pub fn base_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_level() {
        let mut args = LogArgs::default();
        assert_eq!(args.base_level(), "info");
        args.verbosity = 2;
        assert_eq!(args.base_level(), "trace");
        args.quiet = true;
        assert_eq!(args.base_level(), "error");
    }

    #[test]
    fn test_verbosity_not_serialized() {
        let args = LogArgs {
            verbosity: 3,
            json: true,
            ..Default::default()
        };
        let encoded = toml::to_string(&args).unwrap();
        assert!(!encoded.contains("verbosity"));
        let decoded: LogArgs = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded.verbosity, 0);
        assert!(decoded.json);
    }
}

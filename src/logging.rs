//! Logging setup
//!
//! The library logs through `tracing` macros only; installing a subscriber
//! is left to the host. [`init_logging`] is the subscriber used by the
//! replay tool: fmt output on stderr, filtered by `RUST_LOG` when set and by
//! the requested [`LogLevel`] otherwise.

use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Verbosity levels, numbered like the classic integer log levels
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Nothing = 0,
    User = 1,
    Error = 2,
    Warning = 3,
    Info = 4,
    Debug = 5,
    All = 6,
}

impl LogLevel {
    /// Create a LogLevel from an integer
    pub fn from_i32(level: i32) -> Self {
        match level {
            0 => LogLevel::Nothing,
            1 => LogLevel::User,
            2 => LogLevel::Error,
            3 => LogLevel::Warning,
            4 => LogLevel::Info,
            5 => LogLevel::Debug,
            6 => LogLevel::All,
            _ => LogLevel::Info,
        }
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// `EnvFilter` directive for this level
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Nothing => "off",
            LogLevel::User | LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::All => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Accepts a level name or its number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<i32>() {
            return Ok(LogLevel::from_i32(n));
        }
        match s.to_ascii_lowercase().as_str() {
            "nothing" | "off" | "none" => Ok(LogLevel::Nothing),
            "user" => Ok(LogLevel::User),
            "error" => Ok(LogLevel::Error),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "all" | "trace" => Ok(LogLevel::All),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Install the global subscriber.
///
/// Returns false when a subscriber was already installed.
pub fn init_logging(level: LogLevel) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .is_ok()
}

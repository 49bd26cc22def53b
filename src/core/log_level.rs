//! Log level definitions
//!
//! Levels form a total order backed by a numeric rank. Configuration values
//! (ranks, names in any case) normalize through [`LogLevel::parse`], which
//! never fails: anything unrecognized falls back to the default level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
    /// Catch-all above `Fatal`
    Unknown = 5,
}

impl LogLevel {
    /// Level used when a configured value cannot be recognized
    pub const DEFAULT: LogLevel = LogLevel::Info;

    pub const ALL: [LogLevel; 6] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
        LogLevel::Unknown,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::Unknown => "UNKNOWN",
        }
    }

    #[inline]
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn from_rank(rank: i64) -> Option<Self> {
        match rank {
            0 => Some(LogLevel::Debug),
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Warn),
            3 => Some(LogLevel::Error),
            4 => Some(LogLevel::Fatal),
            5 => Some(LogLevel::Unknown),
            _ => None,
        }
    }

    /// Normalize any level spelling, falling back to [`LogLevel::DEFAULT`]
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_dispatch_logger::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse(3), LogLevel::Error);
    /// assert_eq!(LogLevel::parse("ERROR"), LogLevel::Error);
    /// assert_eq!(LogLevel::parse("error"), LogLevel::Error);
    /// assert_eq!(LogLevel::parse(99), LogLevel::Info);
    /// assert_eq!(LogLevel::parse("foo"), LogLevel::Info);
    /// ```
    pub fn parse(value: impl Into<LevelSpec>) -> Self {
        Self::parse_or(value, Self::DEFAULT)
    }

    /// Normalize any level spelling, falling back to `default`
    pub fn parse_or(value: impl Into<LevelSpec>, default: LogLevel) -> Self {
        match value.into() {
            LevelSpec::Level(level) => level,
            LevelSpec::Rank(rank) => Self::from_rank(rank).unwrap_or(default),
            LevelSpec::Name(name) => name.parse().unwrap_or(default),
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Fatal => BrightRed,
            LogLevel::Unknown => BrightBlack,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            "UNKNOWN" | "ANY" => Ok(LogLevel::Unknown),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Any accepted spelling of a level: an already-typed level, a numeric rank,
/// or a case-insensitive name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    Level(LogLevel),
    Rank(i64),
    Name(String),
}

impl From<LogLevel> for LevelSpec {
    fn from(level: LogLevel) -> Self {
        LevelSpec::Level(level)
    }
}

impl From<i64> for LevelSpec {
    fn from(rank: i64) -> Self {
        LevelSpec::Rank(rank)
    }
}

impl From<i32> for LevelSpec {
    fn from(rank: i32) -> Self {
        LevelSpec::Rank(rank as i64)
    }
}

impl From<u8> for LevelSpec {
    fn from(rank: u8) -> Self {
        LevelSpec::Rank(rank as i64)
    }
}

impl From<&str> for LevelSpec {
    fn from(name: &str) -> Self {
        LevelSpec::Name(name.to_string())
    }
}

impl From<String> for LevelSpec {
    fn from(name: String) -> Self {
        LevelSpec::Name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order_is_total() {
        for pair in LogLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].rank() < pair[1].rank());
        }
        assert!(LogLevel::Unknown > LogLevel::Fatal);
    }

    #[test]
    fn test_parse_rank() {
        assert_eq!(LogLevel::parse(0), LogLevel::Debug);
        assert_eq!(LogLevel::parse(5), LogLevel::Unknown);
        assert_eq!(LogLevel::parse(-1), LogLevel::Info);
        assert_eq!(LogLevel::parse(99), LogLevel::Info);
    }

    #[test]
    fn test_parse_names_case_insensitive() {
        assert_eq!(LogLevel::parse("warn"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("Warning"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("FATAL"), LogLevel::Fatal);
        assert_eq!(LogLevel::parse("unknown"), LogLevel::Unknown);
    }

    #[test]
    fn test_parse_falls_back_to_configured_default() {
        assert_eq!(LogLevel::parse_or("nope", LogLevel::Error), LogLevel::Error);
        assert_eq!(LogLevel::parse_or(42, LogLevel::Debug), LogLevel::Debug);
        assert_eq!(LogLevel::parse_or("debug", LogLevel::Error), LogLevel::Debug);
    }

    #[test]
    fn test_from_str_is_strict() {
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Info));
    }

    #[test]
    fn test_level_spec_deserialize() {
        let spec: LevelSpec = serde_json::from_str("3").unwrap();
        assert_eq!(LogLevel::parse(spec), LogLevel::Error);

        let spec: LevelSpec = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(LogLevel::parse(spec), LogLevel::Error);
    }
}

//! CLI-specific error types
//!
//! Command failures inside the shell are reported as classifications; these
//! errors cover everything around them: configuration, files, connecting.

use std::fmt;
use std::io;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (files, stdin/stdout)
    IoError,
    /// Config file already present
    AlreadyInitialized,
    /// Cluster could not be reached
    ConnectionFailed,
    /// Script line could not be parsed
    ParseError,
    /// No shell command by that name
    UnknownCommand,
    /// No command group by that name
    UnknownGroup,
    /// A shell command failed
    CommandFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "COLSHELL_CLI_CONFIG_ERROR",
            Self::IoError => "COLSHELL_CLI_IO_ERROR",
            Self::AlreadyInitialized => "COLSHELL_CLI_ALREADY_INITIALIZED",
            Self::ConnectionFailed => "COLSHELL_CLI_CONNECTION_FAILED",
            Self::ParseError => "COLSHELL_CLI_PARSE_ERROR",
            Self::UnknownCommand => "COLSHELL_CLI_UNKNOWN_COMMAND",
            Self::UnknownGroup => "COLSHELL_CLI_UNKNOWN_GROUP",
            Self::CommandFailed => "COLSHELL_CLI_COMMAND_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized(path: &str) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("{} already exists. Pass --force to overwrite it.", path),
        )
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConnectionFailed, msg)
    }

    pub fn parse_error(line: usize, msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ParseError, format!("line {}: {}", line, msg.into()))
    }

    pub fn unknown_command(name: &str) -> Self {
        Self::new(CliErrorCode::UnknownCommand, format!("Unknown command '{}'", name))
    }

    pub fn unknown_group(name: &str) -> Self {
        Self::new(CliErrorCode::UnknownGroup, format!("Unknown command group '{}'", name))
    }

    /// `failed` of `total` commands did not succeed.
    pub fn command_failed(failed: usize, total: usize) -> Self {
        Self::new(
            CliErrorCode::CommandFailed,
            format!("{} of {} command(s) failed", failed, total),
        )
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_code_then_message() {
        let err = CliError::config_error("bad");
        assert_eq!(err.to_string(), "COLSHELL_CLI_CONFIG_ERROR: bad");
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_parse_error_names_line() {
        let err = CliError::parse_error(3, "unterminated quote");
        assert_eq!(err.message(), "line 3: unterminated quote");
        assert_eq!(err.code_str(), "COLSHELL_CLI_PARSE_ERROR");
    }

    #[test]
    fn test_from_io() {
        let err: CliError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.code(), &CliErrorCode::IoError);
    }
}

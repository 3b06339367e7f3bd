//! Error types for clitree

use thiserror::Error;

/// Result type alias for clitree operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Main error type for clitree
#[derive(Error, Debug)]
pub enum CliError {
    /// Command-line matching errors
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Default or environment value rejected by its destination
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Failed to load an environment file
    #[error("Environment file error: {0}")]
    EnvFile(String),
}

/// Errors raised while matching an argument sequence
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unrecognized option '{0}'")]
    UnrecognizedOption(String),

    #[error("flag needs an argument: '{0}'")]
    MissingArgument(String),

    #[error("invalid argument for flag '{flag}': {source}")]
    InvalidValue {
        flag: String,
        #[source]
        source: ValueError,
    },
}

/// A literal that could not be stored in its destination
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("invalid {kind} value '{input}': {reason}")]
    Invalid {
        input: String,
        kind: &'static str,
        reason: String,
    },

    #[error("invalid {kind} value '{input}': out of range")]
    OutOfRange { input: String, kind: &'static str },
}

impl ValueError {
    pub(crate) fn invalid(input: &str, kind: &'static str, reason: impl ToString) -> Self {
        ValueError::Invalid {
            input: input.to_string(),
            kind,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn out_of_range(input: &str, kind: &'static str) -> Self {
        ValueError::OutOfRange {
            input: input.to_string(),
            kind,
        }
    }
}

/// Specialized result type for matching operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Specialized result type for value operations
pub type ValueResult<T> = std::result::Result<T, ValueError>;

use thiserror::Error;

/// Failures of the option store and the option commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("missing option: {name}")]
    MissingOption { name: String },
    #[error("option {name} is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },
    #[error("unknown option: {name}")]
    UnknownOption { name: String },
    #[error("bad value for {name}: {value} ({reason})")]
    InvalidOptionValue { name: String, value: String, reason: String },
}

/// Failures reported by a command to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CmdError {
    #[error("must be run interactively")]
    NoInteractiveClient,
    #[error("can't find {0}")]
    TargetNotFound(String),
    #[error("pane is busy")]
    ModeEntryRejected,
    #[error("usage: {usage}")]
    Usage { usage: String },
    #[error("duplicate session: {0}")]
    DuplicateSession(String),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("ambiguous command: {0}")]
    AmbiguousCommand(String),
    #[error(transparent)]
    Option(#[from] OptionError),
}

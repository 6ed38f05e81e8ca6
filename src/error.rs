//! Error types shared by the parameter model, the task engine and commands
//!
//! Three kinds of trouble flow through the framework:
//! - declaration faults ([`DeclarationError`]), defects in how commands and tasks
//!   were declared, always fatal;
//! - failures ([`Failure`]), the non-nil status of a task or command, reported to
//!   the user and mapped to a non-zero exit code;
//! - everything else in [`Error`], fatal for the current process.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::exitcode;
use crate::task::GraphError;

/// Defects in parameter, task or command declarations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("couldn't figure out normalized name from {0:?}")]
    NoName(Vec<String>),

    #[error("invalid flag syntax for {name}: {token:?}")]
    BadFlagSyntax { name: String, token: String },

    #[error("won't merge {name}: {first} conflicts with {second}")]
    ConflictingSyntax {
        name: String,
        first: String,
        second: String,
    },

    #[error("won't merge {incoming} into {existing}: must have same name")]
    NameMismatch { existing: String, incoming: String },

    #[error("can't have both callback and validation for {0}")]
    CallbackWithValidator(String),

    #[error("a glob parameter must be positional: {0}")]
    GlobNotPositional(String),

    #[error("glob must be the final positional parameter: {0}")]
    MisplacedGlob(String),

    #[error("last required positional at {required} must be before first optional at {optional}")]
    RequiredAfterOptional { required: usize, optional: usize },

    #[error("flag {spelling} is declared by both {first} and {second}")]
    DuplicateSpelling {
        spelling: String,
        first: String,
        second: String,
    },

    #[error("task not found: {0}")]
    UnknownTask(String),

    #[error("task already registered: {0}")]
    DuplicateTask(String),

    #[error("can't have positional arguments and subcommands")]
    PositionalWithSubcommands,

    #[error("can't have subcommands if you already have a {0}")]
    SelectorNameTaken(String),
}

/// The non-nil status of a task or a command.
///
/// Carries a short identifying code (`network_error`, `disk_full`) and the
/// process exit code it maps to at the process boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    code: Cow<'static, str>,
    exit_code: i32,
}

impl Failure {
    /// A task or command failure with the given code
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: code.into(),
            exit_code: exitcode::FAILURE,
        }
    }

    /// A failure caused by bad user input (unparsable flags, missing parameters)
    pub fn usage(code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: code.into(),
            exit_code: exitcode::USAGE,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Errors propagated through the command pipeline and the dependency walk.
#[derive(Debug, Error)]
pub enum Error {
    /// A task or command returned a failure status. The only recoverable variant.
    #[error("failed: {0}")]
    Failed(Failure),

    #[error("circular dependency detected: {0:?} is already being run while trying to run itself")]
    CircularDependency(String),

    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("expected parameter not set: {0:?}")]
    ParameterNotSet(String),

    #[error("no handler for interrupt: {0}")]
    UnhandledInterrupt(String),
}

impl From<Failure> for Error {
    fn from(failure: Failure) -> Self {
        Error::Failed(failure)
    }
}

impl Error {
    /// True for everything except a plain failure status
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Failed(_))
    }

    /// The failure status, if this is one
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Error::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Failed(failure) => failure.exit_code(),
            _ => exitcode::SOFTWARE,
        }
    }
}

/// Result of running a task or a command step: `Ok(())` is success.
pub type Outcome = Result<(), Error>;

/// Shorthand for returning a failure status from a task.
pub fn fail(code: impl Into<Cow<'static, str>>) -> Outcome {
    Err(Error::Failed(Failure::new(code)))
}

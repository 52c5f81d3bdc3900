//! Error types for the session coder.
//!
//! Internal stages return these structured errors; the only place that turns
//! them into user-facing text is the turn boundary (`Coder::input_and_run`)
//! and the REPL, which renders them through `miette`.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

pub type CoderResult<T> = std::result::Result<T, CoderError>;

#[derive(Error, Diagnostic, Debug)]
pub enum CoderError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("invalid config file {path}")]
    #[diagnostic(code(gocell::config), help("the config file must be a JSON object"))]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(gocell::io))]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Value store
// ============================================================================

#[derive(Error, Diagnostic, Debug)]
pub enum StoreError {
    /// No blob or type tag was ever written for the name.
    #[error("no stored value for `{name}`")]
    #[diagnostic(
        code(gocell::store::missing),
        help("the value was never persisted, or its turn failed before persisting")
    )]
    Missing { name: String },

    #[error("stored value `{name}` has type `{found}`, expected `{expected}`")]
    #[diagnostic(code(gocell::store::type_mismatch))]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    /// Function values are only ever replayed from their source.
    #[error("function value `{name}` has no recorded source")]
    #[diagnostic(
        code(gocell::store::unregistered_function),
        help("re-enter the function literal to bind `{name}` again")
    )]
    UnregisteredFunction { name: String },

    #[error("failed to encode `{name}`")]
    #[diagnostic(code(gocell::store::encode))]
    Encode {
        name: String,
        #[source]
        source: bincode::Error,
    },

    #[error("failed to decode `{name}`")]
    #[diagnostic(code(gocell::store::decode))]
    Decode {
        name: String,
        #[source]
        source: bincode::Error,
    },

    #[error("store io error at {path}")]
    #[diagnostic(code(gocell::store::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// External processes
// ============================================================================

#[derive(Error, Diagnostic, Debug)]
pub enum ToolchainError {
    #[error("failed to start `{program}`")]
    #[diagnostic(
        code(gocell::toolchain::spawn),
        help("make sure `{program}` is installed and on PATH (goimports: `go install golang.org/x/tools/cmd/goimports@latest`)")
    )]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Unused-binding resolver
// ============================================================================

#[derive(Error, Diagnostic, Debug)]
pub enum ResolveError {
    #[error("program has no `func main()`")]
    #[diagnostic(code(gocell::resolve::no_entry_point))]
    NoEntryPoint,

    #[error("trial build failed:\n{0}")]
    #[diagnostic(code(gocell::resolve::trial_build))]
    TrialBuild(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Toolchain(#[from] ToolchainError),
}

// ============================================================================
// Turn boundary
// ============================================================================

#[derive(Error, Diagnostic, Debug)]
pub enum TurnError {
    /// The program failed to build or run; `text` is already formatted.
    /// `stdout` holds whatever the program printed before failing.
    #[error("{text}")]
    #[diagnostic(code(gocell::run))]
    Run {
        stdout: String,
        text: String,
        benign: bool,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Coder(#[from] CoderError),
}

impl TurnError {
    pub fn is_benign(&self) -> bool {
        matches!(self, TurnError::Run { benign: true, .. })
    }
}

impl From<StoreError> for TurnError {
    fn from(err: StoreError) -> Self {
        TurnError::Coder(err.into())
    }
}

impl From<ToolchainError> for TurnError {
    fn from(err: ToolchainError) -> Self {
        TurnError::Coder(err.into())
    }
}

impl From<std::io::Error> for TurnError {
    fn from(err: std::io::Error) -> Self {
        TurnError::Coder(err.into())
    }
}

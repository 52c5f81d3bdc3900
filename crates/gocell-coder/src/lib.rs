//! Incremental session coder for an interactive Go notebook.
//!
//! Every turn of input is assembled with the accumulated session state into a
//! complete `package main` program, run as a fresh process, and the values it
//! binds are persisted so the next turn can see them.

pub mod assemble;
pub mod coder;
pub mod completion;
pub mod config;
pub mod display;
pub mod driver;
pub mod error;
mod lexer;
pub mod oracle;
pub mod plan;
pub mod recover;
pub mod resolve;
pub mod session;
pub mod store;
pub mod syntax;
pub mod token;
pub mod toolchain;
pub mod workspace;

pub use crate::coder::Coder;
pub use crate::config::CoderConfig;
pub use crate::error::{CoderError, CoderResult, TurnError};
pub use crate::lexer::tokenize;
pub use crate::session::Session;
pub use crate::toolchain::{GoToolchain, ProcessOutput, Toolchain};
pub use crate::workspace::Workspace;

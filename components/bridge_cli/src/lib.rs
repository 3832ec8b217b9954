//! Bindings Inspector CLI Library
//!
//! Provides the Inspector and argument types behind `bridge-inspect`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod inspector;

pub use cli::{Cli, Command};
pub use error::{CliError, CliResult};
pub use inspector::{describe, Inspector};

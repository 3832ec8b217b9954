//! Errors raised by context setup and boundary calls.

use core_types::JsError;
use value_bridge::BridgeError;

/// Errors produced by the bindings layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    /// `install_bindings` was called twice on one context
    #[error("bindings are already installed in this context")]
    AlreadyInstalled,
    /// A type was installed before its parent's prototype existed
    #[error("cannot install {child}: parent {parent} is not installed")]
    ParentNotInstalled {
        /// Type being installed
        child: &'static str,
        /// Missing parent
        parent: &'static str,
    },
    /// Two records share a class id or a name
    #[error("duplicate type registration: {0}")]
    DuplicateType(String),
    /// A record names a parent that is not part of the table
    #[error("{child} extends unregistered type {parent}")]
    UnregisteredParent {
        /// Registered type
        child: &'static str,
        /// Parent missing from the table
        parent: &'static str,
    },
    /// Walking a parent chain revisits a record
    #[error("inheritance cycle through {0}")]
    InheritanceCycle(&'static str),
    /// A script-level error surfaced at the boundary
    #[error(transparent)]
    Script(#[from] JsError),
    /// A tagged value broke the boundary contract
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// The context has been disposed
    #[error("script context is disposed")]
    ContextDisposed,
    /// Context options could not be loaded
    #[error("invalid context options: {0}")]
    Config(String),
}

/// Result alias for the bindings layer.
pub type BindingResult<T> = Result<T, BindingError>;

//! Per-context configuration.

use crate::{BindingError, BindingResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options fixed when a [`crate::ScriptContext`] is created.
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
///
/// # Examples
///
/// ```
/// use bindings::ContextOptions;
///
/// let options = ContextOptions::from_json_str(r#"{"max_list_length": 16}"#).unwrap();
/// assert_eq!(options.max_list_length, 16);
/// assert_eq!(options.gc_allocation_threshold, ContextOptions::default().gc_allocation_threshold);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// Longest list accepted from or sent to the host
    pub max_list_length: usize,
    /// Longest string, in UTF-16 code units, accepted from or sent to the host
    pub max_string_length: usize,
    /// Allocations between collections at the microtask safe point (0 disables)
    pub gc_allocation_threshold: usize,
    /// Whether the context runs on a dedicated thread of its host
    pub dedicated_thread: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_list_length: 1 << 20,
            max_string_length: 1 << 28,
            gc_allocation_threshold: 4096,
            dedicated_thread: false,
        }
    }
}

impl ContextOptions {
    /// Parses options from JSON text.
    pub fn from_json_str(text: &str) -> BindingResult<Self> {
        serde_json::from_str(text).map_err(|e| BindingError::Config(e.to_string()))
    }

    /// Reads options from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> BindingResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BindingError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }
}

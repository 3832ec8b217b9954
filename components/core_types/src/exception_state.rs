//! Exception state passed as an explicit output parameter.
//!
//! Conversions that run where a thrown value cannot propagate (dictionary
//! conversion, calls arriving from the host) record their failure here. The
//! nearest boundary call then decides whether to stringify it for the host or
//! rethrow it into script.

use crate::{ErrorKind, JsError};

/// Holds at most one pending script error.
///
/// The first exception thrown wins; later throws are ignored so the error
/// reported to the host is the root cause.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, ExceptionState};
///
/// let mut exception_state = ExceptionState::new();
/// assert!(!exception_state.has_exception());
///
/// exception_state.throw_exception(ErrorKind::RangeError, "bad index");
/// let (message, length) = exception_state.stringify().unwrap();
/// assert_eq!(message, "RangeError: bad index");
/// assert_eq!(length, message.len());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionState {
    exception: Option<JsError>,
}

impl ExceptionState {
    /// Creates an exception state with no pending exception.
    pub fn new() -> Self {
        Self { exception: None }
    }

    /// Records an exception of the given kind.
    pub fn throw_exception(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.throw(JsError::new(kind, message));
    }

    /// Records an already constructed error.
    pub fn throw(&mut self, error: JsError) {
        if self.exception.is_none() {
            self.exception = Some(error);
        }
    }

    /// Whether an exception is pending.
    pub fn has_exception(&self) -> bool {
        self.exception.is_some()
    }

    /// The pending exception, if any.
    pub fn exception(&self) -> Option<&JsError> {
        self.exception.as_ref()
    }

    /// Removes and returns the pending exception.
    pub fn take(&mut self) -> Option<JsError> {
        self.exception.take()
    }

    /// Renders the pending exception as `"<Kind>: <message>"` together with its
    /// byte length, for hosts that copy it out before discarding the state.
    pub fn stringify(&self) -> Option<(String, usize)> {
        self.exception.as_ref().map(|error| {
            let message = error.to_string();
            let length = message.len();
            (message, length)
        })
    }

    /// Converts into a `Result`, yielding `value` when nothing was thrown.
    pub fn into_result<T>(self, value: T) -> Result<T, JsError> {
        match self.exception {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }
}

//! Script value representation.
//!
//! This module provides the core `Value` enum that represents every value a
//! script can observe. Objects are referenced by [`ObjectId`] into the heap of
//! the context that created them.

use crate::ObjectId;
use std::fmt;

/// A script string stored as UTF-16 code units.
///
/// The length is explicit: embedded NUL code units and unpaired surrogates
/// are preserved exactly, which is what script engines expose.
///
/// # Examples
///
/// ```
/// use core_types::JsString;
///
/// let s = JsString::from("a\0b");
/// assert_eq!(s.len(), 3);
/// assert_eq!(s.to_string_lossy(), "a\0b");
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString {
    units: Vec<u16>,
}

impl JsString {
    /// Creates a string from raw UTF-16 code units.
    pub fn from_utf16(units: Vec<u16>) -> Self {
        Self { units }
    }

    /// The UTF-16 code units of this string.
    pub fn as_code_units(&self) -> &[u16] {
        &self.units
    }

    /// Consumes the string and returns its code units.
    pub fn into_code_units(self) -> Vec<u16> {
        self.units
    }

    /// Number of UTF-16 code units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true for the empty string.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Converts to a Rust string, replacing unpaired surrogates with U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }

    /// Converts to a Rust string, or `None` if the string holds unpaired surrogates.
    pub fn to_rust_string(&self) -> Option<String> {
        String::from_utf16(&self.units).ok()
    }

    /// Parses the string as a canonical array index (`"0"`, `"17"`, never `"01"`).
    pub fn as_array_index(&self) -> Option<u32> {
        let s = self.to_rust_string()?;
        array_index(&s)
    }
}

/// Parses a property name as a canonical array index.
pub fn array_index(name: &str) -> Option<u32> {
    if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
        return None;
    }
    if !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // u32::MAX is the length sentinel, not a valid index.
    name.parse::<u32>().ok().filter(|index| *index != u32::MAX)
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        Self {
            units: s.encode_utf16().collect(),
        }
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString::from(s.as_str())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_lossy())
    }
}

/// Represents any script value.
///
/// Primitive values are stored inline, while objects are referenced by handle.
/// Functions, arrays and wrapped native objects are all objects; telling them
/// apart requires the owning context.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let float = Value::Double(3.14);
///
/// assert!(!undefined.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(float.type_of(), "number");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The undefined value
    Undefined,
    /// The null value
    Null,
    /// Boolean (true or false)
    Boolean(bool),
    /// Small integer (fits in 32 bits)
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// String value
    String(JsString),
    /// Heap object (referenced by handle)
    Object(ObjectId),
}

impl Value {
    /// Creates a string value from a Rust string.
    pub fn string(s: &str) -> Self {
        Value::String(JsString::from(s))
    }

    /// Creates a number, using `Smi` when the value is an exact 32-bit integer.
    ///
    /// `-0.0` stays a double so the sign survives.
    pub fn number(n: f64) -> Self {
        if n.fract() == 0.0
            && n >= i32::MIN as f64
            && n <= i32::MAX as f64
            && !(n == 0.0 && n.is_sign_negative())
        {
            Value::Smi(n as i32)
        } else {
            Value::Double(n)
        }
    }

    /// Creates a number from a 64-bit integer, falling back to a double
    /// when it does not fit in a `Smi`.
    pub fn from_i64(n: i64) -> Self {
        match i32::try_from(n) {
            Ok(smi) => Value::Smi(smi),
            Err(_) => Value::Double(n as f64),
        }
    }

    /// Returns the object handle if this value is an object.
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the numeric value of `Smi` and `Double`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Smi(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns true for undefined and null.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns whether this value is truthy.
    ///
    /// The falsy values are undefined, null, false, 0, -0, NaN and the
    /// empty string. All objects are truthy.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::{ObjectId, Value};
    ///
    /// assert!(!Value::Undefined.is_truthy());
    /// assert!(!Value::Double(f64::NAN).is_truthy());
    /// assert!(!Value::string("").is_truthy());
    /// assert!(Value::Object(ObjectId::new(0, 0)).is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Smi(n) => *n != 0,
            Value::Double(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Returns the `typeof` result for this value.
    ///
    /// Callable objects report `"object"` here; the owning context knows
    /// which objects are functions.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Smi(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}

/// String conversion following `String(value)` for primitives.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Integer-valued doubles display without decimal point
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Object(_) => write!(f, "[object Object]"),
        }
    }
}

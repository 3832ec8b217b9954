//! Owned UTF-16 strings with explicit length.

use crate::{BridgeError, BridgeResult};
use std::fmt;
use std::ptr;

/// UTF-16 buffer handed across the boundary.
///
/// The length is stored explicitly, never derived by scanning for a
/// terminator, so embedded NUL code units survive. The buffer is allocated by
/// the bridge and must be released by the bridge: through `Drop` on the Rust
/// side or through [`crate::ffi::bridge_free_native_string`] from the host.
#[repr(C)]
pub struct NativeString {
    string: *mut u16,
    length: u32,
}

impl NativeString {
    /// Copies UTF-16 code units into a new buffer.
    ///
    /// Fails when the length does not fit the 32-bit length field.
    pub fn from_utf16(units: &[u16]) -> BridgeResult<Self> {
        let length = u32::try_from(units.len()).map_err(|_| BridgeError::LimitExceeded {
            what: "string",
            got: units.len(),
            max: u32::MAX as usize,
        })?;
        let boxed: Box<[u16]> = units.into();
        Ok(Self {
            string: Box::into_raw(boxed) as *mut u16,
            length,
        })
    }

    /// Encodes a Rust string as UTF-16.
    pub fn from_utf8(s: &str) -> BridgeResult<Self> {
        let units: Vec<u16> = s.encode_utf16().collect();
        Self::from_utf16(&units)
    }

    /// The code units of this string.
    pub fn as_utf16(&self) -> &[u16] {
        if self.string.is_null() {
            return &[];
        }
        // SAFETY: a non-null `string` always points at `length` initialized
        // code units allocated by `from_utf16` (or handed over through
        // `from_raw`, whose caller guarantees the same).
        unsafe { std::slice::from_raw_parts(self.string, self.length as usize) }
    }

    /// Number of UTF-16 code units.
    pub fn len(&self) -> usize {
        self.length as usize
    }

    /// Returns true when the string holds no code units.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Converts to UTF-8, rejecting unpaired surrogates.
    pub fn to_rust_string(&self) -> BridgeResult<String> {
        String::from_utf16(self.as_utf16()).map_err(|_| BridgeError::InvalidUtf16)
    }

    /// Converts to UTF-8, replacing unpaired surrogates with U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(self.as_utf16())
    }

    /// Moves the string into a heap record whose address can cross the boundary.
    pub fn into_raw(self) -> *mut NativeString {
        Box::into_raw(Box::new(self))
    }

    /// Takes back ownership of a record produced by [`NativeString::into_raw`].
    ///
    /// # Safety
    ///
    /// `raw` must come from `into_raw` and must not be used afterwards.
    pub unsafe fn from_raw(raw: *mut NativeString) -> Self {
        // SAFETY: guaranteed by the caller.
        *unsafe { Box::from_raw(raw) }
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        if self.string.is_null() {
            return;
        }
        let slice = ptr::slice_from_raw_parts_mut(self.string, self.length as usize);
        // SAFETY: the buffer was produced by `Box::<[u16]>::into_raw` with
        // exactly this length and is released only here.
        drop(unsafe { Box::from_raw(slice) });
        self.string = ptr::null_mut();
    }
}

impl Clone for NativeString {
    fn clone(&self) -> Self {
        let boxed: Box<[u16]> = self.as_utf16().into();
        Self {
            string: Box::into_raw(boxed) as *mut u16,
            length: self.length,
        }
    }
}

impl PartialEq for NativeString {
    fn eq(&self, other: &Self) -> bool {
        self.as_utf16() == other.as_utf16()
    }
}

impl Eq for NativeString {}

impl fmt::Debug for NativeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeString")
            .field("value", &self.to_string_lossy())
            .field("length", &self.length)
            .finish()
    }
}

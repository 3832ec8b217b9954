//! C entry points the host runtime calls to allocate and release payloads.
//!
//! Buffers created by the bridge must be released by the bridge. These
//! functions are the host's way of doing so.

use crate::{NativeString, TaggedValue};

/// Releases the owned payload of a tagged value.
///
/// # Safety
///
/// `value` must point at a valid [`TaggedValue`] whose payload was produced by
/// this crate and not yet released. The record is reset to null afterwards, so
/// a second call is a no-op.
#[no_mangle]
pub unsafe extern "C" fn bridge_free_tagged_value(value: *mut TaggedValue) {
    if value.is_null() {
        return;
    }
    // SAFETY: the caller guarantees `value` is valid; the record is replaced
    // with null so its payload is taken once.
    let taken = unsafe { std::ptr::replace(value, TaggedValue::null()) };
    taken.free();
}

/// Releases a string record produced by the bridge.
///
/// # Safety
///
/// `string` must come from [`NativeString::into_raw`] and must not be used
/// afterwards.
#[no_mangle]
pub unsafe extern "C" fn bridge_free_native_string(string: *mut NativeString) {
    if string.is_null() {
        return;
    }
    // SAFETY: guaranteed by the caller.
    drop(unsafe { NativeString::from_raw(string) });
}

/// Copies `length` UTF-16 code units into a new bridge-owned string record.
///
/// Returns null when `units` is null with a non-zero length.
///
/// # Safety
///
/// `units` must point at `length` readable code units.
#[no_mangle]
pub unsafe extern "C" fn bridge_new_native_string(
    units: *const u16,
    length: u32,
) -> *mut NativeString {
    let slice: &[u16] = if length == 0 {
        &[]
    } else if units.is_null() {
        return std::ptr::null_mut();
    } else {
        // SAFETY: guaranteed by the caller.
        unsafe { std::slice::from_raw_parts(units, length as usize) }
    };
    match NativeString::from_utf16(slice) {
        Ok(string) => string.into_raw(),
        Err(error) => {
            log::error!("failed to allocate native string: {}", error);
            std::ptr::null_mut()
        }
    }
}

//! Dictionary conversion between native structs and plain script objects.

use crate::converter::FromScriptValue;
use crate::ScriptContext;
use core_types::{ErrorKind, ExceptionState, JsError, ObjectId, Value};

/// A native struct that converts to and from a plain script object.
///
/// Implementors describe their members once in each direction; the provided
/// methods handle object creation, nullish input and error reporting.
pub trait Dictionary: Default {
    /// Script-visible dictionary name, used in error messages.
    const NAME: &'static str;

    /// Whether any member is required. Such dictionaries reject
    /// `undefined` and `null`.
    const HAS_REQUIRED_MEMBERS: bool = false;

    /// Writes every present member onto `object`.
    fn fill_script_object_with_members(
        &self,
        ctx: &mut ScriptContext,
        object: ObjectId,
    ) -> Result<(), JsError>;

    /// Reads members from `object`. On failure the error is recorded in
    /// `exception_state` and `false` is returned.
    fn fill_members_from_script_object(
        &mut self,
        ctx: &mut ScriptContext,
        object: ObjectId,
        exception_state: &mut ExceptionState,
    ) -> bool;

    /// Builds a fresh script object holding the members.
    ///
    /// `None` when a member cannot be written; the partly filled object is
    /// left unreachable for the next collection.
    fn to_script_object(&self, ctx: &mut ScriptContext) -> Option<ObjectId> {
        let object = ctx.create_object();
        match self.fill_script_object_with_members(ctx, object) {
            Ok(()) => Some(object),
            Err(err) => {
                log::debug!("dropping half-filled {}: {}", Self::NAME, err);
                None
            }
        }
    }

    /// Reads a dictionary from a script value.
    ///
    /// `undefined` and `null` yield the defaults unless a member is
    /// required. Anything else that is not an object is a `TypeError`.
    /// Errors go to `exception_state` and produce `None`.
    fn from_script_object(
        ctx: &mut ScriptContext,
        value: &Value,
        exception_state: &mut ExceptionState,
    ) -> Option<Self> {
        let object = match value {
            Value::Object(id) => *id,
            v if v.is_nullish() && !Self::HAS_REQUIRED_MEMBERS => return Some(Self::default()),
            _ => {
                exception_state.throw_exception(
                    ErrorKind::TypeError,
                    format!(
                        "Failed to convert value to '{}': The provided value is not of type '{}'.",
                        Self::NAME,
                        Self::NAME
                    ),
                );
                return None;
            }
        };
        let mut dictionary = Self::default();
        dictionary
            .fill_members_from_script_object(ctx, object, exception_state)
            .then_some(dictionary)
    }
}

/// Reads `object[member]`, converting a present value.
///
/// `undefined` counts as absent.
pub fn get_member<T: FromScriptValue>(
    ctx: &mut ScriptContext,
    object: ObjectId,
    member: &str,
) -> Result<Option<T>, JsError> {
    let value = ctx.get_property(object, member)?;
    if matches!(value, Value::Undefined) {
        return Ok(None);
    }
    T::from_script_value(ctx, &value).map(Some)
}

/// Reads an optional member into `slot`, keeping the default when absent.
///
/// Returns false after recording the error in `exception_state`.
pub fn optional_member<T: FromScriptValue>(
    ctx: &mut ScriptContext,
    object: ObjectId,
    member: &str,
    slot: &mut T,
    exception_state: &mut ExceptionState,
) -> bool {
    match get_member(ctx, object, member) {
        Ok(Some(value)) => {
            *slot = value;
            true
        }
        Ok(None) => true,
        Err(err) => {
            exception_state.throw(err);
            false
        }
    }
}

/// Reads a required member.
///
/// A missing member throws a `TypeError` naming the member and the
/// dictionary. `None` after recording the error in `exception_state`.
pub fn required_member<T: FromScriptValue>(
    ctx: &mut ScriptContext,
    object: ObjectId,
    dictionary: &str,
    member: &str,
    exception_state: &mut ExceptionState,
) -> Option<T> {
    match get_member(ctx, object, member) {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            exception_state.throw_exception(
                ErrorKind::TypeError,
                format!(
                    "Failed to read the '{}' property from '{}': Required member is undefined.",
                    member, dictionary
                ),
            );
            None
        }
        Err(err) => {
            exception_state.throw(err);
            None
        }
    }
}

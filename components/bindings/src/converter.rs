//! Conversions between script values and native member types.

use crate::ScriptContext;
use core_types::{JsError, ObjectId, Value};

/// Converts a script value into a native type.
pub trait FromScriptValue: Sized {
    /// Converts `value`, throwing a script error when it does not fit.
    fn from_script_value(ctx: &mut ScriptContext, value: &Value) -> Result<Self, JsError>;
}

/// Converts a native value into a script value.
pub trait ToScriptValue {
    /// Produces the script value, allocating in `ctx` when needed.
    fn to_script_value(&self, ctx: &mut ScriptContext) -> Value;
}

/// `ToNumber` for values without user-defined conversions.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::Smi(n) => f64::from(*n),
        Value::Double(n) => *n,
        Value::String(s) => {
            let text = s.to_string_lossy();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                match trimmed {
                    "Infinity" | "+Infinity" => f64::INFINITY,
                    "-Infinity" => f64::NEG_INFINITY,
                    other => other.parse().unwrap_or(f64::NAN),
                }
            }
        }
        Value::Object(_) => f64::NAN,
    }
}

impl FromScriptValue for Value {
    fn from_script_value(_: &mut ScriptContext, value: &Value) -> Result<Self, JsError> {
        Ok(value.clone())
    }
}

impl FromScriptValue for bool {
    fn from_script_value(_: &mut ScriptContext, value: &Value) -> Result<Self, JsError> {
        Ok(value.is_truthy())
    }
}

impl FromScriptValue for f64 {
    fn from_script_value(_: &mut ScriptContext, value: &Value) -> Result<Self, JsError> {
        Ok(to_number(value))
    }
}

/// `unrestricted double` is plain `f64`; `double` rejects non-finite values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FiniteDouble(pub f64);

impl FromScriptValue for FiniteDouble {
    fn from_script_value(_: &mut ScriptContext, value: &Value) -> Result<Self, JsError> {
        let n = to_number(value);
        if n.is_finite() {
            Ok(FiniteDouble(n))
        } else {
            Err(JsError::type_error("The provided double value is non-finite."))
        }
    }
}

impl FromScriptValue for i32 {
    fn from_script_value(_: &mut ScriptContext, value: &Value) -> Result<Self, JsError> {
        let n = to_number(value);
        if !n.is_finite() {
            return Ok(0);
        }
        // ToInt32: truncate, then wrap modulo 2^32.
        let wrapped = n.trunc().rem_euclid(4_294_967_296.0);
        Ok(wrapped as u32 as i32)
    }
}

impl FromScriptValue for String {
    fn from_script_value(_: &mut ScriptContext, value: &Value) -> Result<Self, JsError> {
        Ok(value.to_string())
    }
}

impl FromScriptValue for ObjectId {
    fn from_script_value(_: &mut ScriptContext, value: &Value) -> Result<Self, JsError> {
        value
            .as_object()
            .ok_or_else(|| JsError::type_error("The provided value is not of type 'object'."))
    }
}

impl<T: FromScriptValue> FromScriptValue for Option<T> {
    fn from_script_value(ctx: &mut ScriptContext, value: &Value) -> Result<Self, JsError> {
        if value.is_nullish() {
            Ok(None)
        } else {
            T::from_script_value(ctx, value).map(Some)
        }
    }
}

impl ToScriptValue for Value {
    fn to_script_value(&self, _: &mut ScriptContext) -> Value {
        self.clone()
    }
}

impl ToScriptValue for bool {
    fn to_script_value(&self, _: &mut ScriptContext) -> Value {
        Value::Boolean(*self)
    }
}

impl ToScriptValue for f64 {
    fn to_script_value(&self, _: &mut ScriptContext) -> Value {
        Value::number(*self)
    }
}

impl ToScriptValue for FiniteDouble {
    fn to_script_value(&self, _: &mut ScriptContext) -> Value {
        Value::number(self.0)
    }
}

impl ToScriptValue for i32 {
    fn to_script_value(&self, _: &mut ScriptContext) -> Value {
        Value::Smi(*self)
    }
}

impl ToScriptValue for String {
    fn to_script_value(&self, _: &mut ScriptContext) -> Value {
        Value::string(self)
    }
}

impl ToScriptValue for ObjectId {
    fn to_script_value(&self, _: &mut ScriptContext) -> Value {
        Value::Object(*self)
    }
}

impl<T: ToScriptValue> ToScriptValue for Option<T> {
    fn to_script_value(&self, ctx: &mut ScriptContext) -> Value {
        match self {
            Some(inner) => inner.to_script_value(ctx),
            None => Value::Null,
        }
    }
}

impl<T: ToScriptValue> ToScriptValue for Vec<T> {
    fn to_script_value(&self, ctx: &mut ScriptContext) -> Value {
        let items = self.iter().map(|item| item.to_script_value(ctx)).collect();
        Value::Object(ctx.create_array(items))
    }
}

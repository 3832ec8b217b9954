//! Script values crossing the host boundary.
//!
//! [`to_tagged`] and [`from_tagged`] translate between [`Value`] and
//! [`TaggedValue`]. Objects have no single tagged form, so the object kind
//! picks one: arrays become lists, functions become function references,
//! wrappers are published as binding objects and everything else is sent
//! as JSON text.

use crate::collections::HostObject;
use crate::native_function::{create_function_ref, release_function_ref, resolve_function_ref};
use crate::object::{ObjectKind, Property};
use crate::wrapper_types::{BOUNDING_CLIENT_RECT, CANVAS_RENDERING_CONTEXT_2D};
use crate::{BindingResult, ScriptContext};
use core_types::{ExceptionState, JsError, JsString, ObjectId, Value};
use std::ffi::c_void;
use value_bridge::{BridgeError, NativeString, PointerKind, Tag, TaggedValue};

/// Encodes a script value for the host.
///
/// Wrappers gain a keep-alive hold that the host gives back through
/// [`ScriptContext::release_binding_object`]; functions gain a reference
/// released through [`crate::release_function_ref`].
pub fn to_tagged(ctx: &mut ScriptContext, value: &Value) -> BindingResult<TaggedValue> {
    let mut path = Vec::new();
    encode_value(ctx, value, &mut path)
}

fn encode_value(
    ctx: &mut ScriptContext,
    value: &Value,
    path: &mut Vec<ObjectId>,
) -> BindingResult<TaggedValue> {
    Ok(match value {
        Value::Undefined | Value::Null => TaggedValue::null(),
        Value::Boolean(b) => TaggedValue::from_bool(*b),
        Value::Smi(n) => TaggedValue::from_i64(i64::from(*n)),
        Value::Double(n) => TaggedValue::from_f64(*n),
        Value::String(s) => {
            check_limit("string", s.len(), ctx.options().max_string_length)?;
            TaggedValue::from_string(NativeString::from_utf16(s.as_code_units())?)
        }
        Value::Object(id) => encode_object(ctx, *id, path)?,
    })
}

fn encode_object(
    ctx: &mut ScriptContext,
    id: ObjectId,
    path: &mut Vec<ObjectId>,
) -> BindingResult<TaggedValue> {
    let object = ctx
        .object(id)
        .ok_or_else(|| JsError::reference_error(format!("object {} is no longer alive", id)))?;
    match object.kind() {
        ObjectKind::Array(elements) => {
            if path.contains(&id) {
                return Err(JsError::type_error("Cannot send a cyclic array to the host").into());
            }
            check_limit("list", elements.len() as usize, ctx.options().max_list_length)?;
            let items = elements.to_vec();
            path.push(id);
            let mut encoded = Vec::with_capacity(items.len());
            for item in &items {
                match encode_value(ctx, item, path) {
                    Ok(tagged) => encoded.push(tagged),
                    Err(err) => {
                        for tagged in encoded {
                            roll_back(ctx, tagged);
                        }
                        path.pop();
                        return Err(err);
                    }
                }
            }
            path.pop();
            Ok(TaggedValue::from_list(encoded))
        }
        ObjectKind::Function(_) => create_function_ref(ctx, id, false),
        ObjectKind::Wrapper(_) => {
            let address = ctx.register_binding_object(id)?;
            Ok(TaggedValue::from_pointer(address, PointerKind::BindingObject))
        }
        ObjectKind::Constructor(_) => Ok(TaggedValue::null()),
        ObjectKind::Ordinary => {
            let json = to_json(ctx, &Value::Object(id), &mut Vec::new())?
                .unwrap_or(serde_json::Value::Null);
            Ok(TaggedValue::from_json_text(json.to_string()))
        }
    }
}

/// Undoes what encoding `tagged` registered with the context, then frees it.
fn roll_back(ctx: &mut ScriptContext, tagged: TaggedValue) {
    match tagged.tag() {
        Ok(Tag::Function) => {
            if let Ok(address) = tagged.into_function() {
                release_function_ref(ctx, address);
            }
        }
        Ok(Tag::AsyncFunction) => {
            if let Ok(address) = tagged.into_async_function() {
                release_function_ref(ctx, address);
            }
        }
        Ok(Tag::Pointer) => {
            if let Ok((address, PointerKind::BindingObject)) = tagged.into_pointer() {
                ctx.release_binding_object(address);
            }
        }
        Ok(Tag::List) => {
            if let Ok(items) = tagged.into_list() {
                for item in items {
                    roll_back(ctx, item);
                }
            }
        }
        _ => tagged.free(),
    }
}

/// Serializes a value the way `JSON.stringify` would see it.
///
/// `None` marks values JSON omits (undefined and functions).
pub fn to_json(
    ctx: &mut ScriptContext,
    value: &Value,
    path: &mut Vec<ObjectId>,
) -> Result<Option<serde_json::Value>, JsError> {
    use serde_json::Value as Json;
    Ok(Some(match value {
        Value::Undefined => return Ok(None),
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Smi(n) => Json::from(*n),
        Value::Double(n) => json_number(*n),
        Value::String(s) => Json::String(s.to_string_lossy()),
        Value::Object(id) => {
            let id = *id;
            if path.contains(&id) {
                return Err(JsError::type_error("Converting circular structure to JSON"));
            }
            let Some(object) = ctx.object(id) else {
                return Ok(None);
            };
            match object.kind() {
                ObjectKind::Function(_) | ObjectKind::Constructor(_) => return Ok(None),
                ObjectKind::Array(elements) => {
                    let length = elements.len() as usize;
                    check_limit("list", length, ctx.options().max_list_length)
                        .map_err(|err| JsError::range_error(err.to_string()))?;
                    let items = elements.to_vec();
                    path.push(id);
                    let mut out = Vec::with_capacity(items.len());
                    for item in &items {
                        out.push(to_json(ctx, item, path)?.unwrap_or(Json::Null));
                    }
                    path.pop();
                    Json::Array(out)
                }
                ObjectKind::Ordinary | ObjectKind::Wrapper(_) => {
                    path.push(id);
                    let mut map = serde_json::Map::new();
                    for key in ctx.own_keys(id)? {
                        let member = ctx.get_property(id, &key)?;
                        if let Some(json) = to_json(ctx, &member, path)? {
                            map.insert(key, json);
                        }
                    }
                    path.pop();
                    Json::Object(map)
                }
            }
        }
    }))
}

fn json_number(n: f64) -> serde_json::Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE && !(n == 0.0 && n.is_sign_negative()) {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Decodes a host value, consuming it.
///
/// Owned payloads are released on every path, including errors.
pub fn from_tagged(ctx: &mut ScriptContext, tagged: TaggedValue) -> BindingResult<Value> {
    let tag = match tagged.tag() {
        Ok(tag) => tag,
        Err(err) => {
            tagged.free();
            return Err(err.into());
        }
    };
    Ok(match tag {
        Tag::Null => {
            tagged.free();
            Value::Null
        }
        Tag::Bool => Value::Boolean(tagged.into_bool()?),
        Tag::Int => Value::from_i64(tagged.into_i64()?),
        Tag::Float64 => Value::Double(tagged.into_f64()?),
        Tag::String => {
            let string = tagged.into_string()?;
            check_limit("string", string.len(), ctx.options().max_string_length)?;
            Value::String(JsString::from_utf16(string.as_utf16().to_vec()))
        }
        Tag::Json => {
            let text = tagged.into_json_text()?;
            let json: serde_json::Value =
                serde_json::from_str(&text).map_err(|e| BridgeError::Json(e.to_string()))?;
            from_json(ctx, &json)?
        }
        Tag::List => {
            let items = tagged.into_list_with_limit(ctx.options().max_list_length)?;
            let mut values = Vec::with_capacity(items.len());
            let mut items = items.into_iter();
            while let Some(item) = items.next() {
                match from_tagged(ctx, item) {
                    Ok(value) => values.push(value),
                    Err(err) => {
                        items.for_each(TaggedValue::free);
                        return Err(err);
                    }
                }
            }
            Value::Object(ctx.create_array(values))
        }
        Tag::Pointer => {
            let (address, kind) = tagged.into_pointer()?;
            from_pointer(ctx, address, kind)?
        }
        Tag::Function => Value::Object(resolve_function_ref(ctx, tagged.into_function()?)?),
        Tag::AsyncFunction => {
            Value::Object(resolve_function_ref(ctx, tagged.into_async_function()?)?)
        }
    })
}

fn from_pointer(
    ctx: &mut ScriptContext,
    address: *const c_void,
    kind: PointerKind,
) -> BindingResult<Value> {
    if address.is_null() {
        return Ok(Value::Null);
    }
    Ok(match kind {
        PointerKind::BindingObject => match ctx.binding_object(address) {
            Some(id) => Value::Object(id),
            None => {
                log::warn!("unknown binding object {:p}", address);
                Value::Null
            }
        },
        PointerKind::BoundingRect => {
            Value::Object(ctx.wrap_native(HostObject::new(&BOUNDING_CLIENT_RECT, address, kind))?)
        }
        PointerKind::RenderingContext2d => Value::Object(ctx.wrap_native(HostObject::new(
            &CANVAS_RENDERING_CONTEXT_2D,
            address,
            kind,
        ))?),
        PointerKind::NativeFunctionContext => Value::Object(resolve_function_ref(ctx, address)?),
        PointerKind::AsyncContext => return Err(BridgeError::UnsupportedPointerKind(kind).into()),
    })
}

/// Builds fresh script objects and arrays from parsed JSON.
pub fn from_json(ctx: &mut ScriptContext, json: &serde_json::Value) -> BindingResult<Value> {
    use serde_json::Value as Json;
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::from_i64(i),
            None => Value::number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::string(s),
        Json::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(from_json(ctx, item)?);
            }
            Value::Object(ctx.create_array(values))
        }
        Json::Object(map) => {
            let object = ctx.create_object();
            for (key, member) in map {
                let value = from_json(ctx, member)?;
                ctx.define_property(object, key, Property::Data(value))?;
            }
            Value::Object(object)
        }
    })
}

/// The pending exception as a host string, `"<Kind>: <message>"`.
pub fn stringify_exception(state: &ExceptionState) -> BindingResult<Option<NativeString>> {
    Ok(state
        .stringify()
        .map(|(message, _)| NativeString::from_utf8(&message))
        .transpose()?)
}

fn check_limit(what: &'static str, got: usize, max: usize) -> Result<(), BridgeError> {
    if got > max {
        return Err(BridgeError::LimitExceeded { what, got, max });
    }
    Ok(())
}

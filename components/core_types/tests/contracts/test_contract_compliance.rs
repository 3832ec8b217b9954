//! Contract compliance tests for core_types
//!
//! These tests pin the public surface other components depend on.

use core_types::{ErrorKind, ExceptionState, JsError, JsString, ObjectId, Value};

#[test]
fn test_value_variants_exist() {
    let values = [
        Value::Undefined,
        Value::Null,
        Value::Boolean(true),
        Value::Smi(1),
        Value::Double(1.5),
        Value::String(JsString::from("s")),
        Value::Object(ObjectId::new(0, 0)),
    ];
    assert_eq!(values.len(), 7);
}

#[test]
fn test_error_kinds_cover_exception_surface() {
    let kinds = [
        ErrorKind::TypeError,
        ErrorKind::InternalError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
    ];
    for kind in kinds {
        let mut state = ExceptionState::new();
        state.throw(JsError::new(kind, "m"));
        assert_eq!(state.exception().map(|e| e.kind), Some(kind));
    }
}

#[test]
fn test_object_id_accessors() {
    let id = ObjectId::new(4, 9);
    assert_eq!(id.index(), 4);
    assert_eq!(id.generation(), 9);
    assert_eq!(id.to_string(), "#4v9");
}

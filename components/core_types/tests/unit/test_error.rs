//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_error_kind_display_matches_constructor_name() {
        assert_eq!(ErrorKind::TypeError.to_string(), "TypeError");
        assert_eq!(ErrorKind::SyntaxError.to_string(), "SyntaxError");
    }

    #[test]
    fn test_error_kind_is_copy() {
        let kind = ErrorKind::ReferenceError;
        let copy = kind;
        assert_eq!(kind, copy);
    }
}

#[cfg(test)]
mod js_error_tests {
    use super::*;

    #[test]
    fn test_constructors_select_kind() {
        assert_eq!(JsError::type_error("x").kind, ErrorKind::TypeError);
        assert_eq!(JsError::range_error("x").kind, ErrorKind::RangeError);
        assert_eq!(JsError::reference_error("x").kind, ErrorKind::ReferenceError);
        assert_eq!(JsError::syntax_error("x").kind, ErrorKind::SyntaxError);
        assert_eq!(JsError::internal_error("x").kind, ErrorKind::InternalError);
    }

    #[test]
    fn test_display_format() {
        let error = JsError::new(ErrorKind::InternalError, "context disposed");
        assert_eq!(format!("{}", error), "InternalError: context disposed");
    }

    #[test]
    fn test_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&JsError::type_error("boxed"));
    }
}

//! Error types for bridge operations

use thiserror::Error;

use crate::host::ElementType;
use crate::value::ValueKind;

/// Result type alias
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failure reported by a bridge operation.
///
/// Two classes share this enum. User-triggerable errors describe misuse of
/// the surface (wrong source kind, bad key, bad index) and are surfaced
/// immediately with no retry and no partial result. Internal errors
/// ([`BridgeError::RegistryMiss`], [`BridgeError::Internal`]) report invariant
/// violations inside the bridge itself; [`BridgeError::is_internal`]
/// distinguishes them so hosts can escalate instead of blaming the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BridgeError {
    /// Wrong source tag for the requested conversion or operation
    #[error("type mismatch: value (tag {found}) cannot be used as {requested}")]
    TypeMismatch { found: u8, requested: &'static str },

    /// Key cell of a kind the indexed value does not accept
    #[error("invalid key: expected a {expected} key, got tag {found}")]
    InvalidKeyType { expected: &'static str, found: u8 },

    /// Key cell carried no string payload
    #[error("invalid key: null key value")]
    NullKeyValue,

    /// The global namespace is name-addressed only
    #[error("globals cannot be indexed with non-string keys (tag {found})")]
    UnsupportedGlobalKey { found: u8 },

    /// Array index outside `[0, len)`
    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// Array translation requested with a non-array target descriptor
    #[error("not an array type: {requested}")]
    NotAnArrayType { requested: String },

    /// Array translation requested with a missing component descriptor
    #[error("array component type is null")]
    NullComponentType,

    /// Host array element of the wrong kind for its descriptor
    #[error("host array of {expected} cannot store a {found} element")]
    ElementTypeMismatch { expected: String, found: &'static str },

    /// Called a value that is not a function
    #[error("cannot call value as a function (tag {found})")]
    NotCallable { found: u8 },

    /// Called a function kind the bridge does not marshal
    #[error("cannot call stub ({kind})")]
    UnimplementedCallKind { kind: &'static str },

    /// Engine configuration could not be loaded
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A registry handle no longer resolves to a live function
    #[error("internal error: no registry entry for function handle {handle}")]
    RegistryMiss { handle: i64 },

    /// Invariant violation inside the bridge
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl BridgeError {
    pub fn type_mismatch(found: ValueKind, requested: &'static str) -> Self {
        Self::TypeMismatch {
            found: found.tag(),
            requested,
        }
    }

    pub fn invalid_key(expected: &'static str, found: ValueKind) -> Self {
        Self::InvalidKeyType {
            expected,
            found: found.tag(),
        }
    }

    pub fn unsupported_global_key(found: ValueKind) -> Self {
        Self::UnsupportedGlobalKey { found: found.tag() }
    }

    pub fn index_out_of_range(index: i64, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    pub fn not_an_array_type(requested: &ElementType) -> Self {
        Self::NotAnArrayType {
            requested: requested.to_string(),
        }
    }

    pub fn element_type_mismatch(expected: &ElementType, found: &'static str) -> Self {
        Self::ElementTypeMismatch {
            expected: expected.to_string(),
            found,
        }
    }

    pub fn not_callable(found: ValueKind) -> Self {
        Self::NotCallable { found: found.tag() }
    }

    pub fn unimplemented_call(kind: &'static str) -> Self {
        Self::UnimplementedCallKind { kind }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn registry_miss(handle: i64) -> Self {
        Self::RegistryMiss { handle }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for invariant violations that indicate a bridge bug rather than
    /// caller misuse
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::RegistryMiss { .. } | Self::Internal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_carries_tag() {
        let err = BridgeError::type_mismatch(ValueKind::String, "i64");
        assert_eq!(
            err,
            BridgeError::TypeMismatch {
                found: 4,
                requested: "i64"
            }
        );
        let display = format!("{err}");
        assert!(display.contains("tag 4"));
        assert!(display.contains("i64"));
    }

    #[test]
    fn test_invalid_key_message() {
        let err = BridgeError::invalid_key("string", ValueKind::Integral);
        assert_eq!(
            format!("{err}"),
            "invalid key: expected a string key, got tag 2"
        );
    }

    #[test]
    fn test_unsupported_global_key_message() {
        let err = BridgeError::unsupported_global_key(ValueKind::Floating);
        assert!(format!("{err}").contains("non-string keys (tag 3)"));
    }

    #[test]
    fn test_index_out_of_range_message() {
        let err = BridgeError::index_out_of_range(-1, 3);
        assert_eq!(format!("{err}"), "index -1 out of range for array of length 3");
    }

    #[test]
    fn test_not_an_array_type_message() {
        let err = BridgeError::not_an_array_type(&ElementType::I32);
        assert_eq!(format!("{err}"), "not an array type: i32");
    }

    #[test]
    fn test_not_callable_message() {
        let err = BridgeError::not_callable(ValueKind::Array);
        assert_eq!(format!("{err}"), "cannot call value as a function (tag 5)");
    }

    #[test]
    fn test_unimplemented_call_message() {
        let err = BridgeError::unimplemented_call("lambda function");
        assert_eq!(format!("{err}"), "cannot call stub (lambda function)");
    }

    #[test]
    fn test_registry_miss_is_internal() {
        let err = BridgeError::registry_miss(9);
        assert!(err.is_internal());
        assert!(format!("{err}").starts_with("internal error:"));
    }

    #[test]
    fn test_internal_message() {
        let err = BridgeError::internal("function is a shared value");
        assert!(err.is_internal());
        assert_eq!(format!("{err}"), "internal error: function is a shared value");
    }

    #[test]
    fn test_user_errors_are_not_internal() {
        let errors = vec![
            BridgeError::type_mismatch(ValueKind::Null, "bool"),
            BridgeError::invalid_key("numeric", ValueKind::Boolean),
            BridgeError::unsupported_global_key(ValueKind::Array),
            BridgeError::index_out_of_range(7, 2),
            BridgeError::not_callable(ValueKind::HostObject),
            BridgeError::unimplemented_call("reflect function"),
            BridgeError::NullKeyValue,
            BridgeError::NullComponentType,
        ];
        for err in errors {
            assert!(!err.is_internal());
        }
    }

    #[test]
    fn test_error_is_std_error() {
        let err = BridgeError::internal("x");
        let _: &dyn std::error::Error = &err;
    }
}

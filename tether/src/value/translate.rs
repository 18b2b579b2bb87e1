//! Type queries and scalar translation
//!
//! Every `translate_X` has a side-effect-free `can_translate_X` twin that
//! agrees exactly with its success or failure. Numeric conversions are
//! truncating casts with no overflow signal: integral narrowing wraps per
//! two's complement, floating sources truncate toward zero (saturating at
//! the target bounds). Callers rely on the silent behavior.

use super::{Cell, Payload, ScriptValue};
use crate::error::{BridgeError, Result};
use crate::host::HostRef;

impl Cell {
    fn numeric(&self) -> bool {
        matches!(self.payload, Payload::Integral(_) | Payload::Floating(_))
    }

    pub(crate) fn to_bool(&self) -> Result<bool> {
        match &self.payload {
            Payload::Boolean(v) => Ok(*v),
            _ => Err(BridgeError::type_mismatch(self.kind(), "bool")),
        }
    }

    pub(crate) fn to_i8(&self) -> Result<i8> {
        match &self.payload {
            Payload::Integral(i) => Ok(*i as i8),
            Payload::Floating(d) => Ok(*d as i8),
            _ => Err(BridgeError::type_mismatch(self.kind(), "i8")),
        }
    }

    pub(crate) fn to_i16(&self) -> Result<i16> {
        match &self.payload {
            Payload::Integral(i) => Ok(*i as i16),
            Payload::Floating(d) => Ok(*d as i16),
            _ => Err(BridgeError::type_mismatch(self.kind(), "i16")),
        }
    }

    pub(crate) fn to_i32(&self) -> Result<i32> {
        match &self.payload {
            Payload::Integral(i) => Ok(*i as i32),
            Payload::Floating(d) => Ok(*d as i32),
            _ => Err(BridgeError::type_mismatch(self.kind(), "i32")),
        }
    }

    pub(crate) fn to_i64(&self) -> Result<i64> {
        match &self.payload {
            Payload::Integral(i) => Ok(*i),
            Payload::Floating(d) => Ok(*d as i64),
            _ => Err(BridgeError::type_mismatch(self.kind(), "i64")),
        }
    }

    pub(crate) fn to_f32(&self) -> Result<f32> {
        match &self.payload {
            Payload::Integral(i) => Ok(*i as f32),
            Payload::Floating(d) => Ok(*d as f32),
            _ => Err(BridgeError::type_mismatch(self.kind(), "f32")),
        }
    }

    pub(crate) fn to_f64(&self) -> Result<f64> {
        match &self.payload {
            Payload::Integral(i) => Ok(*i as f64),
            Payload::Floating(d) => Ok(*d),
            _ => Err(BridgeError::type_mismatch(self.kind(), "f64")),
        }
    }

    pub(crate) fn to_text(&self) -> Result<String> {
        match &self.payload {
            Payload::Str(s) => Ok(s.clone()),
            _ => Err(BridgeError::type_mismatch(self.kind(), "string")),
        }
    }

    pub(crate) fn to_object(&self) -> Result<HostRef> {
        match &self.payload {
            Payload::HostObject(o) => Ok(o.clone()),
            _ => Err(BridgeError::type_mismatch(self.kind(), "object")),
        }
    }
}

impl ScriptValue {
    pub fn can_translate_bool(&self) -> bool {
        matches!(self.cell().payload, Payload::Boolean(_))
    }

    /// Boolean payload; anything else is a type mismatch
    pub fn translate_bool(&self) -> Result<bool> {
        self.cell().to_bool()
    }

    pub fn can_translate_i8(&self) -> bool {
        self.cell().numeric()
    }

    pub fn translate_i8(&self) -> Result<i8> {
        self.cell().to_i8()
    }

    pub fn can_translate_i16(&self) -> bool {
        self.cell().numeric()
    }

    pub fn translate_i16(&self) -> Result<i16> {
        self.cell().to_i16()
    }

    pub fn can_translate_i32(&self) -> bool {
        self.cell().numeric()
    }

    pub fn translate_i32(&self) -> Result<i32> {
        self.cell().to_i32()
    }

    pub fn can_translate_i64(&self) -> bool {
        self.cell().numeric()
    }

    /// Integral payload as-is, floating payload truncated toward zero
    pub fn translate_i64(&self) -> Result<i64> {
        self.cell().to_i64()
    }

    pub fn can_translate_f32(&self) -> bool {
        self.cell().numeric()
    }

    pub fn translate_f32(&self) -> Result<f32> {
        self.cell().to_f32()
    }

    pub fn can_translate_f64(&self) -> bool {
        self.cell().numeric()
    }

    pub fn translate_f64(&self) -> Result<f64> {
        self.cell().to_f64()
    }

    pub fn can_translate_string(&self) -> bool {
        matches!(self.cell().payload, Payload::Str(_))
    }

    /// Immutable UTF-8 copy of a string payload
    pub fn translate_string(&self) -> Result<String> {
        self.cell().to_text()
    }

    pub fn can_translate_object(&self) -> bool {
        matches!(self.cell().payload, Payload::HostObject(_))
    }

    /// The stored host reference, no copy of the referent
    pub fn translate_object(&self) -> Result<HostRef> {
        self.cell().to_object()
    }
}

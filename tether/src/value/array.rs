//! Composite translation: array cells into host arrays
//!
//! Translation is recursive; the requested component type may itself be an
//! array type, which yields multi-dimensional host arrays. Each element is
//! moved into its slot as soon as it is produced, so no per-element temporary
//! outlives its loop iteration. That bound matters: a translation of a large
//! array must not accumulate host references proportional to its length.
//! Any element failure aborts the whole translation and nothing partial is
//! returned.

use super::{Cell, Payload, ScriptValue};
use crate::error::{BridgeError, Result};
use crate::host::{ElementType, HostArray, HostValue};

// Grow the native stack when nested translations recurse deeply
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

impl ScriptValue {
    pub fn can_translate_array(&self) -> bool {
        matches!(self.cell().payload, Payload::Array(_))
    }

    /// Translate an array cell into a host array described by `target`.
    ///
    /// `target` must be an array descriptor; its component type drives the
    /// per-element dispatch.
    pub fn translate_array(&self, target: &ElementType) -> Result<HostArray> {
        translate_array_cell(self.cell(), target)
    }
}

pub(crate) fn translate_array_cell(cell: &Cell, target: &ElementType) -> Result<HostArray> {
    let ElementType::Array(component) = target else {
        return Err(BridgeError::not_an_array_type(target));
    };
    let Payload::Array(elements) = &cell.payload else {
        return Err(BridgeError::type_mismatch(cell.kind(), "array"));
    };

    let mut out = HostArray::new((**component).clone(), elements.len());
    for (index, element) in elements.iter().enumerate() {
        let value = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            translate_element(element, component)
        })?;
        out.set(index, value)?;
    }
    Ok(out)
}

/// Translate one element cell to the requested component type
fn translate_element(cell: &Cell, target: &ElementType) -> Result<HostValue> {
    if matches!(cell.payload, Payload::Null) && target.is_reference() {
        return Ok(HostValue::Null);
    }
    match target {
        ElementType::Bool => cell.to_bool().map(HostValue::Bool),
        ElementType::I8 => cell.to_i8().map(HostValue::I8),
        ElementType::I16 => cell.to_i16().map(HostValue::I16),
        ElementType::I32 => cell.to_i32().map(HostValue::I32),
        ElementType::I64 => cell.to_i64().map(HostValue::I64),
        ElementType::F32 => cell.to_f32().map(HostValue::F32),
        ElementType::F64 => cell.to_f64().map(HostValue::F64),
        ElementType::Str => cell.to_text().map(HostValue::Str),
        ElementType::Object => cell.to_object().map(HostValue::Object),
        ElementType::Array(_) => translate_array_cell(cell, target).map(HostValue::Array),
    }
}

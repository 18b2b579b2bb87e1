//! Indexing: the global namespace bridge and array element access
//!
//! Globals are name-addressed only; numeric and table keys are rejected
//! there even though ordinary arrays index numerically. Both global
//! operations move values through the engine stack and leave it exactly as
//! deep as they found it.

use tracing::debug;

use super::{Payload, ScriptValue};
use crate::engine::{Instance, InstanceRef};
use crate::error::{BridgeError, Result};

impl ScriptValue {
    fn bound_instance(&self, what: &'static str) -> Result<InstanceRef> {
        self.cell().upgrade_instance().ok_or_else(|| {
            BridgeError::internal(format!(
                "{what} value is not associated with an engine instance"
            ))
        })
    }

    /// Bind `value` under `key` in the global namespace.
    ///
    /// Only valid on a globals handle with a string key. The value is pushed
    /// through its stack encoding and popped into the binding; net stack
    /// effect is zero.
    pub fn set(&self, key: &ScriptValue, value: &ScriptValue) -> Result<()> {
        match self.cell().payload {
            Payload::Globals => {
                let inst = self.bound_instance("globals")?;
                let Payload::Str(name) = &key.cell().payload else {
                    return Err(BridgeError::invalid_key("string", key.kind()));
                };
                Instance::push_cell(&inst, value.cell())?;
                inst.borrow_mut().bind_global_from_stack(name)?;
                debug!(name = %name, kind = %value.kind(), "set global");
                Ok(())
            }
            _ => Err(BridgeError::type_mismatch(self.kind(), "globals")),
        }
    }

    /// Index this value by `key`.
    ///
    /// Arrays accept numeric keys in `[0, len)` and return a copy of the
    /// element. A globals handle accepts string keys only, reads the named
    /// global onto the stack and drains it into a new bound value; unbound
    /// names read as null. Everything else is not indexable.
    pub fn get(&self, key: &ScriptValue) -> Result<ScriptValue> {
        match &self.cell().payload {
            Payload::Array(elements) => {
                let index = match &key.cell().payload {
                    Payload::Integral(i) => *i,
                    Payload::Floating(d) => *d as i64,
                    _ => return Err(BridgeError::invalid_key("numeric", key.kind())),
                };
                if index < 0 || index as usize >= elements.len() {
                    return Err(BridgeError::index_out_of_range(index, elements.len()));
                }
                Ok(ScriptValue::from_cell(elements[index as usize].clone()))
            }
            Payload::Globals => {
                let inst = self.bound_instance("globals")?;
                let Payload::Str(name) = &key.cell().payload else {
                    return Err(BridgeError::unsupported_global_key(key.kind()));
                };
                inst.borrow_mut().push_global(name)?;
                let value = Instance::pop_cell(&inst)?;
                debug!(name = %name, kind = %value.kind(), "indexed global");
                Ok(value)
            }
            _ => Err(BridgeError::type_mismatch(self.kind(), "an indexable value")),
        }
    }
}

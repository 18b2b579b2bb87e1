//! Call marshaling: invoking engine function values from the host
//!
//! A function cell holds a registry handle, not the function itself; the
//! live function stays in its instance's registry table so it outlives the
//! stack frame that produced it. Calls push the function and arguments,
//! invoke, and drain exactly one result. Whatever happens, the stack ends at
//! the depth it started; failure paths truncate back to the recorded entry
//! depth.

use tracing::debug;

use super::{Payload, ScriptValue};
use crate::engine::{Instance, InstanceRef};
use crate::error::{BridgeError, Result};

impl ScriptValue {
    /// Invoke this function value with no arguments
    pub fn call(&self) -> Result<ScriptValue> {
        self.call_with(&[])
    }

    /// Invoke this function value with arguments pushed left-to-right.
    ///
    /// Null argument cells are pushed as nil. Placeholder function kinds
    /// fail fast without touching the stack, as does any non-function value.
    /// A function with no bound instance is a shared value and cannot be
    /// called at all.
    pub fn call_with(&self, args: &[ScriptValue]) -> Result<ScriptValue> {
        match self.cell().payload {
            Payload::HostLambda(_) => Err(BridgeError::unimplemented_call("lambda function")),
            Payload::HostReflect(_) => Err(BridgeError::unimplemented_call("reflect function")),
            Payload::Function(handle) => {
                let Some(inst) = self.cell().upgrade_instance() else {
                    return Err(BridgeError::internal("function is a shared value"));
                };
                let entry_depth = inst.borrow().depth();
                let result = dispatch(&inst, handle, args);
                if result.is_err() {
                    // leave the stack exactly as deep as we found it
                    inst.borrow_mut().truncate(entry_depth);
                }
                result
            }
            _ => Err(BridgeError::not_callable(self.kind())),
        }
    }
}

fn dispatch(inst: &InstanceRef, handle: i64, args: &[ScriptValue]) -> Result<ScriptValue> {
    let func = inst.borrow().registry_lookup(handle)?;
    inst.borrow_mut().push(func)?;
    for arg in args {
        Instance::push_cell(inst, arg.cell())?;
    }
    debug!(handle, argc = args.len(), "calling engine function");
    let result = Instance::call_and_collect(inst, args.len())?;
    debug!(handle, kind = %result.kind(), "call returned");
    Ok(result)
}

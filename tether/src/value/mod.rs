//! The tagged value cell and its host-side wrapper
//!
//! Every value crossing the host/engine boundary lives in a [`Cell`]: a
//! tagged record holding exactly one payload variant, plus an optional
//! non-owning back-reference to the engine instance the value was drained
//! from. Host code never touches cells directly; it holds a [`ScriptValue`],
//! the owning wrapper. Dropping the wrapper releases the cell payload
//! (recursively for arrays) and never the instance or any registry entry.

mod array;
mod call;
mod index;
mod translate;

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use crate::engine::{Instance, InstanceRef};
use crate::host::HostRef;

pub(crate) type InstanceWeak = Weak<RefCell<Instance>>;

/// Tag identifying what a value holds.
///
/// The numeric tags are stable and appear verbatim in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null = 0,
    Boolean = 1,
    Integral = 2,
    Floating = 3,
    String = 4,
    Array = 5,
    HostObject = 6,
    /// Live engine function, addressed through the function registry
    Function = 7,
    /// Host lambda placeholder; not callable through the bridge
    HostLambda = 8,
    /// Host reflected-method placeholder; not callable through the bridge
    HostReflect = 9,
    /// Handle on one instance's global namespace
    Globals = 10,
}

impl ValueKind {
    /// Stable numeric tag, used in error messages
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// True for every callable kind, including the host-side placeholders
    pub fn is_function(self) -> bool {
        matches!(
            self,
            ValueKind::Function | ValueKind::HostLambda | ValueKind::HostReflect
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integral => "integral",
            ValueKind::Floating => "floating",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::HostObject => "host object",
            ValueKind::Function => "function",
            ValueKind::HostLambda => "lambda function",
            ValueKind::HostReflect => "reflect function",
            ValueKind::Globals => "globals",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Payload of one cell. Exactly one variant is valid per [`ValueKind`];
/// the pairing is enforced by construction.
#[derive(Clone)]
pub(crate) enum Payload {
    Null,
    Boolean(bool),
    Integral(i64),
    Floating(f64),
    Str(String),
    /// Elements are full cells; arrays are heterogeneous by construction
    Array(Vec<Cell>),
    HostObject(HostRef),
    /// 1-based handle into the owning instance's function registry
    Function(i64),
    HostLambda(HostRef),
    HostReflect(HostRef),
    Globals,
}

/// One bridged value: payload plus an optional instance back-reference.
///
/// The back-reference is non-owning. A cell with `instance: None` is a
/// shared (detached) value; it can be copied and translated but not called
/// or indexed against live engine state.
#[derive(Clone)]
pub(crate) struct Cell {
    pub(crate) payload: Payload,
    pub(crate) instance: Option<InstanceWeak>,
}

impl Cell {
    pub(crate) fn shared(payload: Payload) -> Cell {
        Cell {
            payload,
            instance: None,
        }
    }

    pub(crate) fn bound(payload: Payload, instance: InstanceWeak) -> Cell {
        Cell {
            payload,
            instance: Some(instance),
        }
    }

    pub(crate) fn kind(&self) -> ValueKind {
        match self.payload {
            Payload::Null => ValueKind::Null,
            Payload::Boolean(_) => ValueKind::Boolean,
            Payload::Integral(_) => ValueKind::Integral,
            Payload::Floating(_) => ValueKind::Floating,
            Payload::Str(_) => ValueKind::String,
            Payload::Array(_) => ValueKind::Array,
            Payload::HostObject(_) => ValueKind::HostObject,
            Payload::Function(_) => ValueKind::Function,
            Payload::HostLambda(_) => ValueKind::HostLambda,
            Payload::HostReflect(_) => ValueKind::HostReflect,
            Payload::Globals => ValueKind::Globals,
        }
    }

    /// Live instance this cell is bound to, if the back-reference still holds
    pub(crate) fn upgrade_instance(&self) -> Option<InstanceRef> {
        self.instance.as_ref().and_then(Weak::upgrade)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Null => write!(f, "Null"),
            Payload::Boolean(v) => write!(f, "Boolean({v})"),
            Payload::Integral(v) => write!(f, "Integral({v})"),
            Payload::Floating(v) => write!(f, "Floating({v})"),
            Payload::Str(v) => write!(f, "String({v:?})"),
            Payload::Array(v) => write!(f, "Array({v:?})"),
            Payload::HostObject(_) => write!(f, "HostObject(..)"),
            Payload::Function(h) => write!(f, "Function(#{h})"),
            Payload::HostLambda(_) => write!(f, "HostLambda(..)"),
            Payload::HostReflect(_) => write!(f, "HostReflect(..)"),
            Payload::Globals => write!(f, "Globals"),
        }
    }
}

/// Host-managed wrapper owning exactly one [`Cell`].
///
/// Constructed either shared (detached, via the constructors below) or bound
/// to an instance (by draining the engine stack, see
/// [`Instance::pop_cell`]). Wrapping and unwrapping a cell is O(1) and
/// allocation-free.
pub struct ScriptValue {
    cell: Cell,
}

impl ScriptValue {
    /// New shared null value
    pub fn null() -> ScriptValue {
        ScriptValue::from_cell(Cell::shared(Payload::Null))
    }

    /// New shared boolean value
    pub fn boolean(value: bool) -> ScriptValue {
        ScriptValue::from_cell(Cell::shared(Payload::Boolean(value)))
    }

    /// New shared integral value
    pub fn integral(value: i64) -> ScriptValue {
        ScriptValue::from_cell(Cell::shared(Payload::Integral(value)))
    }

    /// New shared floating value
    pub fn floating(value: f64) -> ScriptValue {
        ScriptValue::from_cell(Cell::shared(Payload::Floating(value)))
    }

    /// New shared string value (owned UTF-8 copy)
    pub fn string(value: impl Into<String>) -> ScriptValue {
        ScriptValue::from_cell(Cell::shared(Payload::Str(value.into())))
    }

    /// New shared array value taking ownership of the element cells
    pub fn array(elements: Vec<ScriptValue>) -> ScriptValue {
        let cells = elements.into_iter().map(ScriptValue::into_cell).collect();
        ScriptValue::from_cell(Cell::shared(Payload::Array(cells)))
    }

    /// New shared reference to a host-managed object
    pub fn object(object: HostRef) -> ScriptValue {
        ScriptValue::from_cell(Cell::shared(Payload::HostObject(object)))
    }

    /// New host lambda placeholder; carries the host function but is not
    /// callable through the bridge
    pub fn host_lambda(function: HostRef) -> ScriptValue {
        ScriptValue::from_cell(Cell::shared(Payload::HostLambda(function)))
    }

    /// New host reflected-method placeholder; not callable through the bridge
    pub fn host_reflect(function: HostRef) -> ScriptValue {
        ScriptValue::from_cell(Cell::shared(Payload::HostReflect(function)))
    }

    pub(crate) fn from_cell(cell: Cell) -> ScriptValue {
        ScriptValue { cell }
    }

    pub(crate) fn cell(&self) -> &Cell {
        &self.cell
    }

    pub(crate) fn into_cell(self) -> Cell {
        self.cell
    }

    pub fn kind(&self) -> ValueKind {
        self.cell.kind()
    }

    pub fn is_null(&self) -> bool {
        self.kind() == ValueKind::Null
    }

    /// True for every callable kind, including host-side placeholders
    pub fn is_function(&self) -> bool {
        self.kind().is_function()
    }

    /// True when the value is bound to a live engine instance
    pub fn is_bound(&self) -> bool {
        self.cell.upgrade_instance().is_some()
    }

    /// Duplicate this value: shallow tag, deep payload.
    ///
    /// Scalars are value-copied. Array payloads are duplicated recursively
    /// into new backing storage, so mutating the copy never affects the
    /// original. Host object and placeholder payloads copy the reference,
    /// not the referent; function payloads copy the handle. The instance
    /// back-reference is carried over.
    pub fn copy(&self) -> ScriptValue {
        ScriptValue::from_cell(self.cell.clone())
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptValue({:?})", self.cell)
    }
}

//! The embedded interpreter instance
//!
//! One [`Instance`] owns an evaluation stack, a global namespace, and the
//! storage behind the function registry. The bridge talks to it through a
//! narrow interface: cells are pushed onto the stack ([`Instance::push_cell`]),
//! drained off it into bound cells ([`Instance::pop_cell`]), and functions are
//! invoked over it ([`Instance::call_and_collect`]). Every one of those
//! operations leaves the stack exactly as deep as it found it; the
//! [`Instance::depth`] / [`Instance::truncate`] pair lets error paths restore
//! balance when a sequence is abandoned halfway.
//!
//! Instances are single-threaded. Callers running several instances from
//! several threads serialize access per instance themselves.

pub mod config;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{BridgeError, Result};
use crate::host::HostRef;
use crate::value::{Cell, Payload, ScriptValue};

use self::config::EngineConfig;

/// Shared reference to an interpreter instance
pub type InstanceRef = Rc<RefCell<Instance>>;

/// Native function signature. The instance reference lets a function
/// re-enter the bridge (construct values, touch globals, call further
/// functions) while it runs.
pub type NativeFn = dyn Fn(&InstanceRef, &[ScriptVal]) -> Result<ScriptVal>;

/// Interpreter function value
#[derive(Clone)]
pub struct ScriptFn {
    f: Rc<NativeFn>,
}

impl ScriptFn {
    pub fn new(f: impl Fn(&InstanceRef, &[ScriptVal]) -> Result<ScriptVal> + 'static) -> ScriptFn {
        ScriptFn { f: Rc::new(f) }
    }

    pub fn invoke(&self, inst: &InstanceRef, args: &[ScriptVal]) -> Result<ScriptVal> {
        (self.f)(inst, args)
    }
}

impl fmt::Debug for ScriptFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptFn(..)")
    }
}

/// Interpreter-native value
#[derive(Clone)]
pub enum ScriptVal {
    Nil,
    Bool(bool),
    Int(i64),
    Num(f64),
    Str(String),
    /// Table used as an array; shared, like every table value
    Table(Rc<RefCell<Vec<ScriptVal>>>),
    Func(ScriptFn),
    /// Host object carried through the interpreter untouched
    Opaque(HostRef),
}

impl ScriptVal {
    /// Build a table value from plain elements
    pub fn table(elements: Vec<ScriptVal>) -> ScriptVal {
        ScriptVal::Table(Rc::new(RefCell::new(elements)))
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ScriptVal::Nil => "nil",
            ScriptVal::Bool(_) => "bool",
            ScriptVal::Int(_) => "int",
            ScriptVal::Num(_) => "num",
            ScriptVal::Str(_) => "str",
            ScriptVal::Table(_) => "table",
            ScriptVal::Func(_) => "function",
            ScriptVal::Opaque(_) => "opaque",
        }
    }
}

impl fmt::Debug for ScriptVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptVal::Nil => write!(f, "Nil"),
            ScriptVal::Bool(v) => write!(f, "Bool({v})"),
            ScriptVal::Int(v) => write!(f, "Int({v})"),
            ScriptVal::Num(v) => write!(f, "Num({v})"),
            ScriptVal::Str(v) => write!(f, "Str({v:?})"),
            ScriptVal::Table(v) => write!(f, "Table({:?})", v.borrow()),
            ScriptVal::Func(_) => write!(f, "Func(..)"),
            ScriptVal::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

/// One interpreter instance
pub struct Instance {
    /// Global namespace, name-addressed
    globals: HashMap<String, ScriptVal>,
    /// Evaluation stack
    stack: Vec<ScriptVal>,
    config: EngineConfig,
}

impl Instance {
    /// New instance with default configuration
    pub fn new() -> InstanceRef {
        Instance::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> InstanceRef {
        Rc::new(RefCell::new(Instance {
            globals: HashMap::new(),
            stack: Vec::new(),
            config,
        }))
    }

    /// The special value representing this instance's global namespace
    pub fn globals(inst: &InstanceRef) -> ScriptValue {
        ScriptValue::from_cell(Cell::bound(Payload::Globals, Rc::downgrade(inst)))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- raw stack discipline ----

    /// Current stack depth
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Drop stack values above `depth`. Used by error paths to restore the
    /// depth recorded on entry.
    pub fn truncate(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }

    pub fn push(&mut self, value: ScriptVal) -> Result<()> {
        if self.stack.len() >= self.config.max_stack_depth {
            return Err(BridgeError::internal("evaluation stack overflow"));
        }
        self.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<ScriptVal> {
        self.stack
            .pop()
            .ok_or_else(|| BridgeError::internal("evaluation stack underflow"))
    }

    // ---- globals ----

    /// Bind a global directly, outside the stack protocol. Used when setting
    /// up an instance before any script runs.
    pub fn set_global(&mut self, name: impl Into<String>, value: ScriptVal) {
        self.globals.insert(name.into(), value);
    }

    /// Read a global directly; `None` when unbound
    pub fn global(&self, name: &str) -> Option<ScriptVal> {
        self.globals.get(name).cloned()
    }

    /// Pop the top of the stack and bind it to `name`
    pub(crate) fn bind_global_from_stack(&mut self, name: &str) -> Result<()> {
        let value = self.pop()?;
        trace!(name, kind = value.kind_name(), "bind global from stack");
        self.globals.insert(name.to_string(), value);
        Ok(())
    }

    /// Push the named global onto the stack, nil when unbound
    pub(crate) fn push_global(&mut self, name: &str) -> Result<()> {
        let value = self.globals.get(name).cloned().unwrap_or(ScriptVal::Nil);
        trace!(name, kind = value.kind_name(), "push global");
        self.push(value)
    }

    // ---- function registry ----

    /// Get the registry table, creating and binding it under the reserved
    /// global name if it does not exist yet. Check-then-create, so repeated
    /// initialization is idempotent.
    fn ensure_registry(&mut self) -> Rc<RefCell<Vec<ScriptVal>>> {
        if let Some(ScriptVal::Table(table)) = self.globals.get(&self.config.function_registry_key)
        {
            return Rc::clone(table);
        }
        let table = Rc::new(RefCell::new(Vec::new()));
        self.globals.insert(
            self.config.function_registry_key.clone(),
            ScriptVal::Table(Rc::clone(&table)),
        );
        debug!(key = %self.config.function_registry_key, "created function registry");
        table
    }

    /// Store a live function in the registry and return its handle.
    ///
    /// Handles are 1-based and entries are never evicted; a long-lived
    /// instance draining many function values grows its registry without
    /// bound. That matches the reference behavior and is a known trade-off.
    pub(crate) fn registry_store(&mut self, func: ScriptFn) -> i64 {
        let table = self.ensure_registry();
        let mut table = table.borrow_mut();
        table.push(ScriptVal::Func(func));
        let handle = table.len() as i64;
        trace!(handle, "stored function in registry");
        handle
    }

    /// Resolve a handle to its live function value.
    ///
    /// A miss means a handle outlived its function or the registry was
    /// corrupted; it is reported as an internal error, never ignored.
    pub(crate) fn registry_lookup(&self, handle: i64) -> Result<ScriptVal> {
        let Some(ScriptVal::Table(table)) = self.globals.get(&self.config.function_registry_key)
        else {
            return Err(BridgeError::registry_miss(handle));
        };
        if handle < 1 {
            return Err(BridgeError::registry_miss(handle));
        }
        let table = table.borrow();
        match table.get(handle as usize - 1) {
            Some(ScriptVal::Nil) | None => Err(BridgeError::registry_miss(handle)),
            Some(entry) => Ok(entry.clone()),
        }
    }

    // ---- bridge boundary ----

    /// Convert a cell to its stack encoding and push it
    pub(crate) fn push_cell(inst: &InstanceRef, cell: &Cell) -> Result<()> {
        let value = Instance::cell_to_val(inst, cell)?;
        inst.borrow_mut().push(value)
    }

    fn cell_to_val(inst: &InstanceRef, cell: &Cell) -> Result<ScriptVal> {
        match &cell.payload {
            Payload::Null => Ok(ScriptVal::Nil),
            Payload::Boolean(v) => Ok(ScriptVal::Bool(*v)),
            Payload::Integral(v) => Ok(ScriptVal::Int(*v)),
            Payload::Floating(v) => Ok(ScriptVal::Num(*v)),
            Payload::Str(v) => Ok(ScriptVal::Str(v.clone())),
            Payload::HostObject(v) => Ok(ScriptVal::Opaque(v.clone())),
            Payload::Array(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(Instance::cell_to_val(inst, element)?);
                }
                Ok(ScriptVal::table(items))
            }
            Payload::Function(handle) => inst.borrow().registry_lookup(*handle),
            Payload::HostLambda(_) | Payload::HostReflect(_) => Err(BridgeError::internal(
                "cannot marshal a host function stub onto the stack",
            )),
            Payload::Globals => Err(BridgeError::internal(
                "cannot marshal a globals handle onto the stack",
            )),
        }
    }

    /// Drain exactly one value off the stack into a newly constructed bound
    /// cell. Function values are stored into the registry so the returned
    /// handle outlives this stack frame.
    pub fn pop_cell(inst: &InstanceRef) -> Result<ScriptValue> {
        let value = inst.borrow_mut().pop()?;
        let cell = Instance::val_to_cell(inst, value);
        Ok(ScriptValue::from_cell(cell))
    }

    fn val_to_cell(inst: &InstanceRef, value: ScriptVal) -> Cell {
        let payload = match value {
            ScriptVal::Nil => Payload::Null,
            ScriptVal::Bool(v) => Payload::Boolean(v),
            ScriptVal::Int(v) => Payload::Integral(v),
            ScriptVal::Num(v) => Payload::Floating(v),
            ScriptVal::Str(v) => Payload::Str(v),
            ScriptVal::Opaque(v) => Payload::HostObject(v),
            ScriptVal::Table(items) => {
                let items = items.borrow();
                let cells = items
                    .iter()
                    .map(|item| Instance::val_to_cell(inst, item.clone()))
                    .collect();
                Payload::Array(cells)
            }
            ScriptVal::Func(f) => Payload::Function(inst.borrow_mut().registry_store(f)),
        };
        Cell::bound(payload, Rc::downgrade(inst))
    }

    /// Invoke the function sitting below `argc` arguments on the stack and
    /// collect its single result as a bound cell.
    ///
    /// The function and arguments are removed from the stack and all interior
    /// borrows are released before the function body runs, so the body may
    /// re-enter this instance.
    pub fn call_and_collect(inst: &InstanceRef, argc: usize) -> Result<ScriptValue> {
        let (func, args) = {
            let mut engine = inst.borrow_mut();
            if engine.stack.len() < argc + 1 {
                return Err(BridgeError::internal(
                    "call with fewer stack values than arguments",
                ));
            }
            let split = engine.stack.len() - argc;
            let args = engine.stack.split_off(split);
            let func = engine.pop()?;
            (func, args)
        };
        let ScriptVal::Func(func) = func else {
            return Err(BridgeError::internal(format!(
                "call target is not a function ({})",
                func.kind_name()
            )));
        };
        debug!(argc, "invoking function");
        let ret = func.invoke(inst, &args)?;
        inst.borrow_mut().push(ret)?;
        Instance::pop_cell(inst)
    }
}

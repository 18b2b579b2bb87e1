//! Tether
//!
//! A value-marshaling bridge between a managed host application and an
//! embedded scripting engine. Host code constructs, inspects, indexes,
//! mutates, and invokes engine values through [`ScriptValue`] without
//! touching the engine's evaluation-stack discipline directly.
//!
//! The pieces:
//!
//! - [`value`] holds the tagged value cell, its owning wrapper, scalar and
//!   composite translation, indexing, and call marshaling.
//! - [`engine`] is the interpreter instance: evaluation stack, global
//!   namespace, and function-registry storage.
//! - [`host`] models the host side of composite translation: element-type
//!   descriptors and dynamically typed arrays.
//! - [`error`] is the failure taxonomy shared by all of the above.
//!
//! Instances are strictly single-threaded; hosts running several instances
//! serialize access to each one externally.

pub mod engine;
pub mod error;
pub mod host;
pub mod value;

pub use engine::config::EngineConfig;
pub use engine::{Instance, InstanceRef, ScriptFn, ScriptVal};
pub use error::{BridgeError, Result};
pub use host::{ElementType, HostArray, HostRef, HostValue};
pub use value::{ScriptValue, ValueKind};

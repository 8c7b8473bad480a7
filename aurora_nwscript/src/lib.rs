//! NWScript function bridge.
//!
//! Compiled scripts call into the engine by numeric function id, handing over
//! a vector of typed parameters and expecting a single typed value back. This
//! crate owns that contract: the value model, the signature table and the
//! dispatch path that fills defaults, coerces types and isolates handler
//! failures from the interpreter.

mod context;
mod manager;
mod types;
mod variable;

pub use context::{CallSite, FunctionContext};
pub use manager::{CallError, FunctionInfo, FunctionManager, Handler, RegistrationError, Signature};
pub use types::{ObjectId, Type};
pub use variable::{EngineType, EngineTypeKind, ScriptState, Variable, VariableError};

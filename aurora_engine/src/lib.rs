//! Aurora module runtime: the object model, the object registry and search
//! protocol, the delayed action queue and the script function tables that
//! bytecode calls into.

pub mod actions;
pub mod cli;
pub mod error;
pub mod location;
pub mod module;
pub mod object;
pub mod record;
pub mod registry;
pub mod resources;
pub mod runtime;
pub mod script;
pub mod services;

pub use error::LoadError;
pub use location::Location;
pub use module::Module;
pub use object::{Object, ObjectKind, ObjectType};
pub use record::{Field, Record};
pub use registry::{ObjectRegistry, SearchContext};
pub use services::Services;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type tags understood by the bridge.
///
/// Vectors travel as their own tag rather than as an opaque engine type so
/// that handlers can read them without a downcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Void,
    Int,
    Float,
    String,
    Object,
    Vector,
    EngineType,
    ScriptState,
}

impl Type {
    pub fn name(self) -> &'static str {
        match self {
            Type::Void => "void",
            Type::Int => "int",
            Type::Float => "float",
            Type::String => "string",
            Type::Object => "object",
            Type::Vector => "vector",
            Type::EngineType => "engine_type",
            Type::ScriptState => "action",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque handle to a game object.
///
/// Handles are plain integers on the script side and may outlive the object
/// they name; resolve them through the object registry before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub const INVALID: ObjectId = ObjectId(u32::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

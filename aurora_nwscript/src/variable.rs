use std::any::Any;
use std::fmt;

use glam::Vec3;
use thiserror::Error;

use crate::types::{ObjectId, Type};

/// Families of opaque engine values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineTypeKind {
    Effect,
    Event,
    Location,
    Talent,
    ItemProperty,
}

/// Non-primitive value owned by the engine and opaque to bytecode.
pub trait EngineType: Any + fmt::Debug {
    fn kind(&self) -> EngineTypeKind;
    fn clone_box(&self) -> Box<dyn EngineType>;
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn EngineType> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Captured interpreter frame used to resume a script later.
#[derive(Debug, Clone, Default)]
pub struct ScriptState {
    pub offset: u32,
    pub stack: Vec<Variable>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VariableError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: Type, found: Type },
    #[error("parameter {0} out of range")]
    OutOfRange(usize),
}

/// A single typed script value.
#[derive(Debug, Clone)]
pub enum Variable {
    Void,
    Int(i32),
    Float(f32),
    String(String),
    Object(ObjectId),
    Vector(Vec3),
    EngineType(Option<Box<dyn EngineType>>),
    ScriptState(ScriptState),
}

impl Default for Variable {
    fn default() -> Self {
        Variable::Void
    }
}

impl Variable {
    /// Zero value for a declared type.
    pub fn default_for(ty: Type) -> Self {
        match ty {
            Type::Void => Variable::Void,
            Type::Int => Variable::Int(0),
            Type::Float => Variable::Float(0.0),
            Type::String => Variable::String(String::new()),
            Type::Object => Variable::Object(ObjectId::INVALID),
            Type::Vector => Variable::Vector(Vec3::ZERO),
            Type::EngineType => Variable::EngineType(None),
            Type::ScriptState => Variable::ScriptState(ScriptState::default()),
        }
    }

    pub fn engine<T: EngineType>(value: T) -> Self {
        Variable::EngineType(Some(Box::new(value)))
    }

    pub fn ty(&self) -> Type {
        match self {
            Variable::Void => Type::Void,
            Variable::Int(_) => Type::Int,
            Variable::Float(_) => Type::Float,
            Variable::String(_) => Type::String,
            Variable::Object(_) => Type::Object,
            Variable::Vector(_) => Type::Vector,
            Variable::EngineType(_) => Type::EngineType,
            Variable::ScriptState(_) => Type::ScriptState,
        }
    }

    fn mismatch(&self, expected: Type) -> VariableError {
        VariableError::TypeMismatch {
            expected,
            found: self.ty(),
        }
    }

    pub fn as_int(&self) -> Result<i32, VariableError> {
        match self {
            Variable::Int(value) => Ok(*value),
            other => Err(other.mismatch(Type::Int)),
        }
    }

    pub fn as_float(&self) -> Result<f32, VariableError> {
        match self {
            Variable::Float(value) => Ok(*value),
            other => Err(other.mismatch(Type::Float)),
        }
    }

    pub fn as_str(&self) -> Result<&str, VariableError> {
        match self {
            Variable::String(value) => Ok(value),
            other => Err(other.mismatch(Type::String)),
        }
    }

    pub fn as_object(&self) -> Result<ObjectId, VariableError> {
        match self {
            Variable::Object(value) => Ok(*value),
            other => Err(other.mismatch(Type::Object)),
        }
    }

    pub fn as_vector(&self) -> Result<Vec3, VariableError> {
        match self {
            Variable::Vector(value) => Ok(*value),
            other => Err(other.mismatch(Type::Vector)),
        }
    }

    pub fn as_engine_type(&self) -> Result<Option<&dyn EngineType>, VariableError> {
        match self {
            Variable::EngineType(value) => Ok(value.as_deref()),
            other => Err(other.mismatch(Type::EngineType)),
        }
    }

    pub fn as_script_state(&self) -> Result<&ScriptState, VariableError> {
        match self {
            Variable::ScriptState(value) => Ok(value),
            other => Err(other.mismatch(Type::ScriptState)),
        }
    }

    /// Convert to `ty` where the script language allows it implicitly.
    pub fn coerce(self, ty: Type) -> Result<Self, VariableError> {
        match (self, ty) {
            (Variable::Int(value), Type::Float) => Ok(Variable::Float(value as f32)),
            (value, ty) if value.ty() == ty => Ok(value),
            (value, ty) => Err(value.mismatch(ty)),
        }
    }
}

impl From<i32> for Variable {
    fn from(value: i32) -> Self {
        Variable::Int(value)
    }
}

impl From<bool> for Variable {
    fn from(value: bool) -> Self {
        Variable::Int(value as i32)
    }
}

impl From<f32> for Variable {
    fn from(value: f32) -> Self {
        Variable::Float(value)
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Variable::String(value.to_string())
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Variable::String(value)
    }
}

impl From<ObjectId> for Variable {
    fn from(value: ObjectId) -> Self {
        Variable::Object(value)
    }
}

impl From<Vec3> for Variable {
    fn from(value: Vec3) -> Self {
        Variable::Vector(value)
    }
}

impl From<ScriptState> for Variable {
    fn from(value: ScriptState) -> Self {
        Variable::ScriptState(value)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Void => f.write_str("void"),
            Variable::Int(value) => write!(f, "{value}"),
            Variable::Float(value) => write!(f, "{value}"),
            Variable::String(value) => write!(f, "{value:?}"),
            Variable::Object(value) => write!(f, "object({value})"),
            Variable::Vector(value) => write!(f, "[{}, {}, {}]", value.x, value.y, value.z),
            Variable::EngineType(Some(value)) => write!(f, "{value:?}"),
            Variable::EngineType(None) => f.write_str("engine_type(null)"),
            Variable::ScriptState(state) => write!(f, "action(@{})", state.offset),
        }
    }
}

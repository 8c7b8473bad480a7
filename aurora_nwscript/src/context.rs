use glam::Vec3;

use crate::types::{ObjectId, Type};
use crate::variable::{EngineType, ScriptState, Variable, VariableError};

/// Who is calling and from which script.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub caller: ObjectId,
    pub triggerer: ObjectId,
    pub script: String,
}

impl Default for CallSite {
    fn default() -> Self {
        Self {
            caller: ObjectId::INVALID,
            triggerer: ObjectId::INVALID,
            script: String::new(),
        }
    }
}

impl CallSite {
    pub fn new(caller: ObjectId, triggerer: ObjectId, script: impl Into<String>) -> Self {
        Self {
            caller,
            triggerer,
            script: script.into(),
        }
    }
}

/// Everything a handler sees for one call: the filled parameter vector, the
/// return slot and the calling objects.
#[derive(Debug)]
pub struct FunctionContext {
    id: u32,
    name: String,
    params: Vec<Variable>,
    params_specified: usize,
    ret: Variable,
    ret_type: Type,
    caller: ObjectId,
    triggerer: ObjectId,
    script_name: String,
}

impl FunctionContext {
    pub(crate) fn new(
        id: u32,
        name: &str,
        params: Vec<Variable>,
        params_specified: usize,
        ret_type: Type,
        site: &CallSite,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            params,
            params_specified,
            ret: Variable::default_for(ret_type),
            ret_type,
            caller: site.caller,
            triggerer: site.triggerer,
            script_name: site.script.clone(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Variable] {
        &self.params
    }

    /// Number of parameters the script actually passed, before defaults.
    pub fn params_specified(&self) -> usize {
        self.params_specified
    }

    pub fn caller(&self) -> ObjectId {
        self.caller
    }

    pub fn triggerer(&self) -> ObjectId {
        self.triggerer
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    pub fn return_type(&self) -> Type {
        self.ret_type
    }

    pub fn param(&self, index: usize) -> Result<&Variable, VariableError> {
        self.params
            .get(index)
            .ok_or(VariableError::OutOfRange(index))
    }

    pub fn int(&self, index: usize) -> Result<i32, VariableError> {
        self.param(index)?.as_int()
    }

    pub fn float(&self, index: usize) -> Result<f32, VariableError> {
        self.param(index)?.as_float()
    }

    pub fn string(&self, index: usize) -> Result<&str, VariableError> {
        self.param(index)?.as_str()
    }

    pub fn object(&self, index: usize) -> Result<ObjectId, VariableError> {
        self.param(index)?.as_object()
    }

    pub fn vector(&self, index: usize) -> Result<Vec3, VariableError> {
        self.param(index)?.as_vector()
    }

    pub fn engine_type(&self, index: usize) -> Result<Option<&dyn EngineType>, VariableError> {
        self.param(index)?.as_engine_type()
    }

    pub fn script_state(&self, index: usize) -> Result<&ScriptState, VariableError> {
        self.param(index)?.as_script_state()
    }

    pub fn set_return(&mut self, value: impl Into<Variable>) {
        self.ret = value.into();
    }

    pub fn return_value(&self) -> &Variable {
        &self.ret
    }

    pub(crate) fn take_return(&mut self) -> Variable {
        std::mem::take(&mut self.ret)
    }
}

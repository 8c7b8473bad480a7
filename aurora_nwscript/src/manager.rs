use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};

use log::{debug, error};
use serde::Serialize;
use thiserror::Error;

use crate::context::{CallSite, FunctionContext};
use crate::types::Type;
use crate::variable::{Variable, VariableError};

/// Engine-side implementation of one script function.
pub type Handler<E> = Box<dyn Fn(&mut E, &mut FunctionContext) -> anyhow::Result<()>>;

/// Return type plus ordered parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub ret: Type,
    pub params: Vec<Type>,
}

impl Signature {
    pub fn new(ret: Type, params: &[Type]) -> Self {
        Self {
            ret,
            params: params.to_vec(),
        }
    }
}

/// Startup contract violations. Any of these means the function table is
/// broken and the engine must not start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("function table is frozen; cannot register {0}")]
    Frozen(String),
    #[error("function id {id} already registered as {existing}")]
    DuplicateId { id: u32, existing: String },
    #[error("function name {0} already registered")]
    DuplicateName(String),
    #[error("{name}: {defaults} defaults for {params} parameters")]
    TooManyDefaults {
        name: String,
        defaults: usize,
        params: usize,
    },
    #[error("{name}: default for parameter {index} is {found}, expected {expected}")]
    DefaultType {
        name: String,
        index: usize,
        expected: Type,
        found: Type,
    },
}

/// Per-call failures. These abort the calling script invocation only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("unknown function id {0}")]
    UnknownFunction(u32),
    #[error("unknown function {0}")]
    UnknownName(String),
    #[error("{name}: expected at least {required} arguments, got {supplied}")]
    InsufficientArguments {
        name: String,
        required: usize,
        supplied: usize,
    },
    #[error("{name}: expected at most {max} arguments, got {supplied}")]
    TooManyArguments {
        name: String,
        max: usize,
        supplied: usize,
    },
    #[error("{name}: parameter {index}: {source}")]
    ParameterType {
        name: String,
        index: usize,
        #[source]
        source: VariableError,
    },
}

struct Function<E> {
    name: String,
    signature: Signature,
    defaults: Vec<Variable>,
    handler: Handler<E>,
}

impl<E> Function<E> {
    fn required(&self) -> usize {
        self.signature.params.len() - self.defaults.len()
    }
}

/// Serializable view of one table entry for tooling.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionInfo {
    pub id: u32,
    pub name: String,
    pub signature: Signature,
    pub defaults: Vec<String>,
}

/// Maps function ids to handlers, signatures and default values.
pub struct FunctionManager<E> {
    functions: BTreeMap<u32, Function<E>>,
    by_name: HashMap<String, u32>,
    frozen: bool,
}

impl<E> Default for FunctionManager<E> {
    fn default() -> Self {
        Self {
            functions: BTreeMap::new(),
            by_name: HashMap::new(),
            frozen: false,
        }
    }
}

impl<E> FunctionManager<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `id`. `defaults` covers the trailing
    /// parameters, in order.
    pub fn register_function<F>(
        &mut self,
        name: &str,
        id: u32,
        handler: F,
        signature: Signature,
        defaults: Vec<Variable>,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&mut E, &mut FunctionContext) -> anyhow::Result<()> + 'static,
    {
        if self.frozen {
            return Err(RegistrationError::Frozen(name.to_string()));
        }
        if let Some(existing) = self.functions.get(&id) {
            return Err(RegistrationError::DuplicateId {
                id,
                existing: existing.name.clone(),
            });
        }
        if self.by_name.contains_key(name) {
            return Err(RegistrationError::DuplicateName(name.to_string()));
        }

        let params = signature.params.len();
        if defaults.len() > params {
            return Err(RegistrationError::TooManyDefaults {
                name: name.to_string(),
                defaults: defaults.len(),
                params,
            });
        }

        let first_default = params - defaults.len();
        let mut checked = Vec::with_capacity(defaults.len());
        for (offset, value) in defaults.into_iter().enumerate() {
            let index = first_default + offset;
            let expected = signature.params[index];
            let found = value.ty();
            let value = value
                .coerce(expected)
                .map_err(|_| RegistrationError::DefaultType {
                    name: name.to_string(),
                    index,
                    expected,
                    found,
                })?;
            checked.push(value);
        }

        self.by_name.insert(name.to_string(), id);
        self.functions.insert(
            id,
            Function {
                name: name.to_string(),
                signature,
                defaults: checked,
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    /// Close the table. Later registrations fail.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Tear the whole table down.
    pub fn clear(&mut self) {
        self.functions.clear();
        self.by_name.clear();
        self.frozen = false;
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    pub fn signature(&self, id: u32) -> Option<&Signature> {
        self.functions.get(&id).map(|function| &function.signature)
    }

    pub fn functions(&self) -> Vec<FunctionInfo> {
        self.functions
            .iter()
            .map(|(id, function)| FunctionInfo {
                id: *id,
                name: function.name.clone(),
                signature: function.signature.clone(),
                defaults: function.defaults.iter().map(|value| value.to_string()).collect(),
            })
            .collect()
    }

    /// Dispatch one call. Handler failures (errors and panics) are logged and
    /// turn into the declared return type's default value.
    pub fn call(
        &self,
        engine: &mut E,
        id: u32,
        params: Vec<Variable>,
        site: &CallSite,
    ) -> Result<Variable, CallError> {
        let function = self
            .functions
            .get(&id)
            .ok_or(CallError::UnknownFunction(id))?;

        let supplied = params.len();
        let required = function.required();
        let max = function.signature.params.len();
        if supplied < required {
            return Err(CallError::InsufficientArguments {
                name: function.name.clone(),
                required,
                supplied,
            });
        }
        if supplied > max {
            return Err(CallError::TooManyArguments {
                name: function.name.clone(),
                max,
                supplied,
            });
        }

        let mut filled = Vec::with_capacity(max);
        for (index, (value, ty)) in params
            .into_iter()
            .zip(function.signature.params.iter().copied())
            .enumerate()
        {
            let value = value.coerce(ty).map_err(|source| CallError::ParameterType {
                name: function.name.clone(),
                index,
                source,
            })?;
            filled.push(value);
        }
        filled.extend(function.defaults[supplied - required..].iter().cloned());

        let ret_type = function.signature.ret;
        let mut ctx = FunctionContext::new(id, &function.name, filled, supplied, ret_type, site);
        debug!("call {} ({id}) from {}", function.name, site.caller);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (function.handler)(engine, &mut ctx)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!("{} ({id}) failed: {err:#}", function.name);
                ctx.set_return(Variable::default_for(ret_type));
            }
            Err(payload) => {
                error!(
                    "{} ({id}) panicked: {}",
                    function.name,
                    panic_message(payload.as_ref())
                );
                ctx.set_return(Variable::default_for(ret_type));
            }
        }

        let ret = ctx.take_return();
        if ret.ty() != ret_type {
            error!(
                "{} ({id}) returned {}, expected {ret_type}",
                function.name,
                ret.ty()
            );
            return Ok(Variable::default_for(ret_type));
        }
        Ok(ret)
    }

    /// Name-based dispatch, for tooling and tests.
    pub fn call_by_name(
        &self,
        engine: &mut E,
        name: &str,
        params: Vec<Variable>,
        site: &CallSite,
    ) -> Result<Variable, CallError> {
        let id = self
            .find_by_name(name)
            .ok_or_else(|| CallError::UnknownName(name.to_string()))?;
        self.call(engine, id, params, site)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

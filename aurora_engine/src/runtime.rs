//! Headless session driven from the command line: load a module, call
//! script functions by name, let the delayed-action queue run for a while
//! and report what happened.

use anyhow::{bail, Context, Result};
use aurora_nwscript::{CallSite, ObjectId, ScriptState, Signature, Type, Variable};
use glam::Vec3;
use log::{info, warn};
use serde::Serialize;

use crate::cli::{CallSpec, RunArgs};
use crate::location::Location;
use crate::module::{Module, ModuleSnapshot};
use crate::resources::ResourceDirectory;
use crate::script::{build_function_table, ScriptFunctions};
use crate::services::{load_record, HeadlessModels, ManualClock, ResourceType, Services};

/// Script name reported to handlers for calls made from the command line.
const CLI_SCRIPT: &str = "cli";

#[derive(Debug, Serialize)]
pub struct CallRecord {
    pub name: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub module: String,
    pub seed: u64,
    pub caller: ObjectId,
    pub calls: Vec<CallRecord>,
    pub ticks: u32,
    pub actions_executed: usize,
    pub events: Vec<String>,
    pub snapshot: ModuleSnapshot,
}

/// The registered function table, pretty-printed.
pub fn function_table_json() -> Result<String> {
    let functions = build_function_table().context("building the script function table")?;
    serde_json::to_string_pretty(&functions.functions())
        .context("serializing the function table to JSON")
}

pub fn execute(args: &RunArgs) -> Result<RunReport> {
    let functions = build_function_table().context("building the script function table")?;
    let resources = ResourceDirectory::load_from_dir(&args.resources)
        .with_context(|| format!("loading resources from {}", args.resources.display()))?;

    let pc_record = match args.pc.as_deref() {
        Some(name) => Some(
            load_record(&resources, ResourceType::Utc, name)?
                .with_context(|| format!("player blueprint \"{name}\" not found"))?,
        ),
        None => None,
    };

    let clock = ManualClock::new(0);
    let talk = resources.talk_table().cloned();
    let mut services = Services::new(resources)
        .with_clock(clock.clone())
        .with_models(HeadlessModels::default());
    if let Some(talk) = talk {
        services = services.with_talk_table(talk);
    }

    let mut module = Module::new(services).with_seed(args.seed);
    module
        .load_module(&args.module)
        .with_context(|| format!("loading module \"{}\"", args.module))?;
    if let Some(record) = pc_record.as_ref() {
        module.load_pc(record)?;
        module.enter()?;
    }

    let caller = match args.caller.as_deref() {
        Some(literal) => resolve_object(&module, literal, module.module_id())?,
        None => module.module_id(),
    };

    let calls = args
        .calls
        .iter()
        .map(|spec| run_call(&functions, &mut module, spec, caller))
        .collect();

    let mut actions_executed = 0;
    for _ in 0..args.ticks {
        clock.advance(args.tick_ms);
        actions_executed += module.process_actions();
    }
    info!(
        "ran {} ticks of {} ms, {actions_executed} delayed actions executed",
        args.ticks, args.tick_ms
    );

    Ok(RunReport {
        module: args.module.clone(),
        seed: args.seed,
        caller,
        calls,
        ticks: args.ticks,
        actions_executed,
        events: module.events().to_vec(),
        snapshot: module.snapshot(),
    })
}

fn run_call(
    functions: &ScriptFunctions,
    module: &mut Module,
    spec: &CallSpec,
    caller: ObjectId,
) -> CallRecord {
    let outcome = functions
        .find_by_name(&spec.name)
        .and_then(|id| functions.signature(id))
        .with_context(|| format!("unknown function {}", spec.name))
        .and_then(|signature| parse_arguments(module, signature, &spec.args, caller))
        .and_then(|params| {
            let site = CallSite::new(caller, ObjectId::INVALID, CLI_SCRIPT);
            functions
                .call_by_name(module, &spec.name, params, &site)
                .map_err(anyhow::Error::from)
        });

    match outcome {
        Ok(value) => {
            info!("{}({}) = {value}", spec.name, spec.args.join(", "));
            CallRecord {
                name: spec.name.clone(),
                args: spec.args.clone(),
                result: Some(value.to_string()),
                error: None,
            }
        }
        Err(err) => {
            warn!("{}: {err:#}", spec.name);
            CallRecord {
                name: spec.name.clone(),
                args: spec.args.clone(),
                result: None,
                error: Some(format!("{err:#}")),
            }
        }
    }
}

/// Literal arguments typed by the signature. Surplus arguments are passed
/// through as strings so the bridge reports the arity error.
fn parse_arguments(
    module: &Module,
    signature: &Signature,
    args: &[String],
    caller: ObjectId,
) -> Result<Vec<Variable>> {
    args.iter()
        .enumerate()
        .map(|(index, literal)| {
            let value = match signature.params.get(index) {
                Some(ty) => parse_argument(module, *ty, literal, caller),
                None => Ok(Variable::from(literal.as_str())),
            };
            value.with_context(|| format!("argument {index} ({literal:?})"))
        })
        .collect()
}

pub fn parse_argument(
    module: &Module,
    ty: Type,
    literal: &str,
    caller: ObjectId,
) -> Result<Variable> {
    let value = match ty {
        Type::Int => Variable::Int(literal.parse().context("expected an integer")?),
        Type::Float => Variable::Float(literal.parse().context("expected a float")?),
        Type::String => Variable::from(literal),
        Type::Object => Variable::Object(resolve_object(module, literal, caller)?),
        Type::Vector => Variable::Vector(parse_vector(literal)?),
        Type::EngineType if literal.is_empty() => Variable::default_for(ty),
        Type::EngineType => Variable::from(parse_location(module, literal)?),
        Type::ScriptState => Variable::ScriptState(ScriptState::default()),
        Type::Void => bail!("void parameters take no value"),
    };
    Ok(value)
}

/// `pc`, `module`, `self`, `invalid`, a `0x` handle, or the tag of a live
/// object.
pub fn resolve_object(module: &Module, literal: &str, caller: ObjectId) -> Result<ObjectId> {
    let id = match literal.to_ascii_lowercase().as_str() {
        "pc" => module.pc().unwrap_or(ObjectId::INVALID),
        "module" => module.module_id(),
        "self" | "caller" => caller,
        "invalid" | "" => ObjectId::INVALID,
        lower => match lower.strip_prefix("0x") {
            Some(hex) => ObjectId(
                u32::from_str_radix(hex, 16)
                    .with_context(|| format!("bad object handle {literal}"))?,
            ),
            None => match module.objects().with_tag(literal).first() {
                Some(id) => *id,
                None => {
                    warn!("no object tagged {literal}");
                    ObjectId::INVALID
                }
            },
        },
    };
    Ok(id)
}

/// `x;y;z`
fn parse_vector(literal: &str) -> Result<Vec3> {
    let parts = literal
        .split(';')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .context("expected x;y;z")?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => bail!("expected three components, found {}", parts.len()),
    }
}

/// `AREA_TAG;x;y;z[;facing]`
fn parse_location(module: &Module, literal: &str) -> Result<Location> {
    let mut parts = literal.split(';');
    let tag = parts.next().unwrap_or_default();
    let area = module
        .objects()
        .with_tag(tag)
        .iter()
        .copied()
        .find(|id| module.is_area(*id))
        .with_context(|| format!("no area tagged {tag}"))?;
    let numbers = parts
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .context("expected AREA;x;y;z[;facing]")?;
    let (position, facing) = match numbers.as_slice() {
        [x, y, z] => (Vec3::new(*x, *y, *z), 0.0),
        [x, y, z, facing] => (Vec3::new(*x, *y, *z), *facing),
        _ => bail!("expected AREA;x;y;z[;facing]"),
    };
    Ok(Location::new(Some(area), position, facing))
}

#[cfg(test)]
mod tests {
    use aurora_nwscript::{ObjectId, Type};

    use super::{parse_argument, resolve_object};
    use crate::location::Location;
    use crate::module::Module;
    use crate::record::Record;
    use crate::services::{MemoryResources, ResourceType, Services};

    fn module() -> Module {
        let resources = MemoryResources::new()
            .with(
                ResourceType::Ifo,
                "m",
                Record::new().with("Mod_Tag", "MOD").with("Mod_Entry_Area", "yard"),
            )
            .with(ResourceType::Are, "yard", Record::new().with("Tag", "YARD"))
            .with(
                ResourceType::Git,
                "yard",
                Record::new().with(
                    "WaypointList",
                    vec![Record::new().with("Tag", "WP_GATE").with("XPosition", 2.0)],
                ),
            );
        let mut module = Module::new(Services::new(resources));
        module.load_module("m").unwrap();
        module
    }

    #[test]
    fn object_literals_resolve() {
        let module = module();
        let caller = ObjectId(77);
        assert_eq!(resolve_object(&module, "module", caller).unwrap(), module.module_id());
        assert_eq!(resolve_object(&module, "SELF", caller).unwrap(), caller);
        assert_eq!(resolve_object(&module, "pc", caller).unwrap(), ObjectId::INVALID);
        assert_eq!(resolve_object(&module, "0x10", caller).unwrap(), ObjectId(16));
        assert!(resolve_object(&module, "0xzz", caller).is_err());
        let waypoint = module.objects().with_tag("WP_GATE")[0];
        assert_eq!(resolve_object(&module, "wp_gate", caller).unwrap(), waypoint);
        assert_eq!(resolve_object(&module, "NOBODY", caller).unwrap(), ObjectId::INVALID);
    }

    #[test]
    fn arguments_follow_the_declared_type() {
        let module = module();
        let caller = ObjectId::INVALID;
        assert_eq!(parse_argument(&module, Type::Int, "-4", caller).unwrap().as_int(), Ok(-4));
        assert!(parse_argument(&module, Type::Int, "four", caller).is_err());
        assert_eq!(
            parse_argument(&module, Type::Float, "2.5", caller).unwrap().as_float(),
            Ok(2.5)
        );
        let vector = parse_argument(&module, Type::Vector, "1;2;3", caller).unwrap();
        assert_eq!(vector.as_vector(), Ok(glam::Vec3::new(1.0, 2.0, 3.0)));
        assert!(parse_argument(&module, Type::Vector, "1;2", caller).is_err());

        let location = parse_argument(&module, Type::EngineType, "YARD;1;2;0;90", caller)
            .unwrap();
        let location = Location::from_variable(&location).unwrap();
        assert_eq!(location.area(), module.area("yard"));
        assert_eq!(location.facing(), 90.0);
        assert!(parse_argument(&module, Type::EngineType, "CELLAR;0;0;0", caller).is_err());
        assert!(Location::from_variable(
            &parse_argument(&module, Type::EngineType, "", caller).unwrap()
        )
        .is_none());
    }
}

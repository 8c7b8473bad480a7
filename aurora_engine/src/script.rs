//! The script function table: every engine function bytecode may call,
//! registered by numeric id in blocks of one hundred.

use anyhow::Result;
use aurora_nwscript::{
    FunctionContext, FunctionManager, ObjectId, RegistrationError, Signature, Type, Variable,
};
use glam::Vec3;
use log::{debug, info, warn};
use rand::Rng;

use crate::module::Module;
use crate::object::{Object, ObjectType};
use crate::services::Gender;

use self::convert::convert_object;

pub mod convert;
#[cfg(test)]
mod fixture;
mod functions_000;
mod functions_100;
mod functions_200;

/// The function table the interpreter dispatches through.
pub type ScriptFunctions = FunctionManager<Module>;

type HandlerFn = fn(&mut Module, &mut FunctionContext) -> Result<()>;

/// Build and freeze the full table. Any error here is a broken table and
/// must stop startup.
pub fn build_function_table() -> Result<ScriptFunctions, RegistrationError> {
    let defaults = Defaults::new();
    let mut functions = ScriptFunctions::new();
    {
        let mut registrar = Registrar {
            functions: &mut functions,
        };
        functions_000::register(&mut registrar, &defaults)?;
        functions_100::register(&mut registrar, &defaults)?;
        functions_200::register(&mut registrar, &defaults)?;
    }
    functions.freeze();
    Ok(functions)
}

/// Prototype values for omitted trailing parameters.
///
/// Several constants are placeholders (0) until the rules that give them
/// meaning exist.
pub(crate) struct Defaults {
    pub int0: Variable,
    pub int1: Variable,
    pub int9: Variable,
    pub int18: Variable,
    pub intm1: Variable,
    pub int_male: Variable,
    pub int_object_type_all: Variable,
    pub int_object_creature: Variable,
    pub int_talk: Variable,
    pub int_camera_snap: Variable,
    pub int_meta_magic_any: Variable,
    pub int_proj_path_default: Variable,
    pub int_damage_magical: Variable,
    pub int_damage_normal: Variable,
    pub int_vfx_none: Variable,
    pub int_ac_all: Variable,
    pub int_ac_dodge: Variable,
    pub int_attack_misc: Variable,
    pub int_first_generic_male: Variable,
    pub int_pers_zone_active: Variable,
    pub int_save_all: Variable,
    pub int_save_none: Variable,
    pub int_spells_all: Variable,
    pub float0: Variable,
    pub float1: Variable,
    pub float40: Variable,
    pub floatm1: Variable,
    pub object0: Variable,
    pub string_empty: Variable,
    pub vector0: Variable,
}

impl Defaults {
    fn new() -> Self {
        Self {
            int0: Variable::Int(0),
            int1: Variable::Int(1),
            int9: Variable::Int(9),
            int18: Variable::Int(18),
            intm1: Variable::Int(-1),
            int_male: Variable::Int(Gender::Male as i32),
            int_object_type_all: Variable::Int(ObjectType::ALL.bits()),
            int_object_creature: Variable::Int(ObjectType::CREATURE.bits()),
            int_talk: Variable::Int(0),
            int_camera_snap: Variable::Int(0),
            int_meta_magic_any: Variable::Int(255),
            int_proj_path_default: Variable::Int(0),
            int_damage_magical: Variable::Int(8),
            int_damage_normal: Variable::Int(0),
            int_vfx_none: Variable::Int(-1),
            int_ac_all: Variable::Int(0),
            int_ac_dodge: Variable::Int(0),
            int_attack_misc: Variable::Int(0),
            int_first_generic_male: Variable::Int(0),
            int_pers_zone_active: Variable::Int(0),
            int_save_all: Variable::Int(0),
            int_save_none: Variable::Int(0),
            int_spells_all: Variable::Int(0),
            float0: Variable::Float(0.0),
            float1: Variable::Float(1.0),
            float40: Variable::Float(40.0),
            floatm1: Variable::Float(-1.0),
            object0: Variable::Object(ObjectId::INVALID),
            string_empty: Variable::String(String::new()),
            vector0: Variable::Vector(Vec3::ZERO),
        }
    }
}

pub(crate) struct Registrar<'a> {
    functions: &'a mut ScriptFunctions,
}

impl Registrar<'_> {
    pub fn reg(
        &mut self,
        name: &str,
        id: u32,
        handler: HandlerFn,
        ret: Type,
        params: &[Type],
        defaults: &[&Variable],
    ) -> Result<(), RegistrationError> {
        let defaults = defaults.iter().map(|value| (*value).clone()).collect();
        self.functions
            .register_function(name, id, handler, Signature::new(ret, params), defaults)
    }
}

/// Placeholder for functions whose game rules are not modelled. The return
/// slot keeps its typed default.
pub(crate) fn unimplemented(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    warn!("TODO: {}", ctx.name());
    Ok(())
}

/// Sum of `n` rolls in `min..=max`. `n` below 1 rolls once.
pub(crate) fn random(rng: &mut impl Rng, min: i32, max: i32, n: i32) -> i32 {
    if max < min {
        return min;
    }
    (0..n.max(1)).fold(0i32, |sum, _| sum.saturating_add(rng.gen_range(min..=max)))
}

/// A `dN` function: roll `sides` as many times as the first parameter says.
pub(crate) fn roll_dice(module: &mut Module, ctx: &mut FunctionContext, sides: i32) -> Result<()> {
    let value = random(module.rng_mut(), 1, sides, ctx.int(0)?);
    ctx.set_return(value);
    Ok(())
}

/// `printf("%*.*f")`. A negative width pads on the right.
pub(crate) fn float_to_string(value: f32, width: i32, decimals: i32) -> String {
    let decimals = decimals.clamp(0, 64) as usize;
    let pad = width.unsigned_abs() as usize;
    if width < 0 {
        format!("{value:<pad$.decimals$}")
    } else {
        format!("{value:>pad$.decimals$}")
    }
}

/// The `nth` (1-based) object matching `filter`, nearest to `target` and in
/// its area. Counts below 1 pick the nearest.
pub(crate) fn nearest_to<F>(module: &Module, target: ObjectId, nth: i32, filter: F) -> ObjectId
where
    F: Fn(&Object) -> bool,
{
    let Some(object) = convert_object(module, target) else {
        return ObjectId::INVALID;
    };
    let Some(area) = object.base().area() else {
        return ObjectId::INVALID;
    };
    let found = module.nearest_objects(area, object.base().position(), target, filter);
    pick_nth(&found, nth)
}

pub(crate) fn pick_nth(found: &[ObjectId], nth: i32) -> ObjectId {
    let index = usize::try_from(nth.saturating_sub(1)).unwrap_or(0);
    found.get(index).copied().unwrap_or(ObjectId::INVALID)
}

/// Say a line out loud. There is no chat window; the line goes to the log
/// and the event trail.
pub(crate) fn speak(module: &mut Module, speaker: ObjectId, text: &str) {
    let Some(object) = convert_object(module, speaker) else {
        debug!("speak: stale speaker {speaker}");
        return;
    };
    let tag = object.tag().to_string();
    info!("{tag}: {text}");
    module.log_event(format!("speak {tag}: {text}"));
}

/// Script output. Printed lines land in the log and the event trail.
pub(crate) fn print(module: &mut Module, text: &str) {
    info!("{text}");
    module.log_event(format!("print {text}"));
}

#[cfg(test)]
mod tests {
    use aurora_nwscript::{CallError, CallSite, Type, Variable};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{build_function_table, float_to_string, random};
    use crate::module::Module;
    use crate::services::{MemoryResources, Services};

    #[test]
    fn table_covers_first_three_blocks() {
        let functions = build_function_table().expect("table registers");
        assert!(functions.is_frozen());
        assert_eq!(functions.len(), 300);
        for id in 0..300 {
            assert!(functions.signature(id).is_some(), "missing id {id}");
        }
        assert_eq!(functions.find_by_name("d10"), Some(100));
        assert_eq!(functions.find_by_name("GetObjectByTag"), Some(200));
        assert_eq!(functions.find_by_name("Random"), Some(0));
        let signature = functions.signature(100).unwrap();
        assert_eq!(signature.ret, Type::Int);
        assert_eq!(signature.params, vec![Type::Int]);
    }

    #[test]
    fn d10_rolls_with_default_count() {
        let functions = build_function_table().unwrap();
        let mut module = Module::new(Services::new(MemoryResources::new())).with_seed(42);
        let site = CallSite::default();
        for _ in 0..50 {
            let single = functions.call(&mut module, 100, vec![], &site).unwrap();
            assert!((1..=10).contains(&single.as_int().unwrap()));
            let five = functions
                .call(&mut module, 100, vec![Variable::Int(5)], &site)
                .unwrap();
            assert!((5..=50).contains(&five.as_int().unwrap()));
        }
    }

    #[test]
    fn unknown_id_fails_without_touching_objects() {
        let functions = build_function_table().unwrap();
        let mut module = Module::new(Services::new(MemoryResources::new()));
        let err = functions
            .call(&mut module, 9000, vec![], &CallSite::default())
            .unwrap_err();
        assert_eq!(err, CallError::UnknownFunction(9000));
        assert!(module.objects().is_empty());
    }

    #[test]
    fn unimplemented_functions_return_typed_defaults() {
        let functions = build_function_table().unwrap();
        let mut module = Module::new(Services::new(MemoryResources::new()));
        let site = CallSite::default();
        let year = functions
            .call_by_name(&mut module, "GetCalendarYear", vec![], &site)
            .unwrap();
        assert_eq!(year.as_int(), Ok(0));
        let effect = functions
            .call_by_name(&mut module, "EffectHeal", vec![Variable::Int(3)], &site)
            .unwrap();
        assert_eq!(effect.ty(), Type::EngineType);
    }

    #[test]
    fn random_treats_small_counts_as_one() {
        let mut rng = StdRng::seed_from_u64(1);
        for n in [-3, 0, 1] {
            let roll = random(&mut rng, 1, 6, n);
            assert!((1..=6).contains(&roll));
        }
        assert_eq!(random(&mut rng, 3, 3, 4), 12);
        assert_eq!(random(&mut rng, 5, 4, 1), 5);
    }

    #[test]
    fn float_formatting_follows_width_and_precision() {
        assert_eq!(float_to_string(1.5, 6, 2), "  1.50");
        assert_eq!(float_to_string(1.5, -6, 1), "1.5   ");
        assert_eq!(float_to_string(2.0, 0, 0), "2");
    }
}

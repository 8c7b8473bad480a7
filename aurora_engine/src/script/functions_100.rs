//! Functions 100 to 199: dice, vectors, alignment and the creature getters.

use anyhow::Result;
use aurora_nwscript::{FunctionContext, ObjectId, RegistrationError, Type as T};
use glam::Vec3;
use log::debug;

use super::convert::{
    convert_creature, convert_location, convert_object, convert_object_mut, convert_waypoint,
    object_or_caller,
};
use super::{print, roll_dice, unimplemented, Defaults, Registrar};
use crate::module::Module;
use crate::object::{
    alignment_good_evil, alignment_law_chaos, bearing_to_degrees, Ability, Object, ObjectType,
    RACE_INVALID,
};

pub(super) fn register(r: &mut Registrar, d: &Defaults) -> Result<(), RegistrationError> {
    r.reg("d10", 100, d10, T::Int, &[T::Int], &[&d.int1])?;
    r.reg("d12", 101, d12, T::Int, &[T::Int], &[&d.int1])?;
    r.reg("d20", 102, d20, T::Int, &[T::Int], &[&d.int1])?;
    r.reg("d100", 103, d100, T::Int, &[T::Int], &[&d.int1])?;
    r.reg("VectorMagnitude", 104, vector_magnitude, T::Float, &[T::Vector], &[])?;
    r.reg("GetMetaMagicFeat", 105, unimplemented, T::Int, &[], &[])?;
    r.reg("GetObjectType", 106, get_object_type, T::Int, &[T::Object], &[])?;
    r.reg("GetRacialType", 107, get_racial_type, T::Int, &[T::Object], &[])?;
    r.reg(
        "FortitudeSave",
        108,
        unimplemented,
        T::Int,
        &[T::Object, T::Int, T::Int, T::Object],
        &[&d.int_save_none, &d.object0],
    )?;
    r.reg(
        "ReflexSave",
        109,
        unimplemented,
        T::Int,
        &[T::Object, T::Int, T::Int, T::Object],
        &[&d.int_save_none, &d.object0],
    )?;
    r.reg(
        "WillSave",
        110,
        unimplemented,
        T::Int,
        &[T::Object, T::Int, T::Int, T::Object],
        &[&d.int_save_none, &d.object0],
    )?;
    r.reg("GetSpellSaveDC", 111, unimplemented, T::Int, &[], &[])?;
    r.reg("MagicalEffect", 112, unimplemented, T::EngineType, &[T::EngineType], &[])?;
    r.reg("SupernaturalEffect", 113, unimplemented, T::EngineType, &[T::EngineType], &[])?;
    r.reg("ExtraordinaryEffect", 114, unimplemented, T::EngineType, &[T::EngineType], &[])?;
    r.reg(
        "EffectACIncrease",
        115,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Int, T::Int],
        &[&d.int_ac_dodge, &d.int_ac_all],
    )?;
    r.reg("GetAC", 116, unimplemented, T::Int, &[T::Object, T::Int], &[&d.int0])?;
    r.reg(
        "EffectSavingThrowIncrease",
        117,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Int, T::Int],
        &[&d.int_save_all],
    )?;
    r.reg(
        "EffectAttackIncrease",
        118,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Int],
        &[&d.int_attack_misc],
    )?;
    r.reg(
        "EffectDamageReduction",
        119,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Int, T::Int],
        &[&d.int0],
    )?;
    r.reg(
        "EffectDamageIncrease",
        120,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Int],
        &[&d.int_damage_magical],
    )?;
    r.reg("RoundsToSeconds", 121, rounds_to_seconds, T::Float, &[T::Int], &[])?;
    r.reg("HoursToSeconds", 122, hours_to_seconds, T::Float, &[T::Int], &[])?;
    r.reg("TurnsToSeconds", 123, turns_to_seconds, T::Float, &[T::Int], &[])?;
    r.reg("GetLawChaosValue", 124, get_law_chaos_value, T::Int, &[T::Object], &[])?;
    r.reg("GetGoodEvilValue", 125, get_good_evil_value, T::Int, &[T::Object], &[])?;
    r.reg("GetAlignmentLawChaos", 126, get_alignment_law_chaos, T::Int, &[T::Object], &[])?;
    r.reg("GetAlignmentGoodEvil", 127, get_alignment_good_evil, T::Int, &[T::Object], &[])?;
    r.reg(
        "GetFirstObjectInShape",
        128,
        unimplemented,
        T::Object,
        &[T::Int, T::Float, T::EngineType, T::Int, T::Int, T::Vector],
        &[&d.int0, &d.int_object_creature, &d.vector0],
    )?;
    r.reg(
        "GetNextObjectInShape",
        129,
        unimplemented,
        T::Object,
        &[T::Int, T::Float, T::EngineType, T::Int, T::Int, T::Vector],
        &[&d.int0, &d.int_object_creature, &d.vector0],
    )?;
    r.reg("EffectEntangle", 130, unimplemented, T::EngineType, &[], &[])?;
    r.reg("SignalEvent", 131, unimplemented, T::Void, &[T::Object, T::EngineType], &[])?;
    r.reg("EventUserDefined", 132, unimplemented, T::EngineType, &[T::Int], &[])?;
    r.reg(
        "EffectDeath",
        133,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Int],
        &[&d.int0, &d.int1],
    )?;
    r.reg("EffectKnockdown", 134, unimplemented, T::EngineType, &[], &[])?;
    r.reg("ActionGiveItem", 135, unimplemented, T::Void, &[T::Object, T::Object], &[])?;
    r.reg("ActionTakeItem", 136, unimplemented, T::Void, &[T::Object, T::Object], &[])?;
    r.reg("VectorNormalize", 137, vector_normalize, T::Vector, &[T::Vector], &[])?;
    r.reg(
        "EffectCurse",
        138,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Int, T::Int, T::Int, T::Int, T::Int],
        &[&d.int1, &d.int1, &d.int1, &d.int1, &d.int1, &d.int1],
    )?;
    r.reg(
        "GetAbilityScore",
        139,
        get_ability_score,
        T::Int,
        &[T::Object, T::Int, T::Int],
        &[&d.int0],
    )?;
    r.reg("GetIsDead", 140, get_is_dead, T::Int, &[T::Object], &[])?;
    r.reg("PrintVector", 141, print_vector, T::Void, &[T::Vector, T::Int], &[])?;
    r.reg(
        "Vector",
        142,
        vector,
        T::Vector,
        &[T::Float, T::Float, T::Float],
        &[&d.float0, &d.float0, &d.float0],
    )?;
    r.reg("SetFacingPoint", 143, set_facing_point, T::Void, &[T::Vector], &[])?;
    r.reg("AngleToVector", 144, angle_to_vector, T::Vector, &[T::Float], &[])?;
    r.reg("VectorToAngle", 145, vector_to_angle, T::Float, &[T::Vector], &[])?;
    r.reg("TouchAttackMelee", 146, unimplemented, T::Int, &[T::Object, T::Int], &[&d.int1])?;
    r.reg("TouchAttackRanged", 147, unimplemented, T::Int, &[T::Object, T::Int], &[&d.int1])?;
    r.reg("EffectParalyze", 148, unimplemented, T::EngineType, &[], &[])?;
    r.reg(
        "EffectSpellImmunity",
        149,
        unimplemented,
        T::EngineType,
        &[T::Int],
        &[&d.int_spells_all],
    )?;
    r.reg("EffectDeaf", 150, unimplemented, T::EngineType, &[], &[])?;
    r.reg("GetDistanceBetween", 151, get_distance_between, T::Float, &[T::Object, T::Object], &[])?;
    r.reg(
        "SetLocalLocation",
        152,
        set_local_location,
        T::Void,
        &[T::Object, T::String, T::EngineType],
        &[],
    )?;
    r.reg(
        "GetLocalLocation",
        153,
        get_local_location,
        T::EngineType,
        &[T::Object, T::String],
        &[],
    )?;
    r.reg("EffectSleep", 154, unimplemented, T::EngineType, &[], &[])?;
    r.reg("GetItemInSlot", 155, unimplemented, T::Object, &[T::Int, T::Object], &[&d.object0])?;
    r.reg("EffectCharmed", 156, unimplemented, T::EngineType, &[], &[])?;
    r.reg("EffectConfused", 157, unimplemented, T::EngineType, &[], &[])?;
    r.reg("EffectFrightened", 158, unimplemented, T::EngineType, &[], &[])?;
    r.reg("EffectDominated", 159, unimplemented, T::EngineType, &[], &[])?;
    r.reg("EffectDazed", 160, unimplemented, T::EngineType, &[], &[])?;
    r.reg("EffectStunned", 161, unimplemented, T::EngineType, &[], &[])?;
    r.reg("SetCommandable", 162, set_commandable, T::Void, &[T::Int, T::Object], &[&d.object0])?;
    r.reg("GetCommandable", 163, get_commandable, T::Int, &[T::Object], &[&d.object0])?;
    r.reg("EffectRegenerate", 164, unimplemented, T::EngineType, &[T::Int, T::Float], &[])?;
    r.reg("EffectMovementSpeedIncrease", 165, unimplemented, T::EngineType, &[T::Int], &[])?;
    r.reg("GetHitDice", 166, get_hit_dice, T::Int, &[T::Object], &[])?;
    r.reg(
        "ActionForceFollowObject",
        167,
        unimplemented,
        T::Void,
        &[T::Object, T::Float],
        &[&d.float0],
    )?;
    r.reg("GetTag", 168, get_tag, T::String, &[T::Object], &[])?;
    r.reg("ResistSpell", 169, unimplemented, T::Int, &[T::Object, T::Object], &[])?;
    r.reg("GetEffectType", 170, unimplemented, T::Int, &[T::EngineType], &[])?;
    r.reg(
        "EffectAreaOfEffect",
        171,
        unimplemented,
        T::EngineType,
        &[T::Int, T::String, T::String, T::String],
        &[&d.string_empty, &d.string_empty, &d.string_empty],
    )?;
    r.reg("GetFactionEqual", 172, unimplemented, T::Int, &[T::Object, T::Object], &[&d.object0])?;
    r.reg("ChangeFaction", 173, unimplemented, T::Void, &[T::Object, T::Object], &[])?;
    r.reg("GetIsListening", 174, unimplemented, T::Int, &[T::Object], &[])?;
    r.reg("SetListening", 175, unimplemented, T::Void, &[T::Object, T::Int], &[])?;
    r.reg(
        "SetListenPattern",
        176,
        unimplemented,
        T::Void,
        &[T::Object, T::String, T::Int],
        &[&d.int0],
    )?;
    r.reg("TestStringAgainstPattern", 177, unimplemented, T::Int, &[T::String, T::String], &[])?;
    r.reg("GetMatchedSubstring", 178, unimplemented, T::String, &[T::Int], &[])?;
    r.reg("GetMatchedSubstringsCount", 179, unimplemented, T::Int, &[], &[])?;
    r.reg("EffectVisualEffect", 180, unimplemented, T::EngineType, &[T::Int, T::Int], &[&d.int0])?;
    r.reg(
        "GetFactionWeakestMember",
        181,
        unimplemented,
        T::Object,
        &[T::Object, T::Int],
        &[&d.object0, &d.int1],
    )?;
    r.reg(
        "GetFactionStrongestMember",
        182,
        unimplemented,
        T::Object,
        &[T::Object, T::Int],
        &[&d.object0, &d.int1],
    )?;
    r.reg(
        "GetFactionMostDamagedMember",
        183,
        unimplemented,
        T::Object,
        &[T::Object, T::Int],
        &[&d.object0, &d.int1],
    )?;
    r.reg(
        "GetFactionLeastDamagedMember",
        184,
        unimplemented,
        T::Object,
        &[T::Object, T::Int],
        &[&d.object0, &d.int1],
    )?;
    r.reg("GetFactionGold", 185, unimplemented, T::Int, &[T::Object], &[])?;
    r.reg("GetFactionAverageReputation", 186, unimplemented, T::Int, &[T::Object, T::Object], &[])?;
    r.reg("GetFactionAverageGoodEvilAlignment", 187, unimplemented, T::Int, &[T::Object], &[])?;
    r.reg("GetFactionAverageLawChaosAlignment", 188, unimplemented, T::Int, &[T::Object], &[])?;
    r.reg("GetFactionAverageLevel", 189, unimplemented, T::Int, &[T::Object], &[])?;
    r.reg("GetFactionAverageXP", 190, unimplemented, T::Int, &[T::Object], &[])?;
    r.reg("GetFactionMostFrequentClass", 191, unimplemented, T::Int, &[T::Object], &[])?;
    r.reg(
        "GetFactionWorstAC",
        192,
        unimplemented,
        T::Object,
        &[T::Object, T::Int],
        &[&d.object0, &d.int1],
    )?;
    r.reg(
        "GetFactionBestAC",
        193,
        unimplemented,
        T::Object,
        &[T::Object, T::Int],
        &[&d.object0, &d.int1],
    )?;
    r.reg("ActionSit", 194, unimplemented, T::Void, &[T::Object], &[])?;
    r.reg("GetListenPatternNumber", 195, get_listen_pattern_number, T::Int, &[], &[])?;
    r.reg(
        "ActionJumpToObject",
        196,
        action_jump_to_object,
        T::Void,
        &[T::Object, T::Int],
        &[&d.int1],
    )?;
    r.reg("GetWaypointByTag", 197, get_waypoint_by_tag, T::Object, &[T::String], &[])?;
    r.reg("GetTransitionTarget", 198, unimplemented, T::Object, &[T::Object], &[])?;
    r.reg(
        "EffectLinkEffects",
        199,
        unimplemented,
        T::EngineType,
        &[T::EngineType, T::EngineType],
        &[],
    )?;
    Ok(())
}

fn d10(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    roll_dice(module, ctx, 10)
}

fn d12(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    roll_dice(module, ctx, 12)
}

fn d20(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    roll_dice(module, ctx, 20)
}

fn d100(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    roll_dice(module, ctx, 100)
}

fn vector_magnitude(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let length = ctx.vector(0)?.length();
    ctx.set_return(length);
    Ok(())
}

fn get_object_type(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let object_type = convert_object(module, ctx.object(0)?)
        .map(Object::kind)
        .filter(|kind| kind.is_game_object())
        .map_or(ObjectType::INVALID, |kind| kind.object_type());
    ctx.set_return(object_type.bits());
    Ok(())
}

fn get_racial_type(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let race = convert_creature(module, ctx.object(0)?)
        .map_or(RACE_INVALID, |creature| creature.race());
    ctx.set_return(i32::try_from(race).unwrap_or(-1));
    Ok(())
}

fn rounds_to_seconds(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let seconds = ctx.int(0)? as f32 * 6.0;
    ctx.set_return(seconds);
    Ok(())
}

fn hours_to_seconds(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let seconds = ctx.int(0)? as f32 * module.minutes_per_hour() as f32 * 60.0;
    ctx.set_return(seconds);
    Ok(())
}

fn turns_to_seconds(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let seconds = ctx.int(0)? as f32 * 60.0;
    ctx.set_return(seconds);
    Ok(())
}

fn get_law_chaos_value(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = convert_creature(module, ctx.object(0)?)
        .map_or(-1, |creature| i32::from(creature.law_chaos()));
    ctx.set_return(value);
    Ok(())
}

fn get_good_evil_value(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = convert_creature(module, ctx.object(0)?)
        .map_or(-1, |creature| i32::from(creature.good_evil()));
    ctx.set_return(value);
    Ok(())
}

fn get_alignment_law_chaos(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = convert_creature(module, ctx.object(0)?)
        .map_or(-1, |creature| alignment_law_chaos(creature.law_chaos()));
    ctx.set_return(value);
    Ok(())
}

fn get_alignment_good_evil(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = convert_creature(module, ctx.object(0)?)
        .map_or(-1, |creature| alignment_good_evil(creature.good_evil()));
    ctx.set_return(value);
    Ok(())
}

fn vector_normalize(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let normal = ctx.vector(0)?.normalize_or_zero();
    ctx.set_return(normal);
    Ok(())
}

fn get_ability_score(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let ability = Ability::from_script(ctx.int(1)?);
    let score = convert_creature(module, ctx.object(0)?)
        .zip(ability)
        .map_or(0, |(creature, ability)| i32::from(creature.ability(ability)));
    ctx.set_return(score);
    Ok(())
}

fn get_is_dead(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let dead = convert_creature(module, ctx.object(0)?).is_some_and(|creature| creature.is_dead());
    ctx.set_return(dead);
    Ok(())
}

fn print_vector(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let v = ctx.vector(0)?;
    let prefix = if ctx.int(1)? != 0 { "PRINTVECTOR:" } else { "" };
    print(module, &format!("{prefix}{:.6}, {:.6}, {:.6}", v.x, v.y, v.z));
    Ok(())
}

fn vector(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let v = Vec3::new(ctx.float(0)?, ctx.float(1)?, ctx.float(2)?);
    ctx.set_return(v);
    Ok(())
}

fn set_facing_point(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let target = ctx.vector(0)?;
    if let Some(object) = convert_object_mut(module, ctx.caller()) {
        let delta = target - object.base().position();
        object.base_mut().set_facing(bearing_to_degrees(delta.x, delta.y));
    }
    Ok(())
}

fn angle_to_vector(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let (sin, cos) = ctx.float(0)?.to_radians().sin_cos();
    ctx.set_return(Vec3::new(cos, sin, 0.0));
    Ok(())
}

fn vector_to_angle(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let v = ctx.vector(0)?;
    let angle = v.y.atan2(v.x).to_degrees().rem_euclid(360.0);
    ctx.set_return(angle);
    Ok(())
}

fn get_distance_between(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let a = convert_object(module, ctx.object(0)?).map(Object::base);
    let b = convert_object(module, ctx.object(1)?).map(Object::base);
    let distance = match (a, b) {
        (Some(a), Some(b)) if a.area().is_some() && a.area() == b.area() => {
            a.position().distance(b.position())
        }
        _ => 0.0,
    };
    ctx.set_return(distance);
    Ok(())
}

fn set_local_location(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let Some(location) = convert_location(ctx.param(2)?) else {
        debug!("SetLocalLocation: not a location");
        return Ok(());
    };
    if let Some(object) = convert_object_mut(module, ctx.object(0)?) {
        object
            .base_mut()
            .locals_mut()
            .set_location(ctx.string(1)?, location);
    }
    Ok(())
}

fn get_local_location(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let name = ctx.string(1)?;
    let location = convert_object(module, ctx.object(0)?)
        .and_then(|object| object.base().locals().get_location(name))
        .unwrap_or_default();
    ctx.set_return(location);
    Ok(())
}

fn set_commandable(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let commandable = ctx.int(0)? != 0;
    if let Some(object) = convert_object_mut(module, object_or_caller(ctx, 1)) {
        object.base_mut().set_commandable(commandable);
    }
    Ok(())
}

fn get_commandable(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let commandable = convert_object(module, object_or_caller(ctx, 0))
        .is_some_and(|object| object.base().is_commandable());
    ctx.set_return(commandable);
    Ok(())
}

fn get_hit_dice(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let hit_dice = convert_creature(module, ctx.object(0)?)
        .map_or(0, |creature| i32::try_from(creature.hit_dice()).unwrap_or(i32::MAX));
    ctx.set_return(hit_dice);
    Ok(())
}

fn get_tag(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let tag = convert_object(module, ctx.object(0)?)
        .map(|object| object.tag().to_string())
        .unwrap_or_default();
    ctx.set_return(tag);
    Ok(())
}

// Listen patterns are never registered, so nothing ever matches.
fn get_listen_pattern_number(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    ctx.set_return(-1);
    Ok(())
}

fn action_jump_to_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let target = ctx.object(0)?;
    let Some((area, position)) = convert_object(module, target)
        .and_then(|object| Some((object.base().area()?, object.base().position())))
    else {
        debug!("ActionJumpToObject: {target} is not placed in an area");
        return Ok(());
    };
    module.jump_to(ctx.caller(), area, position);
    Ok(())
}

fn get_waypoint_by_tag(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let tag = ctx.string(0)?;
    let waypoint = module
        .objects()
        .with_tag(tag)
        .iter()
        .copied()
        .find(|id| convert_waypoint(module, *id).is_some())
        .unwrap_or(ObjectId::INVALID);
    ctx.set_return(waypoint);
    Ok(())
}

#[cfg(test)]
mod tests {
    use aurora_nwscript::{ObjectId, Variable};
    use glam::Vec3;

    use crate::location::Location;
    use crate::script::convert::convert_location;
    use crate::script::fixture::World;

    fn int(world: &mut World, name: &str, params: Vec<Variable>) -> i32 {
        let pc = world.pc();
        world.call(name, params, pc).as_int().expect("int result")
    }

    fn float(world: &mut World, name: &str, params: Vec<Variable>) -> f32 {
        let pc = world.pc();
        world.call(name, params, pc).as_float().expect("float result")
    }

    fn vector(world: &mut World, name: &str, params: Vec<Variable>) -> Vec3 {
        let pc = world.pc();
        world.call(name, params, pc).as_vector().expect("vector result")
    }

    #[test]
    fn object_type_bits() {
        let mut world = World::new();
        let cases = [
            (world.tagged("NPC", 0), 1),
            (world.tagged("GATE", 0), 8),
            (world.tagged("WP_START", 0), 32),
            (world.tagged("CHEST", 0), 64),
            (world.module.module_id(), 0x7FFF),
            (world.yard(), 0x7FFF),
            (ObjectId::INVALID, 0x7FFF),
        ];
        for (object, expected) in cases {
            assert_eq!(int(&mut world, "GetObjectType", vec![object.into()]), expected);
        }
    }

    #[test]
    fn creature_getters_fall_back_on_non_creatures() {
        let mut world = World::new();
        let far = world.tagged("NPC", 0);
        let near = world.tagged("NPC", 1);
        let gate = world.tagged("GATE", 0);

        assert_eq!(int(&mut world, "GetRacialType", vec![far.into()]), 3);
        assert_eq!(int(&mut world, "GetRacialType", vec![near.into()]), 28);
        assert_eq!(int(&mut world, "GetRacialType", vec![gate.into()]), 28);

        assert_eq!(int(&mut world, "GetLawChaosValue", vec![far.into()]), 80);
        assert_eq!(int(&mut world, "GetGoodEvilValue", vec![far.into()]), 20);
        assert_eq!(int(&mut world, "GetAlignmentLawChaos", vec![far.into()]), 2);
        assert_eq!(int(&mut world, "GetAlignmentGoodEvil", vec![far.into()]), 5);
        assert_eq!(int(&mut world, "GetAlignmentLawChaos", vec![near.into()]), 1);
        for name in [
            "GetLawChaosValue",
            "GetGoodEvilValue",
            "GetAlignmentLawChaos",
            "GetAlignmentGoodEvil",
        ] {
            assert_eq!(int(&mut world, name, vec![gate.into()]), -1, "{name}");
        }

        assert_eq!(int(&mut world, "GetAbilityScore", vec![far.into(), 0.into()]), 14);
        assert_eq!(int(&mut world, "GetAbilityScore", vec![far.into(), 1.into()]), 10);
        assert_eq!(int(&mut world, "GetAbilityScore", vec![far.into(), 9.into()]), 0);
        assert_eq!(int(&mut world, "GetAbilityScore", vec![gate.into(), 0.into()]), 0);
        assert_eq!(int(&mut world, "GetHitDice", vec![far.into()]), 5);
        assert_eq!(int(&mut world, "GetHitDice", vec![near.into()]), 0);
        assert_eq!(int(&mut world, "GetIsDead", vec![far.into()]), 0);
    }

    #[test]
    fn time_conversions_use_module_clock_rate() {
        let mut world = World::new();
        assert_eq!(float(&mut world, "RoundsToSeconds", vec![2.into()]), 12.0);
        assert_eq!(float(&mut world, "TurnsToSeconds", vec![1.into()]), 60.0);
        assert_eq!(float(&mut world, "HoursToSeconds", vec![2.into()]), 360.0);
    }

    #[test]
    fn vector_helpers() {
        let mut world = World::new();
        let v = vector(&mut world, "Vector", vec![3.0f32.into(), 4.0f32.into()]);
        assert_eq!(v, Vec3::new(3.0, 4.0, 0.0));
        assert_eq!(float(&mut world, "VectorMagnitude", vec![v.into()]), 5.0);
        let zero = vector(&mut world, "VectorNormalize", vec![Vec3::ZERO.into()]);
        assert_eq!(zero, Vec3::ZERO);

        let up = vector(&mut world, "AngleToVector", vec![90.0f32.into()]);
        assert!(up.abs_diff_eq(Vec3::Y, 1e-5));
        let angle = float(&mut world, "VectorToAngle", vec![Vec3::new(0.0, -1.0, 0.0).into()]);
        assert!((angle - 270.0).abs() < 1e-3);
    }

    #[test]
    fn print_vector_prefix_is_optional() {
        let mut world = World::new();
        let pc = world.pc();
        let v = Vec3::new(1.0, 2.0, 3.0);
        world.call("PrintVector", vec![v.into(), 1.into()], pc);
        world.call("PrintVector", vec![v.into(), 0.into()], pc);
        let events = world.module.events();
        assert!(events
            .iter()
            .any(|event| event == "print PRINTVECTOR:1.000000, 2.000000, 3.000000"));
        assert!(events
            .iter()
            .any(|event| event == "print 1.000000, 2.000000, 3.000000"));
    }

    #[test]
    fn facing_point_and_distance() {
        let mut world = World::new();
        let pc = world.pc();
        let gate = world.tagged("GATE", 0);
        world.call("SetFacingPoint", vec![Vec3::new(0.0, 5.0, 0.0).into()], pc);
        let facing = float(&mut world, "GetFacing", vec![pc.into()]);
        assert!((facing - 90.0).abs() < 1e-3);

        let distance = float(&mut world, "GetDistanceBetween", vec![pc.into(), gate.into()]);
        assert!((distance - 3.0).abs() < 1e-5);
        let invalid = float(
            &mut world,
            "GetDistanceBetween",
            vec![pc.into(), ObjectId::INVALID.into()],
        );
        assert_eq!(invalid, 0.0);
    }

    #[test]
    fn local_locations_round_trip_through_objects() {
        let mut world = World::new();
        let pc = world.pc();
        let npc = world.tagged("NPC", 0);
        let here = Location::new(Some(world.yard()), Vec3::new(1.0, 2.0, 3.0), 45.0);
        world.call(
            "SetLocalLocation",
            vec![npc.into(), "home".into(), here.into()],
            pc,
        );
        let back = world.call("GetLocalLocation", vec![npc.into(), "home".into()], pc);
        assert_eq!(convert_location(&back), Some(here));

        let missing = world.call("GetLocalLocation", vec![npc.into(), "away".into()], pc);
        assert_eq!(convert_location(&missing), Some(Location::default()));
    }

    #[test]
    fn commandable_defaults_to_the_caller() {
        let mut world = World::new();
        let npc = world.tagged("NPC", 0);
        assert_eq!(world.call("GetCommandable", vec![], npc).as_int(), Ok(1));
        world.call("SetCommandable", vec![0.into()], npc);
        assert_eq!(world.call("GetCommandable", vec![], npc).as_int(), Ok(0));
        let pc = world.pc();
        assert_eq!(world.call("GetCommandable", vec![], pc).as_int(), Ok(1));
    }

    #[test]
    fn tags_and_waypoints() {
        let mut world = World::new();
        let pc = world.pc();
        let far = world.tagged("NPC", 0);
        let wp = world.tagged("WP_START", 0);
        let tag = world.call("GetTag", vec![far.into()], pc);
        assert_eq!(tag.as_str(), Ok("NPC"));
        let none = world.call("GetTag", vec![ObjectId::INVALID.into()], pc);
        assert_eq!(none.as_str(), Ok(""));

        let found = world.call("GetWaypointByTag", vec!["wp_start".into()], pc);
        assert_eq!(found.as_object(), Ok(wp));
        let not_waypoint = world.call("GetWaypointByTag", vec!["NPC".into()], pc);
        assert_eq!(not_waypoint.as_object(), Ok(ObjectId::INVALID));
        assert_eq!(int(&mut world, "GetListenPatternNumber", vec![]), -1);
    }

    #[test]
    fn jump_to_object_takes_its_position() {
        let mut world = World::new();
        let near = world.tagged("NPC", 1);
        let wp = world.tagged("WP_START", 0);
        world.call("ActionJumpToObject", vec![wp.into()], near);
        let position = vector(&mut world, "GetPosition", vec![near.into()]);
        assert_eq!(position, Vec3::new(1.0, 0.0, 0.0));

        let module = world.module.module_id();
        world.call("ActionJumpToObject", vec![module.into()], near);
        let unchanged = vector(&mut world, "GetPosition", vec![near.into()]);
        assert_eq!(unchanged, Vec3::new(1.0, 0.0, 0.0));
    }
}

//! Functions 200 to 299: tag and proximity searches, locations,
//! conversations, object lifetime and conversions.

use anyhow::{bail, Result};
use aurora_nwscript::{FunctionContext, ObjectId, RegistrationError, Type as T};
use glam::Vec3;
use log::{debug, warn};

use super::convert::{
    convert_area, convert_location, convert_object, convert_object_mut, convert_pc,
    object_or_caller,
};
use super::{nearest_to, pick_nth, speak, unimplemented, Defaults, Registrar};
use crate::location::Location;
use crate::module::Module;
use crate::object::{Locals, ObjectType};
use crate::registry::SearchContext;
use crate::services::Gender;

pub(super) fn register(r: &mut Registrar, d: &Defaults) -> Result<(), RegistrationError> {
    r.reg("GetObjectByTag", 200, get_object_by_tag, T::Object, &[T::String, T::Int], &[&d.int0])?;
    r.reg(
        "AdjustAlignment",
        201,
        unimplemented,
        T::Void,
        &[T::Object, T::Int, T::Int, T::Int],
        &[&d.int1],
    )?;
    r.reg("ActionWait", 202, unimplemented, T::Void, &[T::Float], &[])?;
    r.reg(
        "SetAreaTransitionBMP",
        203,
        unimplemented,
        T::Void,
        &[T::Int, T::String],
        &[&d.string_empty],
    )?;
    r.reg(
        "ActionStartConversation",
        204,
        action_start_conversation,
        T::Void,
        &[T::Object, T::String, T::Int, T::Int],
        &[&d.string_empty, &d.int0, &d.int1],
    )?;
    r.reg("ActionPauseConversation", 205, unimplemented, T::Void, &[], &[])?;
    r.reg("ActionResumeConversation", 206, unimplemented, T::Void, &[], &[])?;
    r.reg(
        "EffectBeam",
        207,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Object, T::Int, T::Int],
        &[&d.int0],
    )?;
    r.reg("GetReputation", 208, unimplemented, T::Int, &[T::Object, T::Object], &[])?;
    r.reg("AdjustReputation", 209, unimplemented, T::Void, &[T::Object, T::Object, T::Int], &[])?;
    r.reg("GetSittingCreature", 210, unimplemented, T::Object, &[T::Object], &[])?;
    r.reg("GetGoingToBeAttackedBy", 211, unimplemented, T::Object, &[T::Object], &[])?;
    r.reg("EffectSpellResistanceIncrease", 212, unimplemented, T::EngineType, &[T::Int], &[])?;
    r.reg("GetLocation", 213, get_location, T::EngineType, &[T::Object], &[])?;
    r.reg("ActionJumpToLocation", 214, action_jump_to_location, T::Void, &[T::EngineType], &[])?;
    r.reg("Location", 215, location, T::EngineType, &[T::Object, T::Vector, T::Float], &[])?;
    r.reg(
        "ApplyEffectAtLocation",
        216,
        unimplemented,
        T::Void,
        &[T::Int, T::EngineType, T::EngineType, T::Float],
        &[&d.float0],
    )?;
    r.reg("GetIsPC", 217, get_is_pc, T::Int, &[T::Object], &[])?;
    r.reg("FeetToMeters", 218, feet_to_meters, T::Float, &[T::Float], &[])?;
    r.reg("YardsToMeters", 219, yards_to_meters, T::Float, &[T::Float], &[])?;
    r.reg(
        "ApplyEffectToObject",
        220,
        unimplemented,
        T::Void,
        &[T::Int, T::EngineType, T::Object, T::Float],
        &[&d.float0],
    )?;
    r.reg("SpeakString", 221, speak_string, T::Void, &[T::String, T::Int], &[&d.int_talk])?;
    r.reg("GetSpellTargetLocation", 222, unimplemented, T::EngineType, &[], &[])?;
    r.reg(
        "GetPositionFromLocation",
        223,
        get_position_from_location,
        T::Vector,
        &[T::EngineType],
        &[],
    )?;
    r.reg("GetAreaFromLocation", 224, get_area_from_location, T::Object, &[T::EngineType], &[])?;
    r.reg("GetFacingFromLocation", 225, get_facing_from_location, T::Float, &[T::EngineType], &[])?;
    r.reg(
        "GetNearestCreatureToLocation",
        226,
        unimplemented,
        T::Object,
        &[T::Int, T::Int, T::EngineType, T::Int, T::Int, T::Int, T::Int, T::Int],
        &[&d.int1, &d.intm1, &d.intm1, &d.intm1, &d.intm1],
    )?;
    r.reg(
        "GetNearestObject",
        227,
        get_nearest_object,
        T::Object,
        &[T::Int, T::Object, T::Int],
        &[&d.int_object_type_all, &d.object0, &d.int1],
    )?;
    r.reg(
        "GetNearestObjectToLocation",
        228,
        get_nearest_object_to_location,
        T::Object,
        &[T::Int, T::EngineType, T::Int],
        &[&d.int1],
    )?;
    r.reg(
        "GetNearestObjectByTag",
        229,
        get_nearest_object_by_tag,
        T::Object,
        &[T::String, T::Object, T::Int],
        &[&d.object0, &d.int1],
    )?;
    r.reg("IntToFloat", 230, int_to_float, T::Float, &[T::Int], &[])?;
    r.reg("FloatToInt", 231, float_to_int, T::Int, &[T::Float], &[])?;
    r.reg("StringToInt", 232, string_to_int, T::Int, &[T::String], &[])?;
    r.reg("StringToFloat", 233, string_to_float, T::Float, &[T::String], &[])?;
    r.reg(
        "ActionCastSpellAtLocation",
        234,
        unimplemented,
        T::Void,
        &[T::Int, T::EngineType, T::Int, T::Int, T::Int, T::Int],
        &[&d.int_meta_magic_any, &d.int0, &d.int_proj_path_default, &d.int0],
    )?;
    r.reg("GetIsEnemy", 235, unimplemented, T::Int, &[T::Object, T::Object], &[&d.object0])?;
    r.reg("GetIsFriend", 236, unimplemented, T::Int, &[T::Object, T::Object], &[&d.object0])?;
    r.reg("GetIsNeutral", 237, unimplemented, T::Int, &[T::Object, T::Object], &[&d.object0])?;
    r.reg("GetPCSpeaker", 238, get_pc_speaker, T::Object, &[], &[])?;
    r.reg(
        "GetStringByStrRef",
        239,
        get_string_by_str_ref,
        T::String,
        &[T::Int, T::Int],
        &[&d.int_male],
    )?;
    r.reg(
        "ActionSpeakStringByStrRef",
        240,
        unimplemented,
        T::Void,
        &[T::Int, T::Int],
        &[&d.int_talk],
    )?;
    r.reg("DestroyObject", 241, destroy_object, T::Void, &[T::Object, T::Float], &[&d.float0])?;
    r.reg("GetModule", 242, get_module, T::Object, &[], &[])?;
    r.reg(
        "CreateObject",
        243,
        create_object,
        T::Object,
        &[T::Int, T::String, T::EngineType, T::Int, T::String],
        &[&d.int0, &d.string_empty],
    )?;
    r.reg(
        "EventSpellCastAt",
        244,
        unimplemented,
        T::EngineType,
        &[T::Object, T::Int, T::Int],
        &[&d.int1],
    )?;
    r.reg("GetLastSpellCaster", 245, unimplemented, T::Object, &[], &[])?;
    r.reg("GetLastSpell", 246, unimplemented, T::Int, &[], &[])?;
    r.reg("GetUserDefinedEventNumber", 247, unimplemented, T::Int, &[], &[])?;
    r.reg("GetSpellId", 248, unimplemented, T::Int, &[], &[])?;
    r.reg("RandomName", 249, unimplemented, T::String, &[T::Int], &[&d.int_first_generic_male])?;
    r.reg("EffectPoison", 250, unimplemented, T::EngineType, &[T::Int], &[])?;
    r.reg("EffectDisease", 251, unimplemented, T::EngineType, &[T::Int], &[])?;
    r.reg("EffectSilence", 252, unimplemented, T::EngineType, &[], &[])?;
    r.reg("GetName", 253, get_name, T::String, &[T::Object, T::Int], &[&d.int0])?;
    r.reg("GetLastSpeaker", 254, unimplemented, T::Object, &[], &[])?;
    r.reg(
        "BeginConversation",
        255,
        begin_conversation,
        T::Int,
        &[T::String, T::Object],
        &[&d.string_empty, &d.object0],
    )?;
    r.reg("GetLastPerceived", 256, unimplemented, T::Object, &[], &[])?;
    r.reg("GetLastPerceptionHeard", 257, unimplemented, T::Int, &[], &[])?;
    r.reg("GetLastPerceptionInaudible", 258, unimplemented, T::Int, &[], &[])?;
    r.reg("GetLastPerceptionSeen", 259, unimplemented, T::Int, &[], &[])?;
    r.reg("GetLastClosedBy", 260, unimplemented, T::Object, &[], &[])?;
    r.reg("GetLastPerceptionVanished", 261, unimplemented, T::Int, &[], &[])?;
    r.reg(
        "GetFirstInPersistentObject",
        262,
        unimplemented,
        T::Object,
        &[T::Object, T::Int, T::Int],
        &[&d.object0, &d.int_object_creature, &d.int_pers_zone_active],
    )?;
    r.reg(
        "GetNextInPersistentObject",
        263,
        unimplemented,
        T::Object,
        &[T::Object, T::Int, T::Int],
        &[&d.object0, &d.int_object_creature, &d.int_pers_zone_active],
    )?;
    r.reg("GetAreaOfEffectCreator", 264, unimplemented, T::Object, &[T::Object], &[&d.object0])?;
    r.reg("DeleteLocalInt", 265, delete_local_int, T::Void, &[T::Object, T::String], &[])?;
    r.reg("DeleteLocalFloat", 266, delete_local_float, T::Void, &[T::Object, T::String], &[])?;
    r.reg("DeleteLocalString", 267, delete_local_string, T::Void, &[T::Object, T::String], &[])?;
    r.reg("DeleteLocalObject", 268, delete_local_object, T::Void, &[T::Object, T::String], &[])?;
    r.reg(
        "DeleteLocalLocation",
        269,
        delete_local_location,
        T::Void,
        &[T::Object, T::String],
        &[],
    )?;
    r.reg("EffectHaste", 270, unimplemented, T::EngineType, &[], &[])?;
    r.reg("EffectSlow", 271, unimplemented, T::EngineType, &[], &[])?;
    r.reg("ObjectToString", 272, object_to_string, T::String, &[T::Object], &[])?;
    r.reg("EffectImmunity", 273, unimplemented, T::EngineType, &[T::Int], &[])?;
    r.reg(
        "GetIsImmune",
        274,
        unimplemented,
        T::Int,
        &[T::Object, T::Int, T::Object],
        &[&d.object0],
    )?;
    r.reg(
        "EffectDamageImmunityIncrease",
        275,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Int],
        &[],
    )?;
    r.reg("GetEncounterActive", 276, unimplemented, T::Int, &[T::Object], &[&d.object0])?;
    r.reg("SetEncounterActive", 277, unimplemented, T::Void, &[T::Int, T::Object], &[&d.object0])?;
    r.reg("GetEncounterSpawnsMax", 278, unimplemented, T::Int, &[T::Object], &[&d.object0])?;
    r.reg(
        "SetEncounterSpawnsMax",
        279,
        unimplemented,
        T::Void,
        &[T::Int, T::Object],
        &[&d.object0],
    )?;
    r.reg("GetEncounterSpawnsCurrent", 280, unimplemented, T::Int, &[T::Object], &[&d.object0])?;
    r.reg(
        "SetEncounterSpawnsCurrent",
        281,
        unimplemented,
        T::Void,
        &[T::Int, T::Object],
        &[&d.object0],
    )?;
    r.reg("GetModuleItemAcquired", 282, unimplemented, T::Object, &[], &[])?;
    r.reg("GetModuleItemAcquiredFrom", 283, unimplemented, T::Object, &[], &[])?;
    r.reg("SetCustomToken", 284, set_custom_token, T::Void, &[T::Int, T::String], &[])?;
    r.reg("GetHasFeat", 285, unimplemented, T::Int, &[T::Int, T::Object], &[&d.object0])?;
    r.reg("GetHasSkill", 286, unimplemented, T::Int, &[T::Int, T::Object], &[&d.object0])?;
    r.reg("ActionUseFeat", 287, unimplemented, T::Void, &[T::Int, T::Object], &[])?;
    r.reg(
        "ActionUseSkill",
        288,
        unimplemented,
        T::Void,
        &[T::Int, T::Object, T::Int, T::Object],
        &[&d.int0, &d.object0],
    )?;
    r.reg("GetObjectSeen", 289, unimplemented, T::Int, &[T::Object, T::Object], &[&d.object0])?;
    r.reg("GetObjectHeard", 290, unimplemented, T::Int, &[T::Object, T::Object], &[&d.object0])?;
    r.reg("GetLastPlayerDied", 291, unimplemented, T::Object, &[], &[])?;
    r.reg("GetModuleItemLost", 292, unimplemented, T::Object, &[], &[])?;
    r.reg("GetModuleItemLostBy", 293, unimplemented, T::Object, &[], &[])?;
    r.reg("ActionDoCommand", 294, action_do_command, T::Void, &[T::ScriptState], &[])?;
    r.reg("EventConversation", 295, unimplemented, T::EngineType, &[], &[])?;
    r.reg(
        "SetEncounterDifficulty",
        296,
        unimplemented,
        T::Void,
        &[T::Int, T::Object],
        &[&d.object0],
    )?;
    r.reg("GetEncounterDifficulty", 297, unimplemented, T::Int, &[T::Object], &[&d.object0])?;
    r.reg(
        "GetDistanceBetweenLocations",
        298,
        get_distance_between_locations,
        T::Float,
        &[T::EngineType, T::EngineType],
        &[],
    )?;
    r.reg(
        "GetReflexAdjustedDamage",
        299,
        unimplemented,
        T::Int,
        &[T::Int, T::Object, T::Int, T::Int, T::Object],
        &[&d.int_save_none, &d.object0],
    )?;
    Ok(())
}

fn get_object_by_tag(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let tag = ctx.string(0)?;
    let nth = ctx.int(1)?;
    let mut search = SearchContext::new();
    let mut found = ObjectId::INVALID;
    if !tag.is_empty()
        && nth >= 0
        && module.find_object_init(&mut search, Some(tag))
        && (0..=nth).all(|_| module.find_next_object(&mut search))
    {
        found = search.current().unwrap_or(ObjectId::INVALID);
    }
    ctx.set_return(found);
    Ok(())
}

fn action_start_conversation(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let pc = ctx.object(0)?;
    if convert_pc(module, pc).is_none() {
        debug!("ActionStartConversation: {pc} is not a PC");
        return Ok(());
    }
    module.start_conversation(ctx.string(1)?, pc, ctx.caller());
    Ok(())
}

fn get_location(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let location = convert_object(module, ctx.object(0)?)
        .map(|object| object.base().location())
        .unwrap_or_default();
    ctx.set_return(location);
    Ok(())
}

fn action_jump_to_location(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let Some(location) = convert_location(ctx.param(0)?) else {
        debug!("ActionJumpToLocation: not a location");
        return Ok(());
    };
    let Some(area) = location.area() else {
        warn!("ActionJumpToLocation: location has no area");
        return Ok(());
    };
    let caller = ctx.caller();
    if !module.jump_to(caller, area, location.position()) {
        return Ok(());
    }
    if let Some(object) = convert_object_mut(module, caller) {
        object.base_mut().set_facing(location.facing());
    }
    Ok(())
}

/// The area parameter must name a loaded area; anything else gives a location
/// without one.
fn location(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let area = ctx.object(0)?;
    let area = convert_area(module, area).map(|_| area);
    let location = Location::new(area, ctx.vector(1)?, ctx.float(2)?);
    ctx.set_return(location);
    Ok(())
}

fn get_is_pc(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let is_pc = convert_pc(module, ctx.object(0)?).is_some();
    ctx.set_return(is_pc);
    Ok(())
}

fn feet_to_meters(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let meters = ctx.float(0)? * 0.3048;
    ctx.set_return(meters);
    Ok(())
}

fn yards_to_meters(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let meters = ctx.float(0)? * 0.9144;
    ctx.set_return(meters);
    Ok(())
}

fn speak_string(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    speak(module, ctx.caller(), ctx.string(0)?);
    Ok(())
}

fn get_position_from_location(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let position = convert_location(ctx.param(0)?)
        .map(|location| location.position())
        .unwrap_or(Vec3::ZERO);
    ctx.set_return(position);
    Ok(())
}

fn get_area_from_location(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let area = convert_location(ctx.param(0)?)
        .and_then(|location| location.area())
        .filter(|area| module.is_area(*area))
        .unwrap_or(ObjectId::INVALID);
    ctx.set_return(area);
    Ok(())
}

fn get_facing_from_location(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let facing = convert_location(ctx.param(0)?).map_or(0.0, |location| location.facing());
    ctx.set_return(facing);
    Ok(())
}

fn get_nearest_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let object_type = ObjectType::from_script(ctx.int(0)?);
    let target = object_or_caller(ctx, 1);
    let nth = ctx.int(2)?;
    let nearest = nearest_to(module, target, nth, |object| {
        object.object_type().intersects(object_type)
    });
    ctx.set_return(nearest);
    Ok(())
}

fn get_nearest_object_to_location(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let object_type = ObjectType::from_script(ctx.int(0)?);
    let nth = ctx.int(2)?;
    let nearest = convert_location(ctx.param(1)?)
        .and_then(|location| Some((location.area()?, location.position())))
        .filter(|(area, _)| module.is_area(*area))
        .map_or(ObjectId::INVALID, |(area, position)| {
            let found = module.nearest_objects(area, position, ObjectId::INVALID, |object| {
                object.object_type().intersects(object_type)
            });
            pick_nth(&found, nth)
        });
    ctx.set_return(nearest);
    Ok(())
}

fn get_nearest_object_by_tag(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let tag = ctx.string(0)?;
    let target = object_or_caller(ctx, 1);
    let nth = ctx.int(2)?;
    let nearest = nearest_to(module, target, nth, |object| object.base().has_tag(tag));
    ctx.set_return(nearest);
    Ok(())
}

fn int_to_float(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = ctx.int(0)? as f32;
    ctx.set_return(value);
    Ok(())
}

fn float_to_int(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = ctx.float(0)? as i32;
    ctx.set_return(value);
    Ok(())
}

fn string_to_int(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = parse_leading_int(ctx.string(0)?);
    ctx.set_return(value);
    Ok(())
}

fn string_to_float(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = parse_leading_float(ctx.string(0)?);
    ctx.set_return(value);
    Ok(())
}

/// `sscanf("%d")`: optional whitespace and sign, then digits. Anything else
/// reads as 0.
fn parse_leading_int(text: &str) -> i32 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = digits[..end].bytes().fold(0i64, |value, digit| {
        (value * 10 + i64::from(digit - b'0')).min(i64::from(i32::MAX) + 1)
    });
    let value = if negative { -magnitude } else { magnitude };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// `sscanf("%f")`: the longest leading run that reads as a number.
fn parse_leading_float(text: &str) -> f32 {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(text.len());
    let candidate = &text[..end];
    (1..=candidate.len())
        .rev()
        .find_map(|len| candidate[..len].parse::<f32>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

fn get_pc_speaker(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let speaker = convert_object(module, ctx.caller())
        .and_then(|object| object.base().pc_speaker())
        .unwrap_or(ObjectId::INVALID);
    ctx.set_return(speaker);
    Ok(())
}

fn get_string_by_str_ref(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let gender = Gender::from_script(ctx.int(1)?);
    let text = u32::try_from(ctx.int(0)?)
        .map(|strref| module.services().talk.get_string(strref, gender))
        .unwrap_or_default();
    ctx.set_return(text);
    Ok(())
}

fn destroy_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let id = ctx.object(0)?;
    let delay = ctx.float(1)?;
    if convert_object(module, id).is_none() {
        debug!("DestroyObject: stale object {id}");
        return Ok(());
    }
    module.delay_destroy(id, (delay.max(0.0) * 1000.0) as u64);
    Ok(())
}

fn get_module(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    ctx.set_return(module.module_id());
    Ok(())
}

fn create_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let object_type = ObjectType::from_script(ctx.int(0)?);
    let template = ctx.string(1)?;
    let Some(location) = convert_location(ctx.param(2)?) else {
        debug!("CreateObject {template}: not a location");
        return Ok(());
    };
    let created = match module.create_object(object_type, template, &location, ctx.string(4)?) {
        Ok(id) => id,
        Err(err) => {
            warn!("CreateObject {template} failed: {err:#}");
            ObjectId::INVALID
        }
    };
    ctx.set_return(created);
    Ok(())
}

fn get_name(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let name = convert_object(module, ctx.object(0)?)
        .map(|object| object.base().name().to_string())
        .unwrap_or_default();
    ctx.set_return(name);
    Ok(())
}

/// The caller talks with the given object, else the triggerer, else the PC.
/// Whichever side is a PC takes the PC role.
fn begin_conversation(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let caller = ctx.caller();
    let other = [ctx.object(1)?, ctx.triggerer()]
        .into_iter()
        .find(|id| convert_object(module, *id).is_some())
        .or_else(|| module.pc())
        .unwrap_or(ObjectId::INVALID);
    let (pc, object) = if convert_pc(module, other).is_some() {
        (other, caller)
    } else {
        (caller, other)
    };
    let started = module.start_conversation(ctx.string(0)?, pc, object);
    ctx.set_return(started);
    Ok(())
}

fn delete_local(
    module: &mut Module,
    ctx: &FunctionContext,
    delete: fn(&mut Locals, &str),
) -> Result<()> {
    if let Some(object) = convert_object_mut(module, ctx.object(0)?) {
        delete(object.base_mut().locals_mut(), ctx.string(1)?);
    }
    Ok(())
}

fn delete_local_int(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    delete_local(module, ctx, Locals::delete_int)
}

fn delete_local_float(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    delete_local(module, ctx, Locals::delete_float)
}

fn delete_local_string(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    delete_local(module, ctx, Locals::delete_string)
}

fn delete_local_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    delete_local(module, ctx, Locals::delete_object)
}

fn delete_local_location(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    delete_local(module, ctx, Locals::delete_location)
}

fn object_to_string(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let text = ctx.object(0)?.to_string();
    ctx.set_return(text);
    Ok(())
}

fn set_custom_token(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    module.set_custom_token(ctx.int(0)?, ctx.string(1)?);
    Ok(())
}

fn action_do_command(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let state = ctx.script_state(0)?.clone();
    if ctx.script_name().is_empty() {
        bail!("ActionDoCommand outside of a script");
    }
    module.delay_script(ctx.script_name(), Some(state), ctx.caller(), ctx.triggerer(), 0);
    Ok(())
}

// Locations in different areas, or in one that is not loaded, are 0 apart.
fn get_distance_between_locations(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let a = convert_location(ctx.param(0)?);
    let b = convert_location(ctx.param(1)?);
    let distance = match (a, b) {
        (Some(a), Some(b))
            if a.area() == b.area()
                && a.area().and_then(|area| convert_area(module, area)).is_some() =>
        {
            a.position().distance(b.position())
        }
        _ => 0.0,
    };
    ctx.set_return(distance);
    Ok(())
}

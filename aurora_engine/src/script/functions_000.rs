//! Functions 0 to 99: randomness, printing, command queueing, locals,
//! strings and math.

use anyhow::{bail, Result};
use aurora_nwscript::{FunctionContext, ObjectId, RegistrationError, Type as T};
use glam::Vec3;
use log::debug;

use super::convert::{
    convert_area, convert_creature, convert_door_mut, convert_object, convert_object_mut,
    object_or_caller,
};
use super::{
    float_to_string as format_float, nearest_to, print, random as roll, roll_dice, speak,
    unimplemented, Defaults, Registrar,
};
use crate::module::Module;
use crate::object::Object;

pub(super) fn register(r: &mut Registrar, d: &Defaults) -> Result<(), RegistrationError> {
    r.reg("Random", 0, random, T::Int, &[T::Int], &[])?;
    r.reg("PrintString", 1, print_string, T::Void, &[T::String], &[])?;
    r.reg(
        "PrintFloat",
        2,
        print_float,
        T::Void,
        &[T::Float, T::Int, T::Int],
        &[&d.int18, &d.int9],
    )?;
    r.reg(
        "FloatToString",
        3,
        float_to_string,
        T::String,
        &[T::Float, T::Int, T::Int],
        &[&d.int18, &d.int9],
    )?;
    r.reg("PrintInteger", 4, print_integer, T::Void, &[T::Int], &[])?;
    r.reg("PrintObject", 5, print_object, T::Void, &[T::Object], &[])?;
    r.reg("AssignCommand", 6, assign_command, T::Void, &[T::Object, T::ScriptState], &[])?;
    r.reg("DelayCommand", 7, delay_command, T::Void, &[T::Float, T::ScriptState], &[])?;
    r.reg("ExecuteScript", 8, execute_script, T::Void, &[T::String, T::Object], &[])?;
    r.reg("ClearAllActions", 9, clear_all_actions, T::Void, &[T::Int], &[&d.int0])?;
    r.reg("SetFacing", 10, set_facing, T::Void, &[T::Float], &[])?;
    r.reg("SetCalendar", 11, unimplemented, T::Void, &[T::Int, T::Int, T::Int], &[])?;
    r.reg("SetTime", 12, unimplemented, T::Void, &[T::Int, T::Int, T::Int, T::Int], &[])?;
    r.reg("GetCalendarYear", 13, unimplemented, T::Int, &[], &[])?;
    r.reg("GetCalendarMonth", 14, unimplemented, T::Int, &[], &[])?;
    r.reg("GetCalendarDay", 15, unimplemented, T::Int, &[], &[])?;
    r.reg("GetTimeHour", 16, unimplemented, T::Int, &[], &[])?;
    r.reg("GetTimeMinute", 17, unimplemented, T::Int, &[], &[])?;
    r.reg("GetTimeSecond", 18, unimplemented, T::Int, &[], &[])?;
    r.reg("GetTimeMillisecond", 19, unimplemented, T::Int, &[], &[])?;
    r.reg("ActionRandomWalk", 20, unimplemented, T::Void, &[], &[])?;
    r.reg(
        "ActionMoveToLocation",
        21,
        unimplemented,
        T::Void,
        &[T::EngineType, T::Int],
        &[&d.int0],
    )?;
    r.reg(
        "ActionMoveToObject",
        22,
        unimplemented,
        T::Void,
        &[T::Object, T::Int, T::Float],
        &[&d.int0, &d.float1],
    )?;
    r.reg(
        "ActionMoveAwayFromObject",
        23,
        unimplemented,
        T::Void,
        &[T::Object, T::Int, T::Float],
        &[&d.int0, &d.float40],
    )?;
    r.reg("GetArea", 24, get_area, T::Object, &[T::Object], &[])?;
    r.reg("GetEnteringObject", 25, get_entering_object, T::Object, &[], &[])?;
    r.reg("GetExitingObject", 26, get_exiting_object, T::Object, &[], &[])?;
    r.reg("GetPosition", 27, get_position, T::Vector, &[T::Object], &[])?;
    r.reg("GetFacing", 28, get_facing, T::Float, &[T::Object], &[])?;
    r.reg("GetItemPossessor", 29, unimplemented, T::Object, &[T::Object], &[])?;
    r.reg("GetItemPossessedBy", 30, unimplemented, T::Object, &[T::Object, T::String], &[])?;
    r.reg(
        "CreateItemOnObject",
        31,
        unimplemented,
        T::Object,
        &[T::String, T::Object, T::Int, T::String],
        &[&d.object0, &d.int1, &d.string_empty],
    )?;
    r.reg("ActionEquipItem", 32, unimplemented, T::Void, &[T::Object, T::Int], &[])?;
    r.reg("ActionUnequipItem", 33, unimplemented, T::Void, &[T::Object], &[])?;
    r.reg("ActionPickUpItem", 34, unimplemented, T::Void, &[T::Object], &[])?;
    r.reg("ActionPutDownItem", 35, unimplemented, T::Void, &[T::Object], &[])?;
    r.reg("GetLastAttacker", 36, unimplemented, T::Object, &[T::Object], &[&d.object0])?;
    r.reg("ActionAttack", 37, unimplemented, T::Void, &[T::Object, T::Int], &[&d.int0])?;
    r.reg(
        "GetNearestCreature",
        38,
        get_nearest_creature,
        T::Object,
        &[T::Int, T::Int, T::Object, T::Int, T::Int, T::Int, T::Int, T::Int],
        &[&d.object0, &d.int1, &d.intm1, &d.intm1, &d.intm1, &d.intm1],
    )?;
    r.reg(
        "ActionSpeakString",
        39,
        action_speak_string,
        T::Void,
        &[T::String, T::Int],
        &[&d.int_talk],
    )?;
    r.reg(
        "ActionPlayAnimation",
        40,
        unimplemented,
        T::Void,
        &[T::Int, T::Float, T::Float],
        &[&d.float1, &d.float0],
    )?;
    r.reg("GetDistanceToObject", 41, get_distance_to_object, T::Float, &[T::Object], &[])?;
    r.reg("GetIsObjectValid", 42, get_is_object_valid, T::Int, &[T::Object], &[])?;
    r.reg("ActionOpenDoor", 43, action_open_door, T::Void, &[T::Object], &[])?;
    r.reg("ActionCloseDoor", 44, action_close_door, T::Void, &[T::Object], &[])?;
    r.reg(
        "SetCameraFacing",
        45,
        unimplemented,
        T::Void,
        &[T::Float, T::Float, T::Float, T::Int],
        &[&d.floatm1, &d.floatm1, &d.int_camera_snap],
    )?;
    r.reg("PlaySound", 46, unimplemented, T::Void, &[T::String], &[])?;
    r.reg("GetSpellTargetObject", 47, unimplemented, T::Object, &[], &[])?;
    r.reg(
        "ActionCastSpellAtObject",
        48,
        unimplemented,
        T::Void,
        &[T::Int, T::Object, T::Int, T::Int, T::Int, T::Int, T::Int],
        &[&d.int_meta_magic_any, &d.int0, &d.int0, &d.int_proj_path_default, &d.int0],
    )?;
    r.reg("GetCurrentHitPoints", 49, get_current_hit_points, T::Int, &[T::Object], &[&d.object0])?;
    r.reg("GetMaxHitPoints", 50, get_max_hit_points, T::Int, &[T::Object], &[&d.object0])?;
    r.reg("GetLocalInt", 51, get_local_int, T::Int, &[T::Object, T::String], &[])?;
    r.reg("GetLocalFloat", 52, get_local_float, T::Float, &[T::Object, T::String], &[])?;
    r.reg("GetLocalString", 53, get_local_string, T::String, &[T::Object, T::String], &[])?;
    r.reg("GetLocalObject", 54, get_local_object, T::Object, &[T::Object, T::String], &[])?;
    r.reg("SetLocalInt", 55, set_local_int, T::Void, &[T::Object, T::String, T::Int], &[])?;
    r.reg("SetLocalFloat", 56, set_local_float, T::Void, &[T::Object, T::String, T::Float], &[])?;
    r.reg(
        "SetLocalString",
        57,
        set_local_string,
        T::Void,
        &[T::Object, T::String, T::String],
        &[],
    )?;
    r.reg(
        "SetLocalObject",
        58,
        set_local_object,
        T::Void,
        &[T::Object, T::String, T::Object],
        &[],
    )?;
    r.reg("GetStringLength", 59, get_string_length, T::Int, &[T::String], &[])?;
    r.reg("GetStringUpperCase", 60, get_string_upper_case, T::String, &[T::String], &[])?;
    r.reg("GetStringLowerCase", 61, get_string_lower_case, T::String, &[T::String], &[])?;
    r.reg("GetStringRight", 62, get_string_right, T::String, &[T::String, T::Int], &[])?;
    r.reg("GetStringLeft", 63, get_string_left, T::String, &[T::String, T::Int], &[])?;
    r.reg("InsertString", 64, insert_string, T::String, &[T::String, T::String, T::Int], &[])?;
    r.reg("GetSubString", 65, get_sub_string, T::String, &[T::String, T::Int, T::Int], &[])?;
    r.reg(
        "FindSubString",
        66,
        find_sub_string,
        T::Int,
        &[T::String, T::String, T::Int],
        &[&d.int0],
    )?;
    r.reg("fabs", 67, fabs, T::Float, &[T::Float], &[])?;
    r.reg("cos", 68, cos, T::Float, &[T::Float], &[])?;
    r.reg("sin", 69, sin, T::Float, &[T::Float], &[])?;
    r.reg("tan", 70, tan, T::Float, &[T::Float], &[])?;
    r.reg("acos", 71, acos, T::Float, &[T::Float], &[])?;
    r.reg("asin", 72, asin, T::Float, &[T::Float], &[])?;
    r.reg("atan", 73, atan, T::Float, &[T::Float], &[])?;
    r.reg("log", 74, natural_log, T::Float, &[T::Float], &[])?;
    r.reg("pow", 75, pow, T::Float, &[T::Float, T::Float], &[])?;
    r.reg("sqrt", 76, sqrt, T::Float, &[T::Float], &[])?;
    r.reg("abs", 77, abs, T::Int, &[T::Int], &[])?;
    r.reg("EffectHeal", 78, unimplemented, T::EngineType, &[T::Int], &[])?;
    r.reg(
        "EffectDamage",
        79,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Int, T::Int],
        &[&d.int_damage_magical, &d.int_damage_normal],
    )?;
    r.reg("EffectAbilityIncrease", 80, unimplemented, T::EngineType, &[T::Int, T::Int], &[])?;
    r.reg(
        "EffectDamageResistance",
        81,
        unimplemented,
        T::EngineType,
        &[T::Int, T::Int, T::Int],
        &[&d.int0],
    )?;
    r.reg("EffectResurrection", 82, unimplemented, T::EngineType, &[], &[])?;
    r.reg(
        "EffectSummonCreature",
        83,
        unimplemented,
        T::EngineType,
        &[T::String, T::Int, T::Float, T::Int],
        &[&d.int_vfx_none, &d.float0, &d.int0],
    )?;
    r.reg("GetCasterLevel", 84, unimplemented, T::Int, &[T::Object], &[])?;
    r.reg("GetFirstEffect", 85, unimplemented, T::EngineType, &[T::Object], &[])?;
    r.reg("GetNextEffect", 86, unimplemented, T::EngineType, &[T::Object], &[])?;
    r.reg("RemoveEffect", 87, unimplemented, T::Void, &[T::Object, T::EngineType], &[])?;
    r.reg("GetIsEffectValid", 88, unimplemented, T::Int, &[T::EngineType], &[])?;
    r.reg("GetEffectDurationType", 89, unimplemented, T::Int, &[T::EngineType], &[])?;
    r.reg("GetEffectSubType", 90, unimplemented, T::Int, &[T::EngineType], &[])?;
    r.reg("GetEffectCreator", 91, unimplemented, T::Object, &[T::EngineType], &[])?;
    r.reg("IntToString", 92, int_to_string, T::String, &[T::Int], &[])?;
    r.reg(
        "GetFirstObjectInArea",
        93,
        get_first_object_in_area,
        T::Object,
        &[T::Object],
        &[&d.object0],
    )?;
    r.reg(
        "GetNextObjectInArea",
        94,
        get_next_object_in_area,
        T::Object,
        &[T::Object],
        &[&d.object0],
    )?;
    r.reg("d2", 95, d2, T::Int, &[T::Int], &[&d.int1])?;
    r.reg("d3", 96, d3, T::Int, &[T::Int], &[&d.int1])?;
    r.reg("d4", 97, d4, T::Int, &[T::Int], &[&d.int1])?;
    r.reg("d6", 98, d6, T::Int, &[T::Int], &[&d.int1])?;
    r.reg("d8", 99, d8, T::Int, &[T::Int], &[&d.int1])?;
    Ok(())
}

fn random(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let max = ctx.int(0)?;
    let value = if max <= 0 {
        0
    } else {
        roll(module.rng_mut(), 0, max - 1, 1)
    };
    ctx.set_return(value);
    Ok(())
}

fn print_string(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    print(module, ctx.string(0)?);
    Ok(())
}

fn print_float(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let text = format_float(ctx.float(0)?, ctx.int(1)?, ctx.int(2)?);
    print(module, &text);
    Ok(())
}

fn float_to_string(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let text = format_float(ctx.float(0)?, ctx.int(1)?, ctx.int(2)?);
    ctx.set_return(text);
    Ok(())
}

fn print_integer(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    print(module, &ctx.int(0)?.to_string());
    Ok(())
}

fn print_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    print(module, &ctx.object(0)?.to_string());
    Ok(())
}

fn assign_command(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let subject = ctx.object(0)?;
    let state = ctx.script_state(1)?.clone();
    if ctx.script_name().is_empty() {
        bail!("AssignCommand outside of a script");
    }
    if convert_object(module, subject).is_none() {
        debug!("AssignCommand: stale subject {subject}");
        return Ok(());
    }
    module.delay_script(ctx.script_name(), Some(state), subject, ctx.triggerer(), 0);
    Ok(())
}

fn delay_command(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let delay = ctx.float(0)?;
    let state = ctx.script_state(1)?.clone();
    if ctx.script_name().is_empty() {
        bail!("DelayCommand outside of a script");
    }
    let delay_ms = (delay.max(0.0) * 1000.0) as u64;
    module.delay_script(
        ctx.script_name(),
        Some(state),
        ctx.caller(),
        ctx.triggerer(),
        delay_ms,
    );
    Ok(())
}

fn execute_script(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let script = ctx.string(0)?;
    let target = ctx.object(1)?;
    if convert_object(module, target).is_none() {
        debug!("ExecuteScript {script}: stale target {target}");
        return Ok(());
    }
    module.run_script(script, None, target, ctx.caller())
}

fn clear_all_actions(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    debug!("ClearAllActions on {}: no action queue per object", ctx.caller());
    Ok(())
}

fn set_facing(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let facing = ctx.float(0)?;
    if let Some(object) = convert_object_mut(module, ctx.caller()) {
        object.base_mut().set_facing(facing);
    }
    Ok(())
}

fn get_area(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let area = match convert_object(module, ctx.object(0)?) {
        Some(Object::Area(area)) => area.base().id(),
        Some(object) => object.base().area().unwrap_or(ObjectId::INVALID),
        None => ObjectId::INVALID,
    };
    ctx.set_return(area);
    Ok(())
}

fn get_entering_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    ctx.set_return(module.entering_object());
    Ok(())
}

fn get_exiting_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    ctx.set_return(module.exiting_object());
    Ok(())
}

fn get_position(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let position = convert_object(module, ctx.object(0)?)
        .map(|object| object.base().position())
        .unwrap_or(Vec3::ZERO);
    ctx.set_return(position);
    Ok(())
}

fn get_facing(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let facing = convert_object(module, ctx.object(0)?)
        .map(|object| object.base().facing())
        .unwrap_or(0.0);
    ctx.set_return(facing);
    Ok(())
}

// The criteria pairs are not evaluated yet; any creature qualifies.
fn get_nearest_creature(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let target = object_or_caller(ctx, 2);
    let nth = ctx.int(3)?;
    let nearest = nearest_to(module, target, nth, |object| object.as_creature().is_some());
    ctx.set_return(nearest);
    Ok(())
}

fn action_speak_string(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    speak(module, ctx.caller(), ctx.string(0)?);
    Ok(())
}

fn get_distance_to_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let from = convert_object(module, ctx.caller()).map(Object::base);
    let to = convert_object(module, ctx.object(0)?).map(Object::base);
    let distance = match (from, to) {
        (Some(from), Some(to)) if from.area().is_some() && from.area() == to.area() => {
            from.position().distance(to.position())
        }
        _ => -1.0,
    };
    ctx.set_return(distance);
    Ok(())
}

fn get_is_object_valid(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let valid = convert_object(module, ctx.object(0)?).is_some();
    ctx.set_return(valid);
    Ok(())
}

fn action_open_door(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    set_door_open(module, ctx.object(0)?, ctx.caller(), true);
    Ok(())
}

fn action_close_door(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    set_door_open(module, ctx.object(0)?, ctx.caller(), false);
    Ok(())
}

fn set_door_open(module: &mut Module, id: ObjectId, caller: ObjectId, open: bool) {
    let Some(door) = convert_door_mut(module, id) else {
        debug!("{id} is not a door");
        return;
    };
    if open && door.is_locked() {
        module.run_hook(id, "OnFailToOpen", caller);
        return;
    }
    if door.is_open() == open {
        return;
    }
    door.set_open(open);
    let tag = door.tag().to_string();
    let (event, hook) = if open {
        ("open", "OnOpen")
    } else {
        ("close", "OnClosed")
    };
    module.log_event(format!("door.{event} {tag}"));
    module.run_hook(id, hook, caller);
}

fn get_current_hit_points(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let hp = convert_creature(module, object_or_caller(ctx, 0))
        .map(|creature| creature.current_hp())
        .unwrap_or(0);
    ctx.set_return(hp);
    Ok(())
}

fn get_max_hit_points(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let hp = convert_creature(module, object_or_caller(ctx, 0))
        .map(|creature| creature.max_hp())
        .unwrap_or(0);
    ctx.set_return(hp);
    Ok(())
}

fn get_local_int(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let name = ctx.string(1)?;
    let value = convert_object(module, ctx.object(0)?)
        .map(|object| object.base().locals().get_int(name))
        .unwrap_or(0);
    ctx.set_return(value);
    Ok(())
}

fn get_local_float(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let name = ctx.string(1)?;
    let value = convert_object(module, ctx.object(0)?)
        .map(|object| object.base().locals().get_float(name))
        .unwrap_or(0.0);
    ctx.set_return(value);
    Ok(())
}

fn get_local_string(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let name = ctx.string(1)?;
    let value = convert_object(module, ctx.object(0)?)
        .map(|object| object.base().locals().get_string(name).to_string())
        .unwrap_or_default();
    ctx.set_return(value);
    Ok(())
}

fn get_local_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let name = ctx.string(1)?;
    let value = convert_object(module, ctx.object(0)?)
        .map(|object| object.base().locals().get_object(name))
        .unwrap_or(ObjectId::INVALID);
    ctx.set_return(value);
    Ok(())
}

fn set_local_int(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = ctx.int(2)?;
    if let Some(object) = convert_object_mut(module, ctx.object(0)?) {
        object.base_mut().locals_mut().set_int(ctx.string(1)?, value);
    }
    Ok(())
}

fn set_local_float(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = ctx.float(2)?;
    if let Some(object) = convert_object_mut(module, ctx.object(0)?) {
        object.base_mut().locals_mut().set_float(ctx.string(1)?, value);
    }
    Ok(())
}

fn set_local_string(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    if let Some(object) = convert_object_mut(module, ctx.object(0)?) {
        object
            .base_mut()
            .locals_mut()
            .set_string(ctx.string(1)?, ctx.string(2)?);
    }
    Ok(())
}

fn set_local_object(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = ctx.object(2)?;
    if let Some(object) = convert_object_mut(module, ctx.object(0)?) {
        object.base_mut().locals_mut().set_object(ctx.string(1)?, value);
    }
    Ok(())
}

fn get_string_length(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let length = ctx.string(0)?.chars().count();
    ctx.set_return(i32::try_from(length).unwrap_or(i32::MAX));
    Ok(())
}

fn get_string_upper_case(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let upper = ctx.string(0)?.to_uppercase();
    ctx.set_return(upper);
    Ok(())
}

fn get_string_lower_case(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let lower = ctx.string(0)?.to_lowercase();
    ctx.set_return(lower);
    Ok(())
}

fn get_string_right(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let text = ctx.string(0)?;
    let count = char_count(ctx.int(1)?);
    let skip = text.chars().count().saturating_sub(count);
    let right: String = text.chars().skip(skip).collect();
    ctx.set_return(right);
    Ok(())
}

fn get_string_left(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let left: String = ctx.string(0)?.chars().take(char_count(ctx.int(1)?)).collect();
    ctx.set_return(left);
    Ok(())
}

fn insert_string(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let destination = ctx.string(0)?;
    let insert = ctx.string(1)?;
    let at = char_count(ctx.int(2)?).min(destination.chars().count());
    let mut result: String = destination.chars().take(at).collect();
    result.push_str(insert);
    result.extend(destination.chars().skip(at));
    ctx.set_return(result);
    Ok(())
}

fn get_sub_string(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let text = ctx.string(0)?;
    let start = ctx.int(1)?;
    let count = char_count(ctx.int(2)?);
    let sub: String = if start < 0 {
        String::new()
    } else {
        text.chars().skip(char_count(start)).take(count).collect()
    };
    ctx.set_return(sub);
    Ok(())
}

fn find_sub_string(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let text: Vec<char> = ctx.string(0)?.chars().collect();
    let needle: Vec<char> = ctx.string(1)?.chars().collect();
    let start = char_count(ctx.int(2)?);
    let found = if needle.is_empty() || start >= text.len() {
        None
    } else {
        text[start..]
            .windows(needle.len())
            .position(|window| window == needle.as_slice())
            .map(|offset| start + offset)
    };
    ctx.set_return(found.map_or(-1, |index| i32::try_from(index).unwrap_or(-1)));
    Ok(())
}

/// A script-supplied count or index; negative means zero.
fn char_count(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

fn math(ctx: &mut FunctionContext, op: fn(f32) -> f32) -> Result<()> {
    let value = op(ctx.float(0)?);
    ctx.set_return(if value.is_finite() { value } else { 0.0 });
    Ok(())
}

fn fabs(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    math(ctx, f32::abs)
}

fn cos(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    math(ctx, f32::cos)
}

fn sin(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    math(ctx, f32::sin)
}

fn tan(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    math(ctx, f32::tan)
}

fn acos(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    math(ctx, f32::acos)
}

fn asin(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    math(ctx, f32::asin)
}

fn atan(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    math(ctx, f32::atan)
}

fn natural_log(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    math(ctx, f32::ln)
}

fn sqrt(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    math(ctx, f32::sqrt)
}

fn pow(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = ctx.float(0)?.powf(ctx.float(1)?);
    ctx.set_return(if value.is_finite() { value } else { 0.0 });
    Ok(())
}

fn abs(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let value = ctx.int(0)?.wrapping_abs();
    ctx.set_return(value);
    Ok(())
}

fn int_to_string(_module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let text = ctx.int(0)?.to_string();
    ctx.set_return(text);
    Ok(())
}

/// The area parameter, or the caller's area when it names no area.
fn area_or_caller_area(module: &Module, ctx: &FunctionContext) -> Result<ObjectId> {
    let area = ctx.object(0)?;
    if convert_area(module, area).is_some() {
        return Ok(area);
    }
    Ok(convert_object(module, ctx.caller())
        .and_then(|caller| caller.base().area())
        .unwrap_or(ObjectId::INVALID))
}

fn get_first_object_in_area(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let area = area_or_caller_area(module, ctx)?;
    let first = module.first_object_in_area(ctx.caller(), area);
    ctx.set_return(first);
    Ok(())
}

fn get_next_object_in_area(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    let area = area_or_caller_area(module, ctx)?;
    let next = module.next_object_in_area(ctx.caller(), area);
    ctx.set_return(next);
    Ok(())
}

fn d2(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    roll_dice(module, ctx, 2)
}

fn d3(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    roll_dice(module, ctx, 3)
}

fn d4(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    roll_dice(module, ctx, 4)
}

fn d6(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    roll_dice(module, ctx, 6)
}

fn d8(module: &mut Module, ctx: &mut FunctionContext) -> Result<()> {
    roll_dice(module, ctx, 8)
}

#[cfg(test)]
mod tests {
    use aurora_nwscript::{ObjectId, ScriptState, Variable};
    use glam::Vec3;

    use crate::script::convert::convert_door;
    use crate::script::fixture::World;

    fn string(world: &mut World, name: &str, params: Vec<Variable>) -> String {
        let pc = world.pc();
        world
            .call(name, params, pc)
            .as_str()
            .expect("string result")
            .to_string()
    }

    fn state() -> Variable {
        Variable::from(ScriptState {
            offset: 40,
            stack: Vec::new(),
        })
    }

    #[test]
    fn random_stays_below_its_bound() {
        let mut world = World::new();
        let pc = world.pc();
        for _ in 0..100 {
            let roll = world.call("Random", vec![Variable::Int(10)], pc).as_int();
            assert!((0..10).contains(&roll.unwrap()));
        }
        assert_eq!(world.call("Random", vec![Variable::Int(0)], pc).as_int(), Ok(0));
        assert_eq!(world.call("Random", vec![Variable::Int(-4)], pc).as_int(), Ok(0));
        for _ in 0..20 {
            let roll = world.call("d6", vec![Variable::Int(3)], pc).as_int().unwrap();
            assert!((3..=18).contains(&roll));
        }
    }

    #[test]
    fn string_functions_work_on_characters() {
        let mut world = World::new();
        let s = |text: &str| Variable::from(text);
        assert_eq!(string(&mut world, "GetStringRight", vec![s("hello"), 3.into()]), "llo");
        assert_eq!(string(&mut world, "GetStringLeft", vec![s("hello"), 10.into()]), "hello");
        assert_eq!(string(&mut world, "GetStringLeft", vec![s("hello"), (-1).into()]), "");
        assert_eq!(
            string(&mut world, "GetSubString", vec![s("hello"), 1.into(), 3.into()]),
            "ell"
        );
        assert_eq!(
            string(&mut world, "GetSubString", vec![s("hello"), (-1).into(), 3.into()]),
            ""
        );
        assert_eq!(
            string(&mut world, "InsertString", vec![s("hllo"), s("e"), 1.into()]),
            "hello"
        );
        assert_eq!(
            string(&mut world, "InsertString", vec![s("hell"), s("o"), 99.into()]),
            "hello"
        );
        assert_eq!(string(&mut world, "GetStringUpperCase", vec![s("Mixed")]), "MIXED");
        assert_eq!(string(&mut world, "GetStringLowerCase", vec![s("Mixed")]), "mixed");
        assert_eq!(string(&mut world, "IntToString", vec![(-12).into()]), "-12");
        assert_eq!(
            string(&mut world, "FloatToString", vec![3.14159f32.into(), 0.into(), 2.into()]),
            "3.14"
        );

        let pc = world.pc();
        let find = |world: &mut World, params: Vec<Variable>| {
            world.call("FindSubString", params, pc).as_int().unwrap()
        };
        assert_eq!(find(&mut world, vec![s("banana"), s("an")]), 1);
        assert_eq!(find(&mut world, vec![s("banana"), s("an"), 2.into()]), 3);
        assert_eq!(find(&mut world, vec![s("banana"), s("x")]), -1);
        assert_eq!(
            world.call("GetStringLength", vec![s("h\u{e9}llo")], pc).as_int(),
            Ok(5)
        );
    }

    #[test]
    fn math_results_stay_finite() {
        let mut world = World::new();
        let pc = world.pc();
        let mut float = |name: &str, params: Vec<Variable>| {
            world.call(name, params, pc).as_float().unwrap()
        };
        assert_eq!(float("sqrt", vec![(-1.0f32).into()]), 0.0);
        assert_eq!(float("sqrt", vec![16.0f32.into()]), 4.0);
        assert_eq!(float("pow", vec![2.0f32.into(), 10.0f32.into()]), 1024.0);
        assert_eq!(float("log", vec![1.0f32.into()]), 0.0);
        assert_eq!(float("log", vec![0.0f32.into()]), 0.0);
        assert_eq!(float("fabs", vec![(-2.5f32).into()]), 2.5);
        assert_eq!(float("acos", vec![2.0f32.into()]), 0.0);
        assert_eq!(world.call("abs", vec![(-3).into()], pc).as_int(), Ok(3));
    }

    #[test]
    fn locals_live_on_any_object() {
        let mut world = World::new();
        let pc = world.pc();
        let npc = world.tagged("NPC", 0);
        let module = world.module.module_id();
        let yard = world.yard();

        for holder in [npc, module, yard] {
            world.call(
                "SetLocalInt",
                vec![holder.into(), "count".into(), 4.into()],
                pc,
            );
            world.call(
                "SetLocalString",
                vec![holder.into(), "word".into(), "hi".into()],
                pc,
            );
            world.call(
                "SetLocalObject",
                vec![holder.into(), "who".into(), pc.into()],
                pc,
            );
            let count = world.call("GetLocalInt", vec![holder.into(), "count".into()], pc);
            assert_eq!(count.as_int(), Ok(4));
            let word = world.call("GetLocalString", vec![holder.into(), "word".into()], pc);
            assert_eq!(word.as_str(), Ok("hi"));
            let who = world.call("GetLocalObject", vec![holder.into(), "who".into()], pc);
            assert_eq!(who.as_object(), Ok(pc));
        }

        world.call("SetLocalFloat", vec![npc.into(), "f".into(), 1.5f32.into()], pc);
        let value = world.call("GetLocalFloat", vec![npc.into(), "f".into()], pc);
        assert_eq!(value.as_float(), Ok(1.5));
        let missing = world.call("GetLocalInt", vec![npc.into(), "nothing".into()], pc);
        assert_eq!(missing.as_int(), Ok(0));
    }

    #[test]
    fn locals_on_stale_objects_read_defaults() {
        let mut world = World::new();
        let pc = world.pc();
        let npc = world.tagged("NPC", 0);
        world.call("SetLocalInt", vec![npc.into(), "n".into(), 9.into()], pc);
        assert!(world.module.destroy_object(npc));

        world.call("SetLocalInt", vec![npc.into(), "n".into(), 3.into()], pc);
        let value = world.call("GetLocalInt", vec![npc.into(), "n".into()], pc);
        assert_eq!(value.as_int(), Ok(0));
        let word = world.call("GetLocalString", vec![npc.into(), "n".into()], pc);
        assert_eq!(word.as_str(), Ok(""));
        let who = world.call("GetLocalObject", vec![npc.into(), "n".into()], pc);
        assert_eq!(who.as_object(), Ok(ObjectId::INVALID));
    }

    #[test]
    fn delay_command_queues_the_caller() {
        let mut world = World::new();
        let npc = world.tagged("NPC", 0);
        world.call("DelayCommand", vec![1.5f32.into(), state()], npc);
        world.call("DelayCommand", vec![(-2.0f32).into(), state()], npc);

        assert_eq!(world.module.actions().len(), 2);
        assert_eq!(world.module.actions().next_due(), Some(1_000));
        assert_eq!(world.module.process_actions(), 1);
        world.clock.advance(1_499);
        assert_eq!(world.module.process_actions(), 0);
        world.clock.advance(1);
        assert_eq!(world.module.process_actions(), 1);

        let runs = world.take_runs();
        assert_eq!(runs.len(), 2);
        assert!(runs
            .iter()
            .all(|(script, owner, _)| script == "test_script" && *owner == npc));
    }

    #[test]
    fn assign_command_runs_as_the_subject() {
        let mut world = World::new();
        let pc = world.pc();
        let npc = world.tagged("NPC", 1);
        world.call("AssignCommand", vec![npc.into(), state()], pc);
        world.module.process_actions();
        let runs = world.take_runs();
        assert_eq!(runs, vec![("test_script".to_string(), npc, ObjectId::INVALID)]);

        world.module.destroy_object(npc);
        world.call("AssignCommand", vec![npc.into(), state()], pc);
        assert!(world.module.actions().is_empty());
    }

    #[test]
    fn execute_script_runs_now_with_caller_as_triggerer() {
        let mut world = World::new();
        let pc = world.pc();
        let gate = world.tagged("GATE", 0);
        world.call("ExecuteScript", vec!["gate_check".into(), gate.into()], pc);
        assert_eq!(
            world.take_runs(),
            vec![("gate_check".to_string(), gate, pc)]
        );
        world.call(
            "ExecuteScript",
            vec!["gate_check".into(), ObjectId::INVALID.into()],
            pc,
        );
        assert!(world.take_runs().is_empty());
    }

    #[test]
    fn nearest_creature_counts_outward() {
        let mut world = World::new();
        let pc = world.pc();
        let near = world.tagged("NPC", 1);
        let far = world.tagged("NPC", 0);
        let nearest = |world: &mut World, nth: i32| {
            world
                .call(
                    "GetNearestCreature",
                    vec![1.into(), 1.into(), ObjectId::INVALID.into(), nth.into()],
                    pc,
                )
                .as_object()
                .unwrap()
        };
        // An explicit invalid target is not the caller.
        assert_eq!(nearest(&mut world, 1), ObjectId::INVALID);

        let first = world.call("GetNearestCreature", vec![1.into(), 1.into()], pc);
        assert_eq!(first.as_object(), Ok(near));
        let second = world.call(
            "GetNearestCreature",
            vec![1.into(), 1.into(), pc.into(), 2.into()],
            pc,
        );
        assert_eq!(second.as_object(), Ok(far));
        let third = world.call(
            "GetNearestCreature",
            vec![1.into(), 1.into(), pc.into(), 3.into()],
            pc,
        );
        assert_eq!(third.as_object(), Ok(ObjectId::INVALID));
    }

    #[test]
    fn doors_open_close_and_refuse_when_locked() {
        let mut world = World::new();
        let pc = world.pc();
        let gate = world.tagged("GATE", 0);
        let vault = world.tagged("VAULT", 0);
        let chest = world.tagged("CHEST", 0);

        world.call("ActionOpenDoor", vec![gate.into()], pc);
        assert!(convert_door(&world.module, gate).unwrap().is_open());
        assert_eq!(world.take_runs(), vec![("gate_open".to_string(), gate, pc)]);

        world.call("ActionOpenDoor", vec![vault.into()], pc);
        assert!(!convert_door(&world.module, vault).unwrap().is_open());
        assert_eq!(world.take_runs(), vec![("vault_locked".to_string(), vault, pc)]);

        world.call("ActionCloseDoor", vec![gate.into()], pc);
        assert!(!convert_door(&world.module, gate).unwrap().is_open());
        world.call("ActionOpenDoor", vec![chest.into()], pc);
        assert!(world.module.events().iter().any(|event| event == "door.close GATE"));
    }

    #[test]
    fn distance_needs_a_shared_area() {
        let mut world = World::new();
        let pc = world.pc();
        let gate = world.tagged("GATE", 0);
        let npc = world.tagged("NPC", 1);
        let cellar = world.cellar();

        let distance = world.call("GetDistanceToObject", vec![gate.into()], pc);
        assert!((distance.as_float().unwrap() - 3.0).abs() < 1e-5);
        world.module.jump_to(npc, cellar, Vec3::ZERO);
        let apart = world.call("GetDistanceToObject", vec![npc.into()], pc);
        assert_eq!(apart.as_float(), Ok(-1.0));
        let invalid = world.call("GetDistanceToObject", vec![ObjectId::INVALID.into()], pc);
        assert_eq!(invalid.as_float(), Ok(-1.0));
    }

    #[test]
    fn area_walk_defaults_to_the_callers_area() {
        let mut world = World::new();
        let pc = world.pc();
        let mut seen = Vec::new();
        let mut next = world.call("GetFirstObjectInArea", vec![], pc).as_object().unwrap();
        while next.is_valid() {
            seen.push(next);
            next = world.call("GetNextObjectInArea", vec![], pc).as_object().unwrap();
        }
        assert_eq!(seen.len(), 6);
        assert!(!seen.contains(&pc));

        let yard = world.yard();
        let first = world.call("GetFirstObjectInArea", vec![yard.into()], pc);
        assert_eq!(first.as_object(), Ok(seen[0]));
    }

    #[test]
    fn area_and_hit_points_lookups() {
        let mut world = World::new();
        let pc = world.pc();
        let far = world.tagged("NPC", 0);
        let yard = world.yard();

        assert_eq!(world.call("GetArea", vec![pc.into()], pc).as_object(), Ok(yard));
        assert_eq!(world.call("GetArea", vec![yard.into()], pc).as_object(), Ok(yard));
        let invalid = world.call("GetArea", vec![ObjectId::INVALID.into()], pc);
        assert_eq!(invalid.as_object(), Ok(ObjectId::INVALID));

        assert_eq!(world.call("GetCurrentHitPoints", vec![], far).as_int(), Ok(7));
        assert_eq!(world.call("GetMaxHitPoints", vec![far.into()], pc).as_int(), Ok(12));
        assert_eq!(world.call("GetMaxHitPoints", vec![yard.into()], pc).as_int(), Ok(0));
        assert_eq!(world.call("GetEnteringObject", vec![], pc).as_object(), Ok(pc));
    }

    #[test]
    fn set_facing_turns_the_caller() {
        let mut world = World::new();
        let npc = world.tagged("NPC", 0);
        world.call("SetFacing", vec![90.0f32.into()], npc);
        let facing = world.call("GetFacing", vec![npc.into()], npc).as_float().unwrap();
        assert!((facing - 90.0).abs() < 1e-4);
    }

    #[test]
    fn printing_reaches_the_event_trail() {
        let mut world = World::new();
        let pc = world.pc();
        world.call("PrintString", vec!["hello there".into()], pc);
        world.call("PrintInteger", vec![42.into()], pc);
        world.call("ActionSpeakString", vec!["Halt!".into()], world.tagged("NPC", 0));
        let events = world.module.events();
        assert!(events.iter().any(|event| event == "print hello there"));
        assert!(events.iter().any(|event| event == "print 42"));
        assert!(events.iter().any(|event| event == "speak NPC: Halt!"));
    }
}

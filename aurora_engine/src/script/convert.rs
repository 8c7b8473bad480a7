//! Checked conversions from script handles to live engine objects.
//!
//! A handle held by a script may point at nothing: it was never issued, or
//! its object has since been destroyed, or it names an object of another
//! kind. Every conversion answers `None` in all three cases, so handlers
//! never act on a stale object.

use aurora_nwscript::{FunctionContext, ObjectId, Variable};

use crate::location::Location;
use crate::module::Module;
use crate::object::{Area, Creature, Door, ModuleObject, Object, Situated, Waypoint};

pub fn convert_object(module: &Module, id: ObjectId) -> Option<&Object> {
    module.objects().get(id)
}

pub fn convert_object_mut(module: &mut Module, id: ObjectId) -> Option<&mut Object> {
    module.objects_mut().get_mut(id)
}

pub fn convert_creature(module: &Module, id: ObjectId) -> Option<&Creature> {
    convert_object(module, id)?.as_creature()
}

pub fn convert_creature_mut(module: &mut Module, id: ObjectId) -> Option<&mut Creature> {
    convert_object_mut(module, id)?.as_creature_mut()
}

/// A creature controlled by a player.
pub fn convert_pc(module: &Module, id: ObjectId) -> Option<&Creature> {
    convert_creature(module, id).filter(|creature| creature.is_pc())
}

pub fn convert_situated(module: &Module, id: ObjectId) -> Option<&Situated> {
    convert_object(module, id)?.as_situated()
}

pub fn convert_door(module: &Module, id: ObjectId) -> Option<&Door> {
    convert_object(module, id)?.as_door()
}

pub fn convert_door_mut(module: &mut Module, id: ObjectId) -> Option<&mut Door> {
    convert_object_mut(module, id)?.as_door_mut()
}

pub fn convert_waypoint(module: &Module, id: ObjectId) -> Option<&Waypoint> {
    convert_object(module, id)?.as_waypoint()
}

pub fn convert_area(module: &Module, id: ObjectId) -> Option<&Area> {
    convert_object(module, id)?.as_area()
}

pub fn convert_module(module: &Module, id: ObjectId) -> Option<&ModuleObject> {
    convert_object(module, id)?.as_module()
}

pub fn convert_location(value: &Variable) -> Option<Location> {
    Location::from_variable(value)
}

/// Object parameter `index`, or the caller when the script left it out.
pub fn object_or_caller(ctx: &FunctionContext, index: usize) -> ObjectId {
    if ctx.params_specified() <= index {
        return ctx.caller();
    }
    ctx.object(index).unwrap_or(ObjectId::INVALID)
}

//! Game objects: shared state in [`ObjectBase`], per-kind data in the
//! variants of [`Object`].

mod area;
mod creature;
mod situated;
mod waypoint;

use std::collections::{BTreeMap, HashMap};

use aurora_nwscript::ObjectId;
use glam::Vec3;
use log::{debug, warn};
use serde::Serialize;

use crate::error::LoadError;
use crate::location::Location;
use crate::record::{Field, Record};
use crate::services::{Model, Services};

pub use area::{Area, ModuleObject};
pub use creature::{alignment_good_evil, alignment_law_chaos, Ability, Creature, RACE_INVALID};
pub use situated::{Door, Placeable, Situated, SituatedSounds};
pub use waypoint::Waypoint;

/// Script-visible object type bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectType(pub u32);

impl ObjectType {
    pub const NONE: ObjectType = ObjectType(0);
    pub const CREATURE: ObjectType = ObjectType(1);
    pub const ITEM: ObjectType = ObjectType(2);
    pub const TRIGGER: ObjectType = ObjectType(4);
    pub const DOOR: ObjectType = ObjectType(8);
    pub const AREA_OF_EFFECT: ObjectType = ObjectType(16);
    pub const WAYPOINT: ObjectType = ObjectType(32);
    pub const PLACEABLE: ObjectType = ObjectType(64);
    pub const STORE: ObjectType = ObjectType(128);
    pub const ENCOUNTER: ObjectType = ObjectType(256);
    pub const ALL: ObjectType = ObjectType(0x7FFF);
    /// What scripts see for an invalid or non-game object.
    pub const INVALID: ObjectType = ObjectType(0x7FFF);

    pub fn from_script(value: i32) -> Self {
        ObjectType(u32::try_from(value).unwrap_or(0))
    }

    pub fn bits(self) -> i32 {
        self.0 as i32
    }

    /// True if any bit of `other` is set in `self`.
    pub fn intersects(self, other: ObjectType) -> bool {
        self.0 & other.0 != 0
    }
}

/// Concrete kind of a registered object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Module,
    Area,
    Creature,
    Door,
    Placeable,
    Waypoint,
}

impl ObjectKind {
    pub fn object_type(self) -> ObjectType {
        match self {
            ObjectKind::Module | ObjectKind::Area => ObjectType::NONE,
            ObjectKind::Creature => ObjectType::CREATURE,
            ObjectKind::Door => ObjectType::DOOR,
            ObjectKind::Placeable => ObjectType::PLACEABLE,
            ObjectKind::Waypoint => ObjectType::WAYPOINT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Module => "module",
            ObjectKind::Area => "area",
            ObjectKind::Creature => "creature",
            ObjectKind::Door => "door",
            ObjectKind::Placeable => "placeable",
            ObjectKind::Waypoint => "waypoint",
        }
    }

    /// Placed in areas and visible to object searches by type.
    pub fn is_game_object(self) -> bool {
        !matches!(self, ObjectKind::Module | ObjectKind::Area)
    }
}

/// Script local variables attached to an object.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    ints: HashMap<String, i32>,
    floats: HashMap<String, f32>,
    strings: HashMap<String, String>,
    objects: HashMap<String, ObjectId>,
    locations: HashMap<String, Location>,
}

impl Locals {
    pub fn get_int(&self, name: &str) -> i32 {
        self.ints.get(name).copied().unwrap_or(0)
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.ints.insert(name.to_string(), value);
    }

    pub fn delete_int(&mut self, name: &str) {
        self.ints.remove(name);
    }

    pub fn get_float(&self, name: &str) -> f32 {
        self.floats.get(name).copied().unwrap_or(0.0)
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.floats.insert(name.to_string(), value);
    }

    pub fn delete_float(&mut self, name: &str) {
        self.floats.remove(name);
    }

    pub fn get_string(&self, name: &str) -> &str {
        self.strings.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set_string(&mut self, name: &str, value: &str) {
        self.strings.insert(name.to_string(), value.to_string());
    }

    pub fn delete_string(&mut self, name: &str) {
        self.strings.remove(name);
    }

    pub fn get_object(&self, name: &str) -> ObjectId {
        self.objects
            .get(name)
            .copied()
            .unwrap_or(ObjectId::INVALID)
    }

    pub fn set_object(&mut self, name: &str, value: ObjectId) {
        self.objects.insert(name.to_string(), value);
    }

    pub fn delete_object(&mut self, name: &str) {
        self.objects.remove(name);
    }

    pub fn get_location(&self, name: &str) -> Option<Location> {
        self.locations.get(name).copied()
    }

    pub fn set_location(&mut self, name: &str, value: Location) {
        self.locations.insert(name.to_string(), value);
    }

    pub fn delete_location(&mut self, name: &str) {
        self.locations.remove(name);
    }
}

/// State every object carries, whatever its kind.
#[derive(Debug)]
pub struct ObjectBase {
    id: ObjectId,
    template: String,
    tag: String,
    name: String,
    description: String,
    portrait: String,
    conversation: String,
    is_static: bool,
    usable: bool,
    commandable: bool,
    ids: Vec<u32>,
    position: Vec3,
    orientation: Vec3,
    area: Option<ObjectId>,
    pc_speaker: Option<ObjectId>,
    locals: Locals,
    scripts: BTreeMap<String, String>,
    model_name: String,
    model: Option<Box<dyn Model>>,
    loaded: bool,
}

impl ObjectBase {
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            template: String::new(),
            tag: String::new(),
            name: String::new(),
            description: String::new(),
            portrait: String::new(),
            conversation: String::new(),
            is_static: false,
            usable: true,
            commandable: true,
            ids: Vec::new(),
            position: Vec3::ZERO,
            orientation: Vec3::ZERO,
            area: None,
            pc_speaker: None,
            locals: Locals::default(),
            scripts: BTreeMap::new(),
            model_name: String::new(),
            model: None,
            loaded: false,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Blueprint resref this object was built from.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub(crate) fn set_template(&mut self, template: &str) {
        self.template = template.to_string();
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Callers holding a registered object must go through
    /// `ObjectRegistry::retag` so the tag index stays in step.
    pub fn set_tag(&mut self, tag: &str) {
        self.tag = tag.to_string();
        if let Some(model) = self.model.as_mut() {
            model.set_tag(tag);
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn portrait(&self) -> &str {
        &self.portrait
    }

    pub fn conversation(&self) -> &str {
        &self.conversation
    }

    pub fn set_conversation(&mut self, conversation: &str) {
        self.conversation = conversation.to_string();
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_usable(&self) -> bool {
        self.usable
    }

    pub fn is_clickable(&self) -> bool {
        !self.is_static && self.usable
    }

    pub fn is_commandable(&self) -> bool {
        self.commandable
    }

    pub fn set_commandable(&mut self, commandable: bool) {
        self.commandable = commandable;
    }

    /// Renderable ids making up this object.
    pub fn model_ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub(crate) fn set_model_name(&mut self, name: &str) {
        self.model_name = name.to_string();
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Vec3 {
        self.orientation
    }

    /// Facing in degrees, as scripts see it.
    pub fn facing(&self) -> f32 {
        self.orientation.y
    }

    pub fn area(&self) -> Option<ObjectId> {
        self.area
    }

    pub(crate) fn set_area(&mut self, area: Option<ObjectId>) {
        self.area = area;
    }

    pub fn location(&self) -> Location {
        Location::new(self.area, self.position, self.facing())
    }

    pub fn pc_speaker(&self) -> Option<ObjectId> {
        self.pc_speaker
    }

    pub fn set_pc_speaker(&mut self, pc: Option<ObjectId>) {
        self.pc_speaker = pc;
    }

    pub fn locals(&self) -> &Locals {
        &self.locals
    }

    pub fn locals_mut(&mut self) -> &mut Locals {
        &mut self.locals
    }

    /// Script bound to an event hook such as `OnEnter`.
    pub fn script(&self, event: &str) -> Option<&str> {
        self.scripts
            .get(event)
            .map(String::as_str)
            .filter(|script| !script.is_empty())
    }

    pub fn set_script(&mut self, event: &str, script: &str) {
        self.scripts.insert(event.to_string(), script.to_string());
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn begin_load(&mut self) {
        assert!(!self.loaded, "object {} loaded twice", self.id);
    }

    pub(crate) fn finish_load(&mut self) {
        self.loaded = true;
    }

    pub fn show(&mut self) {
        if let Some(model) = self.model.as_mut() {
            model.show();
        }
    }

    pub fn hide(&mut self) {
        if let Some(model) = self.model.as_mut() {
            model.hide();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.model.as_ref().is_some_and(|model| model.is_visible())
    }

    pub fn highlight(&mut self, enabled: bool) {
        if let Some(model) = self.model.as_mut() {
            model.draw_bound(enabled);
        }
    }

    pub fn size(&self) -> Vec3 {
        self.model
            .as_ref()
            .map(|model| model.size())
            .unwrap_or(Vec3::ZERO)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        if let Some(model) = self.model.as_mut() {
            model.set_position(position);
        }
    }

    pub fn set_orientation(&mut self, orientation: Vec3) {
        self.orientation = orientation;
        if let Some(model) = self.model.as_mut() {
            model.set_rotation(model_rotation(orientation));
        }
    }

    pub fn set_facing(&mut self, facing: f32) {
        let mut orientation = self.orientation;
        orientation.y = facing;
        self.set_orientation(orientation);
    }

    /// Shared properties, applied once per record. Later records override
    /// earlier ones only for the fields they carry.
    pub(crate) fn load_properties(&mut self, record: &Record, services: &Services) {
        self.tag = record.get_string("Tag", &self.tag);
        if let Some(name) = record.get_loc_string("LocName", services.talk.as_ref()) {
            self.name = name;
        }
        if let Some(description) = record.get_loc_string("Description", services.talk.as_ref())
        {
            self.description = description;
        }
        self.load_portrait(record, services);
        self.conversation = record.get_string("Conversation", &self.conversation);
        self.is_static = record.get_bool("Static", self.is_static);
        self.usable = record.get_bool("Useable", self.usable);

        for (name, field) in record.fields() {
            if !(name.starts_with("On") || name.starts_with("Script")) {
                continue;
            }
            if let Field::String(script) = field {
                self.scripts.insert(name.to_string(), script.clone());
            }
        }
    }

    fn load_portrait(&mut self, record: &Record, services: &Services) {
        let portrait_id = record.get_uint("PortraitId", 0);
        if portrait_id != 0 {
            if let Some(row) = services.resources.row("portraits", portrait_id as usize) {
                let base = row.get_string("BaseResRef", "");
                if !base.is_empty() {
                    self.portrait = format!("po_{base}");
                }
            }
        }
        self.portrait = record.get_string("Portrait", &self.portrait);
    }

    /// Request the renderable from the model loader. An object without a
    /// model name, or whose loader has nothing to show, stays invisible.
    pub(crate) fn load_model(&mut self, services: &Services) -> Result<(), LoadError> {
        if self.model_name.is_empty() {
            warn!(
                "object \"{}\" ({}) has no model",
                self.tag, self.template
            );
            return Ok(());
        }

        let Some(mut model) = services.models.load_model(&self.model_name)? else {
            debug!("no renderable for model {}", self.model_name);
            return Ok(());
        };
        model.set_position(self.position);
        model.set_rotation(model_rotation(self.orientation));
        model.set_tag(&self.tag);
        model.set_clickable(self.is_clickable());
        self.ids.push(model.id());
        self.model = Some(model);
        Ok(())
    }
}

/// Object orientation to renderer rotation.
fn model_rotation(orientation: Vec3) -> Vec3 {
    Vec3::new(orientation.x, orientation.z, -orientation.y)
}

/// Degrees of a 2D direction, 0 pointing along +x.
pub(crate) fn bearing_to_degrees(x: f32, y: f32) -> f32 {
    if x == 0.0 && y == 0.0 {
        return 0.0;
    }
    y.atan2(x).to_degrees()
}

/// Every live object the runtime knows about.
#[derive(Debug)]
pub enum Object {
    Module(ModuleObject),
    Area(Area),
    Creature(Creature),
    Door(Door),
    Placeable(Placeable),
    Waypoint(Waypoint),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Module(_) => ObjectKind::Module,
            Object::Area(_) => ObjectKind::Area,
            Object::Creature(_) => ObjectKind::Creature,
            Object::Door(_) => ObjectKind::Door,
            Object::Placeable(_) => ObjectKind::Placeable,
            Object::Waypoint(_) => ObjectKind::Waypoint,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.kind().object_type()
    }

    pub fn base(&self) -> &ObjectBase {
        match self {
            Object::Module(module) => module.base(),
            Object::Area(area) => area.base(),
            Object::Creature(creature) => creature.base(),
            Object::Door(door) => door.base(),
            Object::Placeable(placeable) => placeable.base(),
            Object::Waypoint(waypoint) => waypoint.base(),
        }
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        match self {
            Object::Module(module) => module.base_mut(),
            Object::Area(area) => area.base_mut(),
            Object::Creature(creature) => creature.base_mut(),
            Object::Door(door) => door.base_mut(),
            Object::Placeable(placeable) => placeable.base_mut(),
            Object::Waypoint(waypoint) => waypoint.base_mut(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.base().id()
    }

    pub fn tag(&self) -> &str {
        self.base().tag()
    }

    pub fn show(&mut self) {
        match self {
            Object::Module(_) | Object::Area(_) => {}
            Object::Waypoint(waypoint) => waypoint.show(),
            other => other.base_mut().show(),
        }
    }

    pub fn hide(&mut self) {
        match self {
            Object::Module(_) | Object::Area(_) => {}
            Object::Waypoint(waypoint) => waypoint.hide(),
            other => other.base_mut().hide(),
        }
    }

    /// The cursor moved onto this object.
    pub fn enter(&mut self) {
        self.highlight(true);
    }

    /// The cursor left this object.
    pub fn leave(&mut self) {
        self.highlight(false);
    }

    pub fn highlight(&mut self, enabled: bool) {
        if self.kind().is_game_object() {
            self.base_mut().highlight(enabled);
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.base_mut().set_position(position);
    }

    pub fn set_orientation(&mut self, orientation: Vec3) {
        self.base_mut().set_orientation(orientation);
    }

    pub fn as_creature(&self) -> Option<&Creature> {
        match self {
            Object::Creature(creature) => Some(creature),
            _ => None,
        }
    }

    pub fn as_creature_mut(&mut self) -> Option<&mut Creature> {
        match self {
            Object::Creature(creature) => Some(creature),
            _ => None,
        }
    }

    pub fn as_situated(&self) -> Option<&Situated> {
        match self {
            Object::Door(door) => Some(door.situated()),
            Object::Placeable(placeable) => Some(placeable.situated()),
            _ => None,
        }
    }

    pub fn as_situated_mut(&mut self) -> Option<&mut Situated> {
        match self {
            Object::Door(door) => Some(door.situated_mut()),
            Object::Placeable(placeable) => Some(placeable.situated_mut()),
            _ => None,
        }
    }

    pub fn as_door(&self) -> Option<&Door> {
        match self {
            Object::Door(door) => Some(door),
            _ => None,
        }
    }

    pub fn as_door_mut(&mut self) -> Option<&mut Door> {
        match self {
            Object::Door(door) => Some(door),
            _ => None,
        }
    }

    pub fn as_placeable(&self) -> Option<&Placeable> {
        match self {
            Object::Placeable(placeable) => Some(placeable),
            _ => None,
        }
    }

    pub fn as_waypoint(&self) -> Option<&Waypoint> {
        match self {
            Object::Waypoint(waypoint) => Some(waypoint),
            _ => None,
        }
    }

    pub fn as_area(&self) -> Option<&Area> {
        match self {
            Object::Area(area) => Some(area),
            _ => None,
        }
    }

    pub fn as_area_mut(&mut self) -> Option<&mut Area> {
        match self {
            Object::Area(area) => Some(area),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleObject> {
        match self {
            Object::Module(module) => Some(module),
            _ => None,
        }
    }
}

use std::ops::{Deref, DerefMut};

use aurora_nwscript::ObjectId;
use glam::Vec3;
use log::warn;

use super::{bearing_to_degrees, ObjectBase};
use crate::error::LoadError;
use crate::record::Record;
use crate::services::{load_record, ResourceType, Services};

/// Invisible marker, optionally with a note on the area map.
#[derive(Debug)]
pub struct Waypoint {
    base: ObjectBase,
    has_map_note: bool,
    enabled_map_note: bool,
    map_note: String,
    note_shown: bool,
}

impl Deref for Waypoint {
    type Target = ObjectBase;

    fn deref(&self) -> &ObjectBase {
        &self.base
    }
}

impl DerefMut for Waypoint {
    fn deref_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

impl Waypoint {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id),
            has_map_note: false,
            enabled_map_note: false,
            map_note: String::new(),
            note_shown: false,
        }
    }

    pub fn base(&self) -> &ObjectBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    pub fn load_from(&mut self, instance: &Record, services: &Services) -> Result<(), LoadError> {
        let template = instance.get_string("TemplateResRef", "");
        self.base.set_template(&template);
        let blueprint = if template.is_empty() {
            None
        } else {
            load_record(services.resources.as_ref(), ResourceType::Utw, &template)?
        };
        if blueprint.is_none() && !template.is_empty() {
            warn!("waypoint \"{template}\" has no blueprint");
        }
        self.load(instance, blueprint.as_ref(), services)
    }

    pub fn load(
        &mut self,
        instance: &Record,
        blueprint: Option<&Record>,
        services: &Services,
    ) -> Result<(), LoadError> {
        self.base.begin_load();
        if let Some(blueprint) = blueprint {
            self.load_properties(blueprint, services);
        }
        self.load_properties(instance, services);

        let position = Vec3::new(
            instance.get_float("XPosition", 0.0),
            instance.get_float("YPosition", 0.0),
            instance.get_float("ZPosition", 0.0),
        );
        self.base.set_position(position);
        let bearing = bearing_to_degrees(
            instance.get_float("XOrientation", 0.0),
            instance.get_float("YOrientation", 0.0),
        );
        self.base.set_orientation(Vec3::new(0.0, bearing, 0.0));

        self.base.finish_load();
        Ok(())
    }

    fn load_properties(&mut self, record: &Record, services: &Services) {
        self.base.load_properties(record, services);
        if let Some(name) = record.get_loc_string("LocalizedName", services.talk.as_ref()) {
            self.base.set_name(&name);
        }
        self.has_map_note = record.get_bool("HasMapNote", self.has_map_note);
        self.enabled_map_note = record.get_bool("MapNoteEnabled", self.enabled_map_note);
        if let Some(note) = record.get_loc_string("MapNote", services.talk.as_ref()) {
            self.map_note = note;
        }
    }

    pub fn has_map_note(&self) -> bool {
        self.has_map_note
    }

    pub fn enabled_map_note(&self) -> bool {
        self.enabled_map_note
    }

    pub fn map_note(&self) -> &str {
        &self.map_note
    }

    pub fn enable_map_note(&mut self, enabled: bool) {
        self.enabled_map_note = enabled;
    }

    pub fn show(&mut self) {
        self.note_shown = self.has_map_note && self.enabled_map_note;
    }

    pub fn hide(&mut self) {
        self.note_shown = false;
    }

    pub fn is_note_shown(&self) -> bool {
        self.note_shown
    }
}

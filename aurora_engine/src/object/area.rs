use std::ops::{Deref, DerefMut};

use aurora_nwscript::ObjectId;
use glam::Vec3;

use super::{bearing_to_degrees, ObjectBase};
use crate::record::{Field, Record};
use crate::services::Services;

/// A loaded area and the objects placed in it, in load order.
#[derive(Debug)]
pub struct Area {
    base: ObjectBase,
    resref: String,
    objects: Vec<ObjectId>,
}

impl Deref for Area {
    type Target = ObjectBase;

    fn deref(&self) -> &ObjectBase {
        &self.base
    }
}

impl DerefMut for Area {
    fn deref_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

impl Area {
    pub fn new(id: ObjectId, resref: &str) -> Self {
        Self {
            base: ObjectBase::new(id),
            resref: resref.to_string(),
            objects: Vec::new(),
        }
    }

    pub fn base(&self) -> &ObjectBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    /// Apply the ARE record.
    pub fn load(&mut self, are: &Record, services: &Services) {
        self.base.begin_load();
        self.base.set_template(&self.resref);
        self.base.load_properties(are, services);
        if let Some(name) = are.get_loc_string("Name", services.talk.as_ref()) {
            self.base.set_name(&name);
        }
        if self.base.tag().is_empty() {
            self.base.set_tag(&self.resref);
        }
        self.base.finish_load();
    }

    pub fn resref(&self) -> &str {
        &self.resref
    }

    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    pub(crate) fn add_object(&mut self, id: ObjectId) {
        if !self.objects.contains(&id) {
            self.objects.push(id);
        }
    }

    pub(crate) fn remove_object(&mut self, id: ObjectId) {
        self.objects.retain(|object| *object != id);
    }
}

/// The module as a script-visible object.
#[derive(Debug)]
pub struct ModuleObject {
    base: ObjectBase,
    entry_area: String,
    entry_position: Vec3,
    entry_facing: f32,
    minutes_per_hour: u32,
    areas: Vec<String>,
}

impl Deref for ModuleObject {
    type Target = ObjectBase;

    fn deref(&self) -> &ObjectBase {
        &self.base
    }
}

impl DerefMut for ModuleObject {
    fn deref_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

impl ModuleObject {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id),
            entry_area: String::new(),
            entry_position: Vec3::ZERO,
            entry_facing: 0.0,
            minutes_per_hour: 2,
            areas: Vec::new(),
        }
    }

    pub fn base(&self) -> &ObjectBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    /// Apply the IFO record.
    pub fn load(&mut self, name: &str, ifo: &Record, services: &Services) {
        self.base.begin_load();
        self.base.set_template(name);
        self.base.set_tag(&ifo.get_string("Mod_Tag", name));
        if let Some(display) = ifo.get_loc_string("Mod_Name", services.talk.as_ref()) {
            self.base.set_name(&display);
        }
        for (field, value) in ifo.fields() {
            if let (Some(event), Field::String(script)) = (field.strip_prefix("Mod_"), value) {
                if event.starts_with("On") {
                    self.base.set_script(event, script);
                }
            }
        }

        self.entry_area = ifo.get_string("Mod_Entry_Area", "");
        self.entry_position = Vec3::new(
            ifo.get_float("Mod_Entry_X", 0.0),
            ifo.get_float("Mod_Entry_Y", 0.0),
            ifo.get_float("Mod_Entry_Z", 0.0),
        );
        self.entry_facing = bearing_to_degrees(
            ifo.get_float("Mod_Entry_Dir_X", 0.0),
            ifo.get_float("Mod_Entry_Dir_Y", 0.0),
        );
        self.minutes_per_hour = ifo.get_uint("Mod_MinPerHour", 2).max(1);
        self.areas = ifo
            .get_list("Mod_Area_list")
            .iter()
            .map(|area| area.get_string("Area_Name", ""))
            .filter(|area| !area.is_empty())
            .collect();
        self.base.finish_load();
    }

    pub fn entry_area(&self) -> &str {
        &self.entry_area
    }

    pub fn entry_position(&self) -> Vec3 {
        self.entry_position
    }

    pub fn entry_facing(&self) -> f32 {
        self.entry_facing
    }

    pub fn minutes_per_hour(&self) -> u32 {
        self.minutes_per_hour
    }

    /// Areas listed by the module, in order. Empty means only the entry area.
    pub fn areas(&self) -> &[String] {
        &self.areas
    }
}

#[cfg(test)]
mod tests {
    use aurora_nwscript::ObjectId;

    use super::{Area, ModuleObject};
    use crate::record::Record;
    use crate::services::{MemoryResources, Services};

    #[test]
    fn module_reads_entry_point_and_hooks() {
        let services = Services::new(MemoryResources::new());
        let ifo = Record::new()
            .with("Mod_Tag", "prelude")
            .with("Mod_Name", "Prelude")
            .with("Mod_Entry_Area", "m0q0")
            .with("Mod_Entry_X", 3.0)
            .with("Mod_Entry_Dir_X", 0.0)
            .with("Mod_Entry_Dir_Y", 1.0)
            .with("Mod_OnClientEntr", "x3_mod_def_enter");
        let mut module = ModuleObject::new(ObjectId(1));
        module.load("prelude", &ifo, &services);

        assert_eq!(module.tag(), "prelude");
        assert_eq!(module.name(), "Prelude");
        assert_eq!(module.entry_area(), "m0q0");
        assert_eq!(module.entry_position().x, 3.0);
        assert!((module.entry_facing() - 90.0).abs() < 1e-3);
        assert_eq!(module.minutes_per_hour(), 2);
        assert_eq!(module.script("OnClientEntr"), Some("x3_mod_def_enter"));
    }

    #[test]
    fn area_tag_defaults_to_resref() {
        let services = Services::new(MemoryResources::new());
        let mut area = Area::new(ObjectId(2), "m0q0");
        area.load(&Record::new().with("Name", "Hall").with("OnEnter", "hall_enter"), &services);
        assert_eq!(area.tag(), "m0q0");
        assert_eq!(area.name(), "Hall");
        assert_eq!(area.script("OnEnter"), Some("hall_enter"));
    }
}

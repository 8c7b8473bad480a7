use std::iter;
use std::ops::{Deref, DerefMut};

use aurora_nwscript::ObjectId;
use glam::Vec3;
use log::warn;
use serde::Serialize;

use super::ObjectBase;
use crate::error::LoadError;
use crate::record::Record;
use crate::services::{load_record, ResourceType, Services};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SituatedSounds {
    pub opened: String,
    pub closed: String,
    pub destroyed: String,
    pub used: String,
    pub locked: String,
}

/// Doors and placeables: fixed scenery with an appearance row.
#[derive(Debug)]
pub struct Situated {
    base: ObjectBase,
    kind_name: &'static str,
    appearance: Option<u32>,
    locked: bool,
    sound_app_type: Option<u32>,
    sounds: SituatedSounds,
}

impl Deref for Situated {
    type Target = ObjectBase;

    fn deref(&self) -> &ObjectBase {
        &self.base
    }
}

impl DerefMut for Situated {
    fn deref_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

impl Situated {
    fn new(id: ObjectId, kind_name: &'static str) -> Self {
        Self {
            base: ObjectBase::new(id),
            kind_name,
            appearance: None,
            locked: false,
            sound_app_type: None,
            sounds: SituatedSounds::default(),
        }
    }

    pub fn base(&self) -> &ObjectBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    pub fn appearance(&self) -> Option<u32> {
        self.appearance
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn sounds(&self) -> &SituatedSounds {
        &self.sounds
    }

    fn blueprint(
        &mut self,
        instance: &Record,
        kind: ResourceType,
        services: &Services,
    ) -> Result<Option<Record>, LoadError> {
        let template = instance.get_string("TemplateResRef", "");
        self.base.set_template(&template);
        if template.is_empty() {
            return Ok(None);
        }
        let blueprint = load_record(services.resources.as_ref(), kind, &template)?;
        if blueprint.is_none() {
            warn!("{} \"{template}\" has no blueprint", self.kind_name);
        }
        Ok(blueprint)
    }

    fn load_properties(&mut self, record: &Record, services: &Services) {
        self.base.load_properties(record, services);
        if record.has_field("Appearance") {
            self.appearance = Some(record.get_uint("Appearance", 0));
        }
        self.locked = record.get_bool("Locked", self.locked);
    }

    /// Appearance, pose and model, once every property record is applied.
    fn finish_load(
        &mut self,
        instance: &Record,
        services: &Services,
        table: &str,
        model_column: &str,
    ) -> Result<(), LoadError> {
        let appearance = self
            .appearance
            .ok_or(LoadError::MissingAppearance(self.kind_name))?;
        self.load_appearance(services, table, model_column, appearance);
        self.load_sounds(services);

        let position = Vec3::new(
            instance.get_float("X", 0.0),
            instance.get_float("Y", 0.0),
            instance.get_float("Z", 0.0),
        );
        self.base.set_position(position);
        let bearing = instance.get_float("Bearing", 0.0).to_degrees();
        self.base.set_orientation(Vec3::new(0.0, bearing, 0.0));

        self.base.load_model(services)?;
        self.base.finish_load();
        Ok(())
    }

    fn load_appearance(
        &mut self,
        services: &Services,
        table: &str,
        model_column: &str,
        appearance: u32,
    ) {
        let Some(row) = services.resources.row(table, appearance as usize) else {
            warn!(
                "{} \"{}\" has unknown appearance {appearance}",
                self.kind_name,
                self.base.tag()
            );
            return;
        };
        let model = row.get_string(model_column, "");
        self.base.set_model_name(&model);
        if row.has_field("SoundAppType") {
            self.sound_app_type = Some(row.get_uint("SoundAppType", 0));
        }
    }

    fn load_sounds(&mut self, services: &Services) {
        let Some(sound_type) = self.sound_app_type else {
            return;
        };
        let Some(row) = services.resources.row("placeableobjsnds", sound_type as usize) else {
            return;
        };
        self.sounds = SituatedSounds {
            opened: row.get_string("Opened", ""),
            closed: row.get_string("Closed", ""),
            destroyed: row.get_string("Destroyed", ""),
            used: row.get_string("Used", ""),
            locked: row.get_string("Locked", ""),
        };
    }
}

#[derive(Debug)]
pub struct Door {
    situated: Situated,
    open: bool,
    linked_to: String,
}

impl Deref for Door {
    type Target = Situated;

    fn deref(&self) -> &Situated {
        &self.situated
    }
}

impl DerefMut for Door {
    fn deref_mut(&mut self) -> &mut Situated {
        &mut self.situated
    }
}

impl Door {
    pub fn new(id: ObjectId) -> Self {
        Self {
            situated: Situated::new(id, "door"),
            open: false,
            linked_to: String::new(),
        }
    }

    pub fn base(&self) -> &ObjectBase {
        &self.situated.base
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.situated.base
    }

    pub fn situated(&self) -> &Situated {
        &self.situated
    }

    pub fn situated_mut(&mut self) -> &mut Situated {
        &mut self.situated
    }

    pub fn load_from(&mut self, instance: &Record, services: &Services) -> Result<(), LoadError> {
        let blueprint = self
            .situated
            .blueprint(instance, ResourceType::Utd, services)?;
        self.load(instance, blueprint.as_ref(), services)
    }

    pub fn load(
        &mut self,
        instance: &Record,
        blueprint: Option<&Record>,
        services: &Services,
    ) -> Result<(), LoadError> {
        self.situated.base.begin_load();
        for record in blueprint.into_iter().chain(iter::once(instance)) {
            self.situated.load_properties(record, services);
            self.open = record.get_int("OpenState", self.open.into()) != 0;
            self.linked_to = record.get_string("LinkedTo", &self.linked_to);
        }
        self.situated
            .finish_load(instance, services, "doortypes", "Model")
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    /// Tag of the transition target.
    pub fn linked_to(&self) -> &str {
        &self.linked_to
    }
}

#[derive(Debug)]
pub struct Placeable {
    situated: Situated,
    has_inventory: bool,
}

impl Deref for Placeable {
    type Target = Situated;

    fn deref(&self) -> &Situated {
        &self.situated
    }
}

impl DerefMut for Placeable {
    fn deref_mut(&mut self) -> &mut Situated {
        &mut self.situated
    }
}

impl Placeable {
    pub fn new(id: ObjectId) -> Self {
        Self {
            situated: Situated::new(id, "placeable"),
            has_inventory: false,
        }
    }

    pub fn base(&self) -> &ObjectBase {
        &self.situated.base
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.situated.base
    }

    pub fn situated(&self) -> &Situated {
        &self.situated
    }

    pub fn situated_mut(&mut self) -> &mut Situated {
        &mut self.situated
    }

    pub fn load_from(&mut self, instance: &Record, services: &Services) -> Result<(), LoadError> {
        let blueprint = self
            .situated
            .blueprint(instance, ResourceType::Utp, services)?;
        self.load(instance, blueprint.as_ref(), services)
    }

    pub fn load(
        &mut self,
        instance: &Record,
        blueprint: Option<&Record>,
        services: &Services,
    ) -> Result<(), LoadError> {
        self.situated.base.begin_load();
        for record in blueprint.into_iter().chain(iter::once(instance)) {
            self.situated.load_properties(record, services);
            self.has_inventory = record.get_bool("HasInventory", self.has_inventory);
        }
        self.situated
            .finish_load(instance, services, "placeables", "ModelName")
    }

    pub fn has_inventory(&self) -> bool {
        self.has_inventory
    }
}

use std::ops::{Deref, DerefMut};

use aurora_nwscript::ObjectId;
use glam::Vec3;
use log::warn;

use super::{bearing_to_degrees, ObjectBase};
use crate::error::LoadError;
use crate::record::Record;
use crate::services::{load_record, Gender, ResourceType, Services};

pub const RACE_INVALID: u32 = 28;

pub const ALIGNMENT_NEUTRAL: i32 = 1;
pub const ALIGNMENT_LAWFUL: i32 = 2;
pub const ALIGNMENT_CHAOTIC: i32 = 3;
pub const ALIGNMENT_GOOD: i32 = 4;
pub const ALIGNMENT_EVIL: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    pub fn from_script(value: i32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    fn field(self) -> &'static str {
        match self {
            Ability::Strength => "Str",
            Ability::Dexterity => "Dex",
            Ability::Constitution => "Con",
            Ability::Intelligence => "Int",
            Ability::Wisdom => "Wis",
            Ability::Charisma => "Cha",
        }
    }
}

/// Law/chaos axis value (0..=100) to its alignment constant.
pub fn alignment_law_chaos(value: u8) -> i32 {
    if value >= 70 {
        ALIGNMENT_LAWFUL
    } else if value <= 30 {
        ALIGNMENT_CHAOTIC
    } else {
        ALIGNMENT_NEUTRAL
    }
}

/// Good/evil axis value (0..=100) to its alignment constant.
pub fn alignment_good_evil(value: u8) -> i32 {
    if value >= 70 {
        ALIGNMENT_GOOD
    } else if value <= 30 {
        ALIGNMENT_EVIL
    } else {
        ALIGNMENT_NEUTRAL
    }
}

#[derive(Debug)]
pub struct Creature {
    base: ObjectBase,
    appearance: Option<u32>,
    gender: Gender,
    race: u32,
    law_chaos: u8,
    good_evil: u8,
    abilities: [u8; 6],
    current_hp: i32,
    max_hp: i32,
    classes: Vec<(u32, u32)>,
    is_pc: bool,
}

impl Deref for Creature {
    type Target = ObjectBase;

    fn deref(&self) -> &ObjectBase {
        &self.base
    }
}

impl DerefMut for Creature {
    fn deref_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

impl Creature {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id),
            appearance: None,
            gender: Gender::Male,
            race: RACE_INVALID,
            law_chaos: 50,
            good_evil: 50,
            abilities: [10; 6],
            current_hp: 1,
            max_hp: 1,
            classes: Vec::new(),
            is_pc: false,
        }
    }

    pub fn base(&self) -> &ObjectBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    /// Load a placed instance, pulling in the blueprint it names.
    pub fn load_from(&mut self, instance: &Record, services: &Services) -> Result<(), LoadError> {
        let template = instance.get_string("TemplateResRef", "");
        let blueprint = if template.is_empty() {
            None
        } else {
            load_record(services.resources.as_ref(), ResourceType::Utc, &template)?
        };
        if blueprint.is_none() && !template.is_empty() {
            warn!("creature \"{template}\" has no blueprint");
        }
        self.base.set_template(&template);
        self.load(instance, blueprint.as_ref(), services)
    }

    /// Blueprint first, then instance, so instance values win.
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

        let appearance = self
            .appearance
            .ok_or(LoadError::MissingAppearance("creature"))?;
        if let Some(row) = services.resources.row("appearance", appearance as usize) {
            let model = row.get_string("RACE", "");
            self.base.set_model_name(&model);
        }

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

        self.base.load_model(services)?;
        self.base.finish_load();
        Ok(())
    }

    fn load_properties(&mut self, record: &Record, services: &Services) {
        self.base.load_properties(record, services);

        let first = record.get_loc_string("FirstName", services.talk.as_ref());
        let last = record.get_loc_string("LastName", services.talk.as_ref());
        if first.is_some() || last.is_some() {
            let name = [first.unwrap_or_default(), last.unwrap_or_default()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            self.base.set_name(&name);
        }

        if record.has_field("Appearance_Type") {
            self.appearance = Some(record.get_uint("Appearance_Type", 0));
        }
        if record.has_field("Gender") {
            self.gender = Gender::from_script(record.get_int("Gender", 0) as i32);
        }
        self.race = record.get_uint("Race", self.race);
        self.law_chaos = clamp_axis(record.get_int("LawfulChaotic", self.law_chaos.into()));
        self.good_evil = clamp_axis(record.get_int("GoodEvil", self.good_evil.into()));
        for ability in Ability::ALL {
            let slot = &mut self.abilities[ability as usize];
            *slot = record
                .get_uint(ability.field(), u32::from(*slot))
                .min(u8::MAX.into()) as u8;
        }

        if record.has_field("HitPoints") {
            let hp = record.get_int("HitPoints", 1) as i32;
            self.max_hp = hp;
            self.current_hp = hp;
        }
        self.max_hp = record.get_int("MaxHitPoints", self.max_hp.into()) as i32;
        self.current_hp = record.get_int("CurrentHitPoints", self.current_hp.into()) as i32;

        let classes = record.get_list("ClassList");
        if !classes.is_empty() {
            self.classes = classes
                .iter()
                .map(|class| (class.get_uint("Class", 0), class.get_uint("ClassLevel", 0)))
                .collect();
        }
        self.is_pc = record.get_bool("IsPC", self.is_pc);
    }

    pub fn appearance(&self) -> Option<u32> {
        self.appearance
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn race(&self) -> u32 {
        self.race
    }

    pub fn law_chaos(&self) -> u8 {
        self.law_chaos
    }

    pub fn good_evil(&self) -> u8 {
        self.good_evil
    }

    pub fn ability(&self, ability: Ability) -> u8 {
        self.abilities[ability as usize]
    }

    pub fn current_hp(&self) -> i32 {
        self.current_hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn is_dead(&self) -> bool {
        self.current_hp <= 0
    }

    /// Total levels across all classes.
    pub fn hit_dice(&self) -> u32 {
        self.classes.iter().map(|(_, level)| level).sum()
    }

    pub fn is_pc(&self) -> bool {
        self.is_pc
    }

    pub fn set_pc(&mut self, is_pc: bool) {
        self.is_pc = is_pc;
    }
}

fn clamp_axis(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use aurora_nwscript::ObjectId;

    use super::{alignment_good_evil, alignment_law_chaos, Ability, Creature};
    use crate::error::LoadError;
    use crate::record::Record;
    use crate::services::{MemoryResources, ResourceType, Services};

    fn services() -> Services {
        Services::new(
            MemoryResources::new()
                .with(
                    ResourceType::Utc,
                    "nw_goblin",
                    Record::new()
                        .with("Tag", "GOBLIN_BP")
                        .with("FirstName", "Goblin")
                        .with("Appearance_Type", 86)
                        .with("Str", 12)
                        .with("HitPoints", 6)
                        .with(
                            "ClassList",
                            vec![
                                Record::new().with("Class", 0).with("ClassLevel", 2),
                                Record::new().with("Class", 4).with("ClassLevel", 1),
                            ],
                        ),
                )
                .with_table(
                    "portraits",
                    vec![Record::new(), Record::new().with("BaseResRef", "gob_")],
                ),
        )
    }

    #[test]
    fn instance_overrides_blueprint() {
        let services = services();
        let instance = Record::new()
            .with("TemplateResRef", "nw_goblin")
            .with("Tag", "goblin_chief")
            .with("PortraitId", 1)
            .with("XPosition", 4.0)
            .with("XOrientation", 0.0)
            .with("YOrientation", 1.0);
        let mut creature = Creature::new(ObjectId(3));
        creature.load_from(&instance, &services).expect("creature loads");

        assert_eq!(creature.tag(), "goblin_chief");
        assert_eq!(creature.name(), "Goblin");
        assert_eq!(creature.portrait(), "po_gob_");
        assert_eq!(creature.ability(Ability::Strength), 12);
        assert_eq!(creature.hit_dice(), 3);
        assert_eq!(creature.current_hp(), 6);
        assert_eq!(creature.position().x, 4.0);
        assert!((creature.facing() - 90.0).abs() < 1e-4);
        assert!(creature.is_loaded());
    }

    #[test]
    fn missing_blueprint_uses_instance_only() {
        let services = services();
        let instance = Record::new()
            .with("TemplateResRef", "does_not_exist")
            .with("Tag", "lonely")
            .with("Appearance_Type", 1);
        let mut creature = Creature::new(ObjectId(4));
        creature.load_from(&instance, &services).expect("creature loads");
        assert_eq!(creature.tag(), "lonely");
        assert_eq!(creature.appearance(), Some(1));
    }

    #[test]
    fn missing_appearance_is_a_load_error() {
        let services = services();
        let mut creature = Creature::new(ObjectId(5));
        let err = creature
            .load(&Record::new().with("Tag", "ghost"), None, &services)
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingAppearance("creature")));
        assert!(!creature.is_loaded());
    }

    #[test]
    #[should_panic(expected = "loaded twice")]
    fn loading_twice_is_a_bug() {
        let services = services();
        let record = Record::new().with("Appearance_Type", 1);
        let mut creature = Creature::new(ObjectId(6));
        creature.load(&record, None, &services).expect("first load");
        let _ = creature.load(&record, None, &services);
    }

    #[test]
    fn alignment_axes_bucket_at_thirty_and_seventy() {
        assert_eq!(alignment_law_chaos(85), super::ALIGNMENT_LAWFUL);
        assert_eq!(alignment_law_chaos(50), super::ALIGNMENT_NEUTRAL);
        assert_eq!(alignment_good_evil(10), super::ALIGNMENT_EVIL);
        assert_eq!(Ability::from_script(5), Some(Ability::Charisma));
        assert_eq!(Ability::from_script(6), None);
    }
}

//! Collaborators the runtime is handed instead of reaching for globals:
//! resources, the talk table, the renderer's model loader, the clock and the
//! bytecode interpreter.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use aurora_nwscript::{ObjectId, ScriptState};
use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::module::Module;
use crate::record::Record;

pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Resource kinds the runtime asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Ifo,
    Are,
    Git,
    Utc,
    Utd,
    Utp,
    Utw,
    Dlg,
}

impl ResourceType {
    pub fn extension(self) -> &'static str {
        match self {
            ResourceType::Ifo => "ifo",
            ResourceType::Are => "are",
            ResourceType::Git => "git",
            ResourceType::Utc => "utc",
            ResourceType::Utd => "utd",
            ResourceType::Utp => "utp",
            ResourceType::Utw => "utw",
            ResourceType::Dlg => "dlg",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let kind = match ext.to_ascii_lowercase().as_str() {
            "ifo" => ResourceType::Ifo,
            "are" => ResourceType::Are,
            "git" => ResourceType::Git,
            "utc" => ResourceType::Utc,
            "utd" => ResourceType::Utd,
            "utp" => ResourceType::Utp,
            "utw" => ResourceType::Utw,
            "dlg" => ResourceType::Dlg,
            _ => return None,
        };
        Some(kind)
    }
}

/// Resource lookup by name and type, plus table rows.
pub trait ResourceProvider {
    fn resource(&self, kind: ResourceType, name: &str) -> Option<Box<dyn ReadSeek>>;
    fn row(&self, table: &str, index: usize) -> Option<Record>;

    fn has_resource(&self, kind: ResourceType, name: &str) -> bool {
        self.resource(kind, name).is_some()
    }
}

/// Read and parse a structured record. `Ok(None)` when the resource does not
/// exist.
pub fn load_record(
    resources: &dyn ResourceProvider,
    kind: ResourceType,
    name: &str,
) -> Result<Option<Record>, LoadError> {
    let Some(mut stream) = resources.resource(kind, name) else {
        return Ok(None);
    };
    let mut data = Vec::new();
    stream
        .read_to_end(&mut data)
        .map_err(|source| LoadError::Io {
            name: name.to_string(),
            ext: kind.extension(),
            source,
        })?;
    let record = serde_json::from_slice(&data).map_err(|source| LoadError::Malformed {
        name: name.to_string(),
        ext: kind.extension(),
        source,
    })?;
    Ok(Some(record))
}

/// In-memory resources, keyed case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct MemoryResources {
    records: HashMap<(ResourceType, String), Vec<u8>>,
    tables: HashMap<String, Vec<Record>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(&mut self, kind: ResourceType, name: &str, data: Vec<u8>) {
        self.records.insert((kind, name.to_ascii_lowercase()), data);
    }

    pub fn insert(&mut self, kind: ResourceType, name: &str, record: &Record) {
        let data = serde_json::to_vec(record).unwrap_or_default();
        self.insert_raw(kind, name, data);
    }

    pub fn with(mut self, kind: ResourceType, name: &str, record: Record) -> Self {
        self.insert(kind, name, &record);
        self
    }

    pub fn insert_table(&mut self, table: &str, rows: Vec<Record>) {
        self.tables.insert(table.to_ascii_lowercase(), rows);
    }

    pub fn with_table(mut self, table: &str, rows: Vec<Record>) -> Self {
        self.insert_table(table, rows);
        self
    }
}

impl ResourceProvider for MemoryResources {
    fn resource(&self, kind: ResourceType, name: &str) -> Option<Box<dyn ReadSeek>> {
        let data = self.records.get(&(kind, name.to_ascii_lowercase()))?;
        Some(Box::new(Cursor::new(data.clone())))
    }

    fn row(&self, table: &str, index: usize) -> Option<Record> {
        self.tables
            .get(&table.to_ascii_lowercase())
            .and_then(|rows| rows.get(index))
            .cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn from_script(value: i32) -> Self {
        if value == 1 {
            Gender::Female
        } else {
            Gender::Male
        }
    }
}

/// Localized string lookup.
pub trait TalkTable {
    fn get_string(&self, strref: u32, gender: Gender) -> String;
}

/// Talk table held in memory. Female variants fall back to the male text.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TalkStrings {
    male: Vec<String>,
    #[serde(default)]
    female: Vec<String>,
}

impl TalkStrings {
    pub fn new(male: Vec<String>) -> Self {
        Self {
            male,
            female: Vec::new(),
        }
    }

    pub fn with_female(mut self, female: Vec<String>) -> Self {
        self.female = female;
        self
    }

    pub fn len(&self) -> usize {
        self.male.len()
    }

    pub fn is_empty(&self) -> bool {
        self.male.is_empty()
    }
}

impl TalkTable for TalkStrings {
    fn get_string(&self, strref: u32, gender: Gender) -> String {
        let index = strref as usize;
        let female = match gender {
            Gender::Female => self.female.get(index).filter(|text| !text.is_empty()),
            Gender::Male => None,
        };
        female
            .or_else(|| self.male.get(index))
            .cloned()
            .unwrap_or_default()
    }
}

/// Renderer-owned representation of an object.
pub trait Model: fmt::Debug {
    fn id(&self) -> u32;
    fn set_tag(&mut self, tag: &str);
    fn set_clickable(&mut self, clickable: bool);
    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;
    fn set_position(&mut self, position: Vec3);
    fn set_rotation(&mut self, rotation: Vec3);
    fn draw_bound(&mut self, enabled: bool);
    fn size(&self) -> Vec3;
}

/// `Ok(None)` means the object has no renderable and stays invisible. An
/// error is a loader failure and the object is skipped.
pub trait ModelLoader {
    fn load_model(&self, name: &str) -> Result<Option<Box<dyn Model>>, LoadError>;
}

/// Loader that never produces a model. Objects stay invisible and every
/// visual call is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullModels;

impl ModelLoader for NullModels {
    fn load_model(&self, _name: &str) -> Result<Option<Box<dyn Model>>, LoadError> {
        Ok(None)
    }
}

/// Model that only tracks its placement state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessModel {
    id: u32,
    name: String,
    tag: String,
    clickable: bool,
    visible: bool,
    bound: bool,
    position: Vec3,
    rotation: Vec3,
}

impl HeadlessModel {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Model for HeadlessModel {
    fn id(&self) -> u32 {
        self.id
    }

    fn set_tag(&mut self, tag: &str) {
        self.tag = tag.to_string();
    }

    fn set_clickable(&mut self, clickable: bool) {
        self.clickable = clickable;
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    fn draw_bound(&mut self, enabled: bool) {
        self.bound = enabled;
    }

    fn size(&self) -> Vec3 {
        Vec3::ONE
    }
}

/// Hands out headless models for every non-empty model name.
#[derive(Debug, Default)]
pub struct HeadlessModels {
    next_id: Cell<u32>,
}

impl ModelLoader for HeadlessModels {
    fn load_model(&self, name: &str) -> Result<Option<Box<dyn Model>>, LoadError> {
        if name.is_empty() {
            return Ok(None);
        }
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        Ok(Some(Box::new(HeadlessModel {
            id,
            name: name.to_string(),
            ..HeadlessModel::default()
        })))
    }
}

/// Millisecond time source driving the delayed action queue.
pub trait Clock {
    fn timestamp(&self) -> u64;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn timestamp(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn timestamp(&self) -> u64 {
        self.now.get()
    }
}

/// A request to run or resume a script.
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    pub script: String,
    pub state: Option<ScriptState>,
    pub owner: ObjectId,
    pub triggerer: ObjectId,
}

/// The bytecode interpreter. It calls back into the function bridge with the
/// module it is handed.
pub trait ScriptRunner {
    fn run_script(&self, module: &mut Module, request: ScriptRequest) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullScriptRunner;

impl ScriptRunner for NullScriptRunner {
    fn run_script(&self, _module: &mut Module, request: ScriptRequest) -> anyhow::Result<()> {
        debug!("no interpreter attached; skipping {}", request.script);
        Ok(())
    }
}

/// Coarse lock shared with the renderer. Held while an object changes area so
/// that a frame never sees it half moved.
#[derive(Debug, Clone, Default)]
pub struct FrameLock(Arc<Mutex<()>>);

impl FrameLock {
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Everything the runtime needs from the outside world.
#[derive(Clone)]
pub struct Services {
    pub resources: Rc<dyn ResourceProvider>,
    pub talk: Rc<dyn TalkTable>,
    pub models: Rc<dyn ModelLoader>,
    pub clock: Rc<dyn Clock>,
    pub scripts: Rc<dyn ScriptRunner>,
    pub frame_lock: FrameLock,
}

impl Services {
    pub fn new(resources: impl ResourceProvider + 'static) -> Self {
        Self {
            resources: Rc::new(resources),
            talk: Rc::new(TalkStrings::default()),
            models: Rc::new(NullModels),
            clock: Rc::new(SystemClock::default()),
            scripts: Rc::new(NullScriptRunner),
            frame_lock: FrameLock::default(),
        }
    }

    pub fn with_talk_table(mut self, talk: impl TalkTable + 'static) -> Self {
        self.talk = Rc::new(talk);
        self
    }

    pub fn with_models(mut self, models: impl ModelLoader + 'static) -> Self {
        self.models = Rc::new(models);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    pub fn with_scripts(mut self, scripts: impl ScriptRunner + 'static) -> Self {
        self.scripts = Rc::new(scripts);
        self
    }

    pub fn with_frame_lock(mut self, lock: FrameLock) -> Self {
        self.frame_lock = lock;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{
        load_record, Clock, Gender, HeadlessModels, ManualClock, MemoryResources, ModelLoader,
        ResourceProvider, ResourceType, TalkStrings, TalkTable,
    };
    use crate::error::LoadError;
    use crate::record::Record;

    #[test]
    fn memory_resources_are_case_insensitive() {
        let resources = MemoryResources::new()
            .with(ResourceType::Utc, "Goblin", Record::new().with("Tag", "gob"))
            .with_table("Portraits", vec![Record::new().with("BaseResRef", "gob_")]);
        let record = load_record(&resources, ResourceType::Utc, "goblin")
            .expect("valid json")
            .expect("present");
        assert_eq!(record.get_string("Tag", ""), "gob");
        assert!(resources.row("portraits", 0).is_some());
        assert!(resources.row("portraits", 1).is_none());
        assert!(load_record(&resources, ResourceType::Utp, "goblin")
            .expect("absent is fine")
            .is_none());
    }

    #[test]
    fn malformed_records_report_the_resource() {
        let mut resources = MemoryResources::new();
        resources.insert_raw(ResourceType::Are, "broken", b"{not json".to_vec());
        let err = load_record(&resources, ResourceType::Are, "broken").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { ext: "are", .. }));
    }

    #[test]
    fn talk_table_falls_back_to_male_text() {
        let talk = TalkStrings::new(vec!["Hello".into(), "Sir".into()])
            .with_female(vec![String::new(), "Madam".into()]);
        assert_eq!(talk.get_string(0, Gender::Female), "Hello");
        assert_eq!(talk.get_string(1, Gender::Female), "Madam");
        assert_eq!(talk.get_string(1, Gender::Male), "Sir");
        assert_eq!(talk.get_string(9, Gender::Male), "");
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(10);
        let view = clock.clone();
        clock.advance(15);
        assert_eq!(view.timestamp(), 25);
    }

    #[test]
    fn headless_models_need_a_name() {
        let models = HeadlessModels::default();
        assert!(models.load_model("").unwrap().is_none());
        let first = models.load_model("plc_chest1").unwrap().expect("model");
        let second = models.load_model("plc_chest1").unwrap().expect("model");
        assert_ne!(first.id(), second.id());
        assert!(!first.is_visible());
    }
}

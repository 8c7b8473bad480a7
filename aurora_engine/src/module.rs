//! The loaded module: owns the object registry, the delayed action queue and
//! the random source, and implements the engine side of area changes,
//! conversations and object creation that script handlers call into.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use aurora_nwscript::{ObjectId, ScriptState};
use glam::Vec3;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::actions::{ActionKind, ActionQueue, DelayedAction, PendingAction};
use crate::error::LoadError;
use crate::location::Location;
use crate::object::{
    Area, Creature, Door, ModuleObject, Object, ObjectKind, ObjectType, Placeable, Waypoint,
};
use crate::record::Record;
use crate::registry::{ObjectRegistry, SearchContext};
use crate::services::{load_record, ResourceType, ScriptRequest, Services};

/// Instance lists of a GIT record, in load order.
const INSTANCE_LISTS: [(&str, ObjectKind); 4] = [
    ("Creature List", ObjectKind::Creature),
    ("Door List", ObjectKind::Door),
    ("Placeable List", ObjectKind::Placeable),
    ("WaypointList", ObjectKind::Waypoint),
];

/// A running conversation between the PC and an object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub dialog: String,
    pub pc: ObjectId,
    pub object: ObjectId,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectSummary {
    pub id: ObjectId,
    pub kind: &'static str,
    pub tag: String,
    pub name: String,
    pub area: Option<ObjectId>,
    pub position: [f32; 3],
    pub facing: f32,
}

/// Serializable view of the module for run reports.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleSnapshot {
    pub module: Option<String>,
    pub current_area: Option<ObjectId>,
    pub pc: Option<ObjectId>,
    pub objects: Vec<ObjectSummary>,
    pub pending_actions: Vec<PendingAction>,
    pub custom_tokens: BTreeMap<String, String>,
    pub conversation: Option<Conversation>,
}

pub struct Module {
    services: Services,
    objects: ObjectRegistry,
    module_id: ObjectId,
    areas: BTreeMap<String, ObjectId>,
    current_area: Option<ObjectId>,
    pc: Option<ObjectId>,
    actions: ActionQueue,
    rng: StdRng,
    tokens: BTreeMap<String, String>,
    area_searches: HashMap<(ObjectId, ObjectId), SearchContext>,
    entering: ObjectId,
    exiting: ObjectId,
    conversation: Option<Conversation>,
    events: Vec<String>,
}

impl Module {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            objects: ObjectRegistry::new(),
            module_id: ObjectId::INVALID,
            areas: BTreeMap::new(),
            current_area: None,
            pc: None,
            actions: ActionQueue::new(),
            rng: StdRng::from_entropy(),
            tokens: BTreeMap::new(),
            area_searches: HashMap::new(),
            entering: ObjectId::INVALID,
            exiting: ObjectId::INVALID,
            conversation: None,
            events: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.set_seed(seed);
        self
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.objects
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn actions(&self) -> &ActionQueue {
        &self.actions
    }

    pub fn log_event(&mut self, event: impl Into<String>) {
        self.events.push(event.into());
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn is_loaded(&self) -> bool {
        self.module_id.is_valid()
    }

    /// Handle of the module object, INVALID while nothing is loaded.
    pub fn module_id(&self) -> ObjectId {
        self.module_id
    }

    pub fn module_object(&self) -> Option<&ModuleObject> {
        self.objects.get(self.module_id).and_then(Object::as_module)
    }

    pub fn minutes_per_hour(&self) -> u32 {
        self.module_object()
            .map(ModuleObject::minutes_per_hour)
            .unwrap_or(2)
    }

    pub fn pc(&self) -> Option<ObjectId> {
        self.pc
    }

    /// Area the PC is in.
    pub fn current_area(&self) -> Option<ObjectId> {
        self.current_area
    }

    /// Loaded area by resref, case-insensitively.
    pub fn area(&self, resref: &str) -> Option<ObjectId> {
        self.areas.get(&resref.to_ascii_lowercase()).copied()
    }

    pub fn areas(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.areas.values().copied()
    }

    pub fn is_area(&self, id: ObjectId) -> bool {
        matches!(self.objects.get(id).map(Object::kind), Some(ObjectKind::Area))
    }

    pub fn entering_object(&self) -> ObjectId {
        self.entering
    }

    pub fn exiting_object(&self) -> ObjectId {
        self.exiting
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn load_module(&mut self, name: &str) -> Result<()> {
        if self.is_loaded() {
            self.unload();
        }

        let services = self.services.clone();
        let ifo = load_record(services.resources.as_ref(), ResourceType::Ifo, name)
            .with_context(|| format!("loading module {name}"))?
            .with_context(|| format!("module {name} not found"))?;

        let id = self.objects.allocate_id();
        let mut module = ModuleObject::new(id);
        module.load(name, &ifo, &services);

        let mut areas = module.areas().to_vec();
        if areas.is_empty() && !module.entry_area().is_empty() {
            areas.push(module.entry_area().to_string());
        }
        let tag = module.tag().to_string();
        self.module_id = id;
        self.objects.register(Object::Module(module));

        for area in &areas {
            if let Err(err) = self.load_area(area) {
                warn!("skipping area {area}: {err:#}");
            }
        }

        info!("loaded module {name} ({} areas)", self.areas.len());
        self.log_event(format!("module.load {tag} ({} areas)", self.areas.len()));
        Ok(())
    }

    /// Load an area and everything placed in it. Objects that fail to load
    /// are skipped; a missing ARE fails the whole area.
    pub fn load_area(&mut self, resref: &str) -> Result<ObjectId> {
        if let Some(id) = self.area(resref) {
            return Ok(id);
        }

        let services = self.services.clone();
        let resources = services.resources.as_ref();
        let are = load_record(resources, ResourceType::Are, resref)?.ok_or_else(|| {
            LoadError::MissingResource {
                name: resref.to_string(),
                ext: ResourceType::Are.extension(),
            }
        })?;
        let git = match load_record(resources, ResourceType::Git, resref) {
            Ok(git) => git.unwrap_or_default(),
            Err(err) => {
                warn!("area {resref}: ignoring instances: {err}");
                Record::default()
            }
        };

        let area_id = self.objects.allocate_id();
        let mut area = Area::new(area_id, resref);
        area.load(&are, &services);

        let mut placed = Vec::new();
        for (list, kind) in INSTANCE_LISTS {
            for (index, instance) in git.get_list(list).iter().enumerate() {
                let id = self.objects.allocate_id();
                match instantiate(kind, id, instance, &services) {
                    Ok(mut object) => {
                        object.base_mut().set_area(Some(area_id));
                        area.add_object(id);
                        placed.push(object);
                    }
                    Err(err) => warn!("area {resref}: skipping {} #{index}: {err}", kind.name()),
                }
            }
        }

        let count = placed.len();
        let tag = area.tag().to_string();
        self.objects.register(Object::Area(area));
        for object in placed {
            self.objects.register(object);
        }
        self.areas.insert(resref.to_ascii_lowercase(), area_id);

        debug!("loaded area {resref} with {count} objects");
        self.log_event(format!("area.load {tag} ({count} objects)"));
        Ok(area_id)
    }

    /// Destroy an area and every object in it. The PC survives, arealess.
    pub fn unload_area(&mut self, area: ObjectId) {
        if !self.is_area(area) {
            return;
        }
        for id in self.objects.ids_in_area(area) {
            if Some(id) == self.pc {
                if let Some(pc) = self.objects.get_mut(id) {
                    pc.hide();
                    pc.base_mut().set_area(None);
                }
                continue;
            }
            if let Some(mut object) = self.objects.unregister(id) {
                object.hide();
            }
        }
        if let Some(object) = self.objects.unregister(area) {
            self.log_event(format!("area.unload {}", object.tag()));
        }
        self.areas.retain(|_, id| *id != area);
        self.area_searches.retain(|(_, searched), _| *searched != area);
        if self.current_area == Some(area) {
            self.current_area = None;
        }
    }

    /// Drop everything the module owns. Handles are not reused afterwards.
    pub fn unload(&mut self) {
        self.actions.clear();
        self.area_searches.clear();
        self.end_conversation();

        let areas: Vec<ObjectId> = self.areas.values().copied().collect();
        for area in areas {
            self.unload_area(area);
        }
        if let Some(pc) = self.pc.take() {
            self.objects.unregister(pc);
        }
        self.objects.clear();
        self.module_id = ObjectId::INVALID;
        self.current_area = None;
        self.tokens.clear();
        self.entering = ObjectId::INVALID;
        self.exiting = ObjectId::INVALID;
        self.log_event("module.unload");
    }

    /// Build a PC from a creature record and make it the player character.
    pub fn load_pc(&mut self, record: &Record) -> Result<ObjectId> {
        let services = self.services.clone();
        let id = self.objects.allocate_id();
        let mut creature = Creature::new(id);
        creature
            .load(record, None, &services)
            .context("loading player character")?;
        self.objects.register(Object::Creature(creature));
        self.use_pc(id)?;
        Ok(id)
    }

    /// Make a registered creature the player character.
    pub fn use_pc(&mut self, id: ObjectId) -> Result<()> {
        let Some(creature) = self.objects.get_mut(id).and_then(Object::as_creature_mut) else {
            bail!("object {id} is not a creature");
        };
        creature.set_pc(true);
        let tag = creature.tag().to_string();
        if let Some(old) = self.pc.replace(id) {
            if old != id {
                self.objects.unregister(old);
            }
        }
        self.log_event(format!("pc.use {tag} (#{id})"));
        Ok(())
    }

    /// Put the PC at the module's entry point and run the entry hooks.
    pub fn enter(&mut self) -> Result<()> {
        let pc = self.pc.context("no player character")?;
        let module = self.module_object().context("no module loaded")?;
        let entry = module.entry_area().to_string();
        let position = module.entry_position();
        let facing = module.entry_facing();
        let area = self
            .area(&entry)
            .with_context(|| format!("entry area \"{entry}\" is not loaded"))?;

        if let Some(object) = self.objects.get_mut(pc) {
            object.base_mut().set_area(Some(area));
            object.set_position(position);
            object.base_mut().set_facing(facing);
        }
        self.moved_pc();

        self.run_hook(self.module_id, "OnClientEntr", pc);
        self.log_event(format!("module.enter {entry}"));
        Ok(())
    }

    /// Move the PC to a position in a loaded area.
    pub fn move_pc(&mut self, area: &str, position: Vec3) -> Result<()> {
        let pc = self.pc.context("no player character")?;
        let target = self
            .area(area)
            .with_context(|| format!("area \"{area}\" is not loaded"))?;
        if !self.jump_to(pc, target, position) {
            bail!("player character cannot jump to \"{area}\"");
        }
        Ok(())
    }

    /// React to the PC having changed position: swap the visible area and run
    /// the exit and enter hooks when the area changed.
    pub fn moved_pc(&mut self) {
        let Some(pc) = self.pc else {
            return;
        };
        let new_area = self.objects.get(pc).and_then(|object| object.base().area());
        if new_area == self.current_area {
            return;
        }

        if let Some(old) = self.current_area {
            self.exiting = pc;
            self.set_area_visible(old, false);
            self.run_hook(old, "OnExit", pc);
        }
        self.current_area = new_area;
        if let Some(new) = new_area {
            self.entering = pc;
            self.set_area_visible(new, true);
            self.run_hook(new, "OnEnter", pc);
            let tag = self.objects.get(new).map(Object::tag).unwrap_or_default();
            let event = format!("pc.area {tag}");
            self.log_event(event);
        }
    }

    fn set_area_visible(&mut self, area: ObjectId, visible: bool) {
        for id in self.objects.ids_in_area(area) {
            if let Some(object) = self.objects.get_mut(id) {
                if visible {
                    object.show();
                } else {
                    object.hide();
                }
            }
        }
    }

    /// Relocate an object, possibly into another area.
    ///
    /// Visibility follows the PC: an object leaving the PC's area is hidden,
    /// one arriving in it is shown. The frame lock is held for the move.
    /// Returns false, leaving the object untouched, when the jump is refused.
    pub fn jump_to(&mut self, id: ObjectId, area: ObjectId, position: Vec3) -> bool {
        let Some(object) = self.objects.get(id) else {
            debug!("jump_to: stale object {id}");
            return false;
        };
        let Some(current) = object.base().area() else {
            warn!("object \"{}\" is not in an area", object.tag());
            return false;
        };
        if !self.is_area(area) {
            warn!("jump_to: {area} is not a loaded area");
            return false;
        }
        let pc_area = self
            .pc
            .and_then(|pc| self.objects.get(pc))
            .and_then(|pc| pc.base().area());
        let is_pc = Some(id) == self.pc;

        let frame_lock = self.services.frame_lock.clone();
        let guard = frame_lock.lock();
        if current != area {
            if let Some(object) = self.objects.get_mut(id) {
                if pc_area == Some(current) {
                    object.hide();
                }
                object.base_mut().set_area(Some(area));
                if pc_area == Some(area) {
                    object.show();
                }
            }
            if !is_pc {
                if let Some(old) = self.objects.get_mut(current).and_then(Object::as_area_mut) {
                    old.remove_object(id);
                }
                if let Some(new) = self.objects.get_mut(area).and_then(Object::as_area_mut) {
                    new.add_object(id);
                }
            }
        }
        if let Some(object) = self.objects.get_mut(id) {
            object.set_position(position);
        }
        drop(guard);

        if is_pc {
            self.moved_pc();
        }
        true
    }

    /// Queue a script to run `delay_ms` from now.
    pub fn delay_script(
        &mut self,
        script: &str,
        state: Option<ScriptState>,
        owner: ObjectId,
        triggerer: ObjectId,
        delay_ms: u64,
    ) {
        let timestamp = self.services.clock.timestamp().saturating_add(delay_ms);
        self.actions
            .push(DelayedAction::script(script, state, owner, triggerer, timestamp));
    }

    /// Queue the destruction of `owner`.
    pub fn delay_destroy(&mut self, owner: ObjectId, delay_ms: u64) {
        let timestamp = self.services.clock.timestamp().saturating_add(delay_ms);
        self.actions.push(DelayedAction::destroy(owner, timestamp));
    }

    /// Run every action that is due. Actions queued while this runs wait for
    /// the next call. Returns how many actions ran.
    pub fn process_actions(&mut self) -> usize {
        let now = self.services.clock.timestamp();
        let due = self.actions.drain_due(now);
        let mut executed = 0;
        for action in due {
            if !self.is_alive(action.owner) || !self.is_alive(action.triggerer) {
                debug!(
                    "dropping {} for {}: owner or triggerer is gone",
                    action.label(),
                    action.owner
                );
                continue;
            }
            match action.kind {
                ActionKind::Script { script, state } => {
                    if let Err(err) =
                        self.run_script(&script, state, action.owner, action.triggerer)
                    {
                        warn!("delayed script {script} failed: {err:#}");
                    }
                }
                ActionKind::Destroy => {
                    self.destroy_object(action.owner);
                }
            }
            executed += 1;
        }
        executed
    }

    /// An invalid handle never names anything, so it cannot go stale.
    fn is_alive(&self, id: ObjectId) -> bool {
        !id.is_valid() || self.objects.contains(id)
    }

    /// Hand a script to the interpreter. An empty name does nothing.
    pub fn run_script(
        &mut self,
        script: &str,
        state: Option<ScriptState>,
        owner: ObjectId,
        triggerer: ObjectId,
    ) -> Result<()> {
        if script.is_empty() {
            return Ok(());
        }
        self.log_event(format!("script.run {script} (owner {owner})"));
        let runner = Rc::clone(&self.services.scripts);
        runner.run_script(
            self,
            ScriptRequest {
                script: script.to_string(),
                state,
                owner,
                triggerer,
            },
        )
    }

    /// Run the script bound to `event` on `object`, if any.
    pub fn run_hook(&mut self, object: ObjectId, event: &str, triggerer: ObjectId) {
        let Some(script) = self
            .objects
            .get(object)
            .and_then(|object| object.base().script(event))
            .map(str::to_string)
        else {
            return;
        };
        if let Err(err) = self.run_script(&script, None, object, triggerer) {
            warn!("{event} script {script} failed: {err:#}");
        }
    }

    /// Start a conversation between the PC and `object`. An empty `dialog`
    /// uses the object's own conversation.
    pub fn start_conversation(&mut self, dialog: &str, pc: ObjectId, object: ObjectId) -> bool {
        let Some(pc_tag) = self
            .objects
            .get(pc)
            .and_then(Object::as_creature)
            .filter(|creature| creature.is_pc())
            .map(|creature| creature.tag().to_string())
        else {
            debug!("start_conversation: {pc} is not a PC");
            return false;
        };
        let Some(target) = self.objects.get(object) else {
            debug!("start_conversation: stale object {object}");
            return false;
        };

        if let Some(speaker) = target.base().pc_speaker() {
            if speaker != pc {
                let other = self.objects.get(speaker).map(Object::tag).unwrap_or_default();
                warn!(
                    "object \"{}\" is already in conversation with \"{other}\"",
                    target.tag()
                );
                return false;
            }
        }

        let dialog = if dialog.is_empty() {
            target.base().conversation().to_string()
        } else {
            dialog.to_string()
        };
        if dialog.is_empty() {
            debug!("object \"{}\" has no conversation", target.tag());
            return false;
        }
        if !self
            .services
            .resources
            .has_resource(ResourceType::Dlg, &dialog)
        {
            warn!("conversation \"{dialog}\" does not exist");
            return false;
        }

        let object_tag = target.tag().to_string();
        self.end_conversation();
        if let Some(target) = self.objects.get_mut(object) {
            target.base_mut().set_pc_speaker(Some(pc));
        }
        self.log_event(format!("conversation.start {dialog} ({pc_tag} <-> {object_tag})"));
        self.conversation = Some(Conversation { dialog, pc, object });
        true
    }

    pub fn end_conversation(&mut self) {
        let Some(conversation) = self.conversation.take() else {
            return;
        };
        if let Some(object) = self.objects.get_mut(conversation.object) {
            object.base_mut().set_pc_speaker(None);
        }
        self.log_event(format!("conversation.end {}", conversation.dialog));
    }

    /// Create an object from its blueprint at `location`.
    pub fn create_object(
        &mut self,
        object_type: ObjectType,
        template: &str,
        location: &Location,
        new_tag: &str,
    ) -> Result<ObjectId> {
        let (kind, resource) = match object_type {
            ObjectType::CREATURE => (ObjectKind::Creature, ResourceType::Utc),
            ObjectType::PLACEABLE => (ObjectKind::Placeable, ResourceType::Utp),
            ObjectType::WAYPOINT => (ObjectKind::Waypoint, ResourceType::Utw),
            other => return Err(LoadError::UnsupportedType(other.bits()).into()),
        };
        let Some(area) = location.area().filter(|area| self.is_area(*area)) else {
            bail!("cannot create \"{template}\": location has no loaded area");
        };

        let services = self.services.clone();
        let blueprint = load_record(services.resources.as_ref(), resource, template)?
            .ok_or_else(|| LoadError::MissingResource {
                name: template.to_string(),
                ext: resource.extension(),
            })?;

        let id = self.objects.allocate_id();
        let mut object = from_blueprint(kind, id, &blueprint, &services)?;
        let base = object.base_mut();
        base.set_template(template);
        if !new_tag.is_empty() {
            base.set_tag(new_tag);
        }
        base.set_area(Some(area));
        base.set_facing(location.facing());
        object.set_position(location.position());
        if self.current_area == Some(area) {
            object.show();
        }

        let tag = object.tag().to_string();
        if let Some(area) = self.objects.get_mut(area).and_then(Object::as_area_mut) {
            area.add_object(id);
        }
        self.objects.register(object);
        self.log_event(format!("object.create {tag} (#{id})"));
        Ok(id)
    }

    /// Remove an object from the world. Modules and areas are never destroyed
    /// this way.
    pub fn destroy_object(&mut self, id: ObjectId) -> bool {
        match self.objects.get(id).map(Object::kind) {
            None => {
                debug!("destroy_object: stale object {id}");
                return false;
            }
            Some(kind @ (ObjectKind::Module | ObjectKind::Area)) => {
                warn!("refusing to destroy {} {id}", kind.name());
                return false;
            }
            Some(_) => {}
        }

        if self
            .conversation
            .as_ref()
            .is_some_and(|conversation| conversation.object == id || conversation.pc == id)
        {
            self.end_conversation();
        }

        let Some(mut object) = self.objects.unregister(id) else {
            return false;
        };
        object.hide();
        if let Some(area) = object.base().area() {
            if let Some(area) = self.objects.get_mut(area).and_then(Object::as_area_mut) {
                area.remove_object(id);
            }
        }
        if self.pc == Some(id) {
            self.pc = None;
        }
        self.area_searches.retain(|(caller, _), _| *caller != id);
        self.log_event(format!("object.destroy {} (#{id})", object.tag()));
        true
    }

    pub fn find_object_init(&self, ctx: &mut SearchContext, tag: Option<&str>) -> bool {
        self.objects.find_object_init(ctx, tag)
    }

    pub fn find_next_object(&self, ctx: &mut SearchContext) -> bool {
        self.objects.find_next_object(ctx)
    }

    /// Game objects in `area` matching `filter`, nearest to `position` first.
    ///
    /// Distance is the sum of the per-axis differences. Ties keep registry
    /// order.
    pub fn nearest_objects<F>(
        &self,
        area: ObjectId,
        position: Vec3,
        exclude: ObjectId,
        filter: F,
    ) -> Vec<ObjectId>
    where
        F: Fn(&Object) -> bool,
    {
        let mut ctx = SearchContext::new();
        let mut found = Vec::new();
        self.objects.find_object_init(&mut ctx, None);
        while self.objects.find_next_object(&mut ctx) {
            let Some(object) = ctx.current().and_then(|id| self.objects.get(id)) else {
                continue;
            };
            if object.id() == exclude
                || !object.kind().is_game_object()
                || object.base().area() != Some(area)
                || !filter(object)
            {
                continue;
            }
            found.push((object.id(), manhattan(position, object.base().position())));
        }
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found.into_iter().map(|(id, _)| id).collect()
    }

    /// Restart `caller`'s walk over the objects in `area` and return the first.
    pub fn first_object_in_area(&mut self, caller: ObjectId, area: ObjectId) -> ObjectId {
        let candidates = self
            .objects
            .ids_in_area(area)
            .into_iter()
            .filter(|id| Some(*id) != self.pc)
            .collect();
        self.area_searches
            .insert((caller, area), SearchContext::over(candidates));
        self.next_object_in_area(caller, area)
    }

    /// Continue `caller`'s walk over `area`. INVALID once exhausted or if no
    /// walk was started.
    pub fn next_object_in_area(&mut self, caller: ObjectId, area: ObjectId) -> ObjectId {
        let Some(ctx) = self.area_searches.get_mut(&(caller, area)) else {
            return ObjectId::INVALID;
        };
        if self.objects.find_next_object(ctx) {
            ctx.current().unwrap_or(ObjectId::INVALID)
        } else {
            ObjectId::INVALID
        }
    }

    pub fn set_custom_token(&mut self, number: i32, value: &str) {
        self.tokens
            .insert(format!("<CUSTOM{number}>"), value.to_string());
    }

    pub fn custom_token(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }

    pub fn custom_tokens(&self) -> &BTreeMap<String, String> {
        &self.tokens
    }

    pub fn snapshot(&self) -> ModuleSnapshot {
        let objects = self
            .objects
            .iter()
            .map(|object| {
                let base = object.base();
                ObjectSummary {
                    id: object.id(),
                    kind: object.kind().name(),
                    tag: base.tag().to_string(),
                    name: base.name().to_string(),
                    area: base.area(),
                    position: base.position().to_array(),
                    facing: base.facing(),
                }
            })
            .collect();
        ModuleSnapshot {
            module: self.module_object().map(|module| module.tag().to_string()),
            current_area: self.current_area,
            pc: self.pc,
            objects,
            pending_actions: self.actions.pending(),
            custom_tokens: self.tokens.clone(),
            conversation: self.conversation.clone(),
        }
    }
}

fn manhattan(a: Vec3, b: Vec3) -> f32 {
    let d = (a - b).abs();
    d.x + d.y + d.z
}

/// Build a placed instance, pulling in the blueprint it names.
fn instantiate(
    kind: ObjectKind,
    id: ObjectId,
    instance: &Record,
    services: &Services,
) -> Result<Object, LoadError> {
    let object = match kind {
        ObjectKind::Creature => {
            let mut creature = Creature::new(id);
            creature.load_from(instance, services)?;
            Object::Creature(creature)
        }
        ObjectKind::Door => {
            let mut door = Door::new(id);
            door.load_from(instance, services)?;
            Object::Door(door)
        }
        ObjectKind::Placeable => {
            let mut placeable = Placeable::new(id);
            placeable.load_from(instance, services)?;
            Object::Placeable(placeable)
        }
        ObjectKind::Waypoint => {
            let mut waypoint = Waypoint::new(id);
            waypoint.load_from(instance, services)?;
            Object::Waypoint(waypoint)
        }
        ObjectKind::Module | ObjectKind::Area => {
            return Err(LoadError::UnsupportedType(kind.object_type().bits()))
        }
    };
    Ok(object)
}

/// Build an object from a blueprint alone.
fn from_blueprint(
    kind: ObjectKind,
    id: ObjectId,
    blueprint: &Record,
    services: &Services,
) -> Result<Object, LoadError> {
    let instance = Record::new();
    let object = match kind {
        ObjectKind::Creature => {
            let mut creature = Creature::new(id);
            creature.load(&instance, Some(blueprint), services)?;
            Object::Creature(creature)
        }
        ObjectKind::Placeable => {
            let mut placeable = Placeable::new(id);
            placeable.load(&instance, Some(blueprint), services)?;
            Object::Placeable(placeable)
        }
        ObjectKind::Waypoint => {
            let mut waypoint = Waypoint::new(id);
            waypoint.load(&instance, Some(blueprint), services)?;
            Object::Waypoint(waypoint)
        }
        _ => return Err(LoadError::UnsupportedType(kind.object_type().bits())),
    };
    Ok(object)
}

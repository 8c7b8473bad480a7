//! A small loaded module for exercising script functions.

use std::cell::RefCell;
use std::rc::Rc;

use aurora_nwscript::{CallSite, ObjectId, Variable};

use super::{build_function_table, ScriptFunctions};
use crate::module::Module;
use crate::record::Record;
use crate::services::{
    ManualClock, MemoryResources, ResourceType, ScriptRequest, ScriptRunner, Services,
    TalkStrings,
};

/// Scripts handed to the interpreter, in order.
#[derive(Default, Clone)]
pub(crate) struct RecordingRunner {
    pub runs: Rc<RefCell<Vec<ScriptRequest>>>,
}

impl ScriptRunner for RecordingRunner {
    fn run_script(&self, _module: &mut Module, request: ScriptRequest) -> anyhow::Result<()> {
        self.runs.borrow_mut().push(request);
        Ok(())
    }
}

pub(crate) struct World {
    pub module: Module,
    pub functions: ScriptFunctions,
    pub clock: ManualClock,
    pub runs: Rc<RefCell<Vec<ScriptRequest>>>,
}

/// Layout of the yard, PC at the origin:
///
/// | tag      | kind      | position |
/// |----------|-----------|----------|
/// | WP_START | waypoint  | (1,0,0)  |
/// | CHEST    | placeable | (1,1,0)  |
/// | GATE     | door      | (3,0,0)  |
/// | NPC      | creature  | (2,2,0)  |
/// | NPC      | creature  | (5,0,0)  |
/// | VAULT    | door      | (8,0,0)  |
fn resources() -> MemoryResources {
    let npc_far = Record::new()
        .with("Tag", "NPC")
        .with("FirstName", "Aldo")
        .with("LastName", "Brand")
        .with("Appearance_Type", 1)
        .with("XPosition", 5.0)
        .with("HitPoints", 12)
        .with("CurrentHitPoints", 7)
        .with("LawfulChaotic", 80)
        .with("GoodEvil", 20)
        .with("Str", 14)
        .with("Race", 3)
        .with("Conversation", "npc_talk")
        .with(
            "ClassList",
            vec![
                Record::new().with("Class", 0).with("ClassLevel", 3),
                Record::new().with("Class", 4).with("ClassLevel", 2),
            ],
        );
    let npc_near = Record::new()
        .with("Tag", "NPC")
        .with("Appearance_Type", 1)
        .with("XPosition", 2.0)
        .with("YPosition", 2.0);

    MemoryResources::new()
        .with(
            ResourceType::Ifo,
            "m",
            Record::new()
                .with("Mod_Tag", "MOD")
                .with("Mod_Entry_Area", "yard")
                .with("Mod_MinPerHour", 3)
                .with(
                    "Mod_Area_list",
                    vec![
                        Record::new().with("Area_Name", "yard"),
                        Record::new().with("Area_Name", "cellar"),
                    ],
                ),
        )
        .with(
            ResourceType::Are,
            "yard",
            Record::new().with("Tag", "YARD").with("Name", "The Yard"),
        )
        .with(ResourceType::Are, "cellar", Record::new().with("Tag", "CELLAR"))
        .with(
            ResourceType::Git,
            "yard",
            Record::new()
                .with("Creature List", vec![npc_far, npc_near])
                .with(
                    "Door List",
                    vec![
                        Record::new()
                            .with("Tag", "GATE")
                            .with("Appearance", 0)
                            .with("X", 3.0)
                            .with("OnOpen", "gate_open"),
                        Record::new()
                            .with("Tag", "VAULT")
                            .with("Appearance", 0)
                            .with("X", 8.0)
                            .with("Locked", true)
                            .with("OnFailToOpen", "vault_locked"),
                    ],
                )
                .with(
                    "Placeable List",
                    vec![Record::new()
                        .with("Tag", "CHEST")
                        .with("Appearance", 0)
                        .with("X", 1.0)
                        .with("Y", 1.0)],
                )
                .with(
                    "WaypointList",
                    vec![Record::new().with("Tag", "WP_START").with("XPosition", 1.0)],
                ),
        )
        .with(
            ResourceType::Utc,
            "goblin",
            Record::new().with("Tag", "GOBLIN").with("Appearance_Type", 2),
        )
        .with(ResourceType::Dlg, "npc_talk", Record::new())
        .with(ResourceType::Dlg, "other_talk", Record::new())
}

impl World {
    pub fn new() -> Self {
        let clock = ManualClock::new(1_000);
        let runner = RecordingRunner::default();
        let runs = Rc::clone(&runner.runs);
        let talk = TalkStrings::new(vec!["Hello".into(), "Goodbye".into()])
            .with_female(vec!["Hello, lady".into()]);
        let services = Services::new(resources())
            .with_clock(clock.clone())
            .with_scripts(runner)
            .with_talk_table(talk);
        let mut module = Module::new(services).with_seed(7);
        module.load_module("m").expect("module loads");
        module
            .load_pc(
                &Record::new()
                    .with("Tag", "PLAYER")
                    .with("FirstName", "Hero")
                    .with("Appearance_Type", 0),
            )
            .expect("pc loads");
        module.enter().expect("pc enters");
        runs.borrow_mut().clear();

        Self {
            module,
            functions: build_function_table().expect("table registers"),
            clock,
            runs,
        }
    }

    pub fn pc(&self) -> ObjectId {
        self.module.pc().expect("pc is loaded")
    }

    /// The `n`th object (in load order) carrying `tag`.
    pub fn tagged(&self, tag: &str, n: usize) -> ObjectId {
        self.module.objects().with_tag(tag)[n]
    }

    pub fn yard(&self) -> ObjectId {
        self.module.area("yard").expect("yard is loaded")
    }

    pub fn cellar(&self) -> ObjectId {
        self.module.area("cellar").expect("cellar is loaded")
    }

    pub fn call(&mut self, name: &str, params: Vec<Variable>, caller: ObjectId) -> Variable {
        let site = CallSite::new(caller, ObjectId::INVALID, "test_script");
        self.functions
            .call_by_name(&mut self.module, name, params, &site)
            .expect("call dispatches")
    }

    /// Scripts that ran since the last check.
    pub fn take_runs(&self) -> Vec<(String, ObjectId, ObjectId)> {
        self.runs
            .borrow_mut()
            .drain(..)
            .map(|request| (request.script, request.owner, request.triggerer))
            .collect()
    }
}

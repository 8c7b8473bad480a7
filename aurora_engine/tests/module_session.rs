use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use aurora_engine::resources::ResourceDirectory;
use aurora_engine::script::build_function_table;
use aurora_engine::services::{HeadlessModels, ManualClock};
use aurora_engine::{Module, Services};
use aurora_nwscript::{CallSite, ObjectId, Variable};
use tempfile::tempdir;

fn write_module(dir: &Path) -> Result<()> {
    let tables = dir.join("2da");
    fs::create_dir_all(&tables)?;
    let files = [
        (
            dir.join("crypt.ifo"),
            r#"{
                "Mod_Tag": "CRYPT",
                "Mod_Entry_Area": "hall",
                "Mod_MinPerHour": 2,
                "Mod_Area_list": [{"Area_Name": "hall"}, {"Area_Name": "tomb"}]
            }"#,
        ),
        (dir.join("hall.are"), r#"{"Tag": "HALL"}"#),
        (dir.join("tomb.are"), r#"{"Tag": "TOMB"}"#),
        (
            dir.join("hall.git"),
            r#"{
                "Creature List": [
                    {"Tag": "GHOUL", "Appearance_Type": 1, "XPosition": 3.0},
                    {"Tag": "GHOUL", "Appearance_Type": 1, "XPosition": 1.0, "YPosition": 1.0}
                ],
                "Door List": [
                    {"Tag": "CRYPT_DOOR", "Appearance": 0, "X": 5.0}
                ]
            }"#,
        ),
        (
            dir.join("tomb.git"),
            r#"{"Placeable List": [{"Tag": "SARCOPHAGUS", "Appearance": 0}]}"#,
        ),
        (
            dir.join("skeleton.utc"),
            r#"{"Tag": "SKELETON", "Appearance_Type": 1}"#,
        ),
        (
            tables.join("appearance.2da.json"),
            r#"[{"RACE": "c_human"}, {"RACE": "c_ghoul"}]"#,
        ),
        (tables.join("doortypes.2da.json"), r#"[{"Model": "dor_crypt"}]"#),
        (tables.join("placeables.2da.json"), r#"[{"ModelName": "plc_sarc"}]"#),
    ];
    for (path, contents) in files {
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn load(dir: &Path, clock: &ManualClock) -> Result<Module> {
    let resources = ResourceDirectory::load_from_dir(dir)?;
    let services = Services::new(resources)
        .with_clock(clock.clone())
        .with_models(HeadlessModels::default());
    let mut module = Module::new(services).with_seed(11);
    module.load_module("crypt")?;
    Ok(module)
}

#[test]
fn areas_and_objects_load_from_disk() -> Result<()> {
    let dir = tempdir()?;
    write_module(dir.path())?;
    let module = load(dir.path(), &ManualClock::new(0))?;

    assert_eq!(module.areas().count(), 2);
    assert_eq!(module.minutes_per_hour(), 2);
    assert_eq!(module.objects().with_tag("ghoul").len(), 2);
    let door = module.objects().with_tag("CRYPT_DOOR")[0];
    assert!(module.objects().get(door).context("door is live")?.base().has_model());
    let tomb = module.area("tomb").context("tomb is loaded")?;
    let sarcophagus = module.objects().with_tag("SARCOPHAGUS")[0];
    assert_eq!(
        module.objects().get(sarcophagus).and_then(|object| object.base().area()),
        Some(tomb)
    );
    Ok(())
}

#[test]
fn script_functions_search_and_destroy() -> Result<()> {
    let dir = tempdir()?;
    write_module(dir.path())?;
    let clock = ManualClock::new(0);
    let mut module = load(dir.path(), &clock)?;
    let functions = build_function_table()?;
    let door = module.objects().with_tag("CRYPT_DOOR")[0];
    let site = CallSite::new(door, ObjectId::INVALID, "crypt_door_open");

    let second = functions
        .call_by_name(
            &mut module,
            "GetObjectByTag",
            vec![Variable::from("GHOUL"), Variable::Int(1)],
            &site,
        )?
        .as_object()?;
    assert_eq!(second, module.objects().with_tag("GHOUL")[1]);

    let nearest = functions
        .call_by_name(
            &mut module,
            "GetNearestObjectByTag",
            vec![Variable::from("GHOUL")],
            &site,
        )?
        .as_object()?;
    assert_eq!(nearest, module.objects().with_tag("GHOUL")[0]);

    functions.call_by_name(
        &mut module,
        "DestroyObject",
        vec![Variable::Object(nearest), Variable::Float(2.0)],
        &site,
    )?;
    clock.advance(1_999);
    assert_eq!(module.process_actions(), 0);
    clock.advance(1);
    assert_eq!(module.process_actions(), 1);
    assert!(module.objects().get(nearest).is_none());

    let stale = functions
        .call_by_name(&mut module, "GetTag", vec![Variable::Object(nearest)], &site)?;
    assert_eq!(stale.as_str()?, "");
    let valid = functions.call_by_name(
        &mut module,
        "GetIsObjectValid",
        vec![Variable::Object(nearest)],
        &site,
    )?;
    assert_eq!(valid.as_int()?, 0);
    Ok(())
}

#[test]
fn created_objects_join_the_search_index() -> Result<()> {
    let dir = tempdir()?;
    write_module(dir.path())?;
    let mut module = load(dir.path(), &ManualClock::new(0))?;
    let functions = build_function_table()?;
    let site = CallSite::new(module.module_id(), ObjectId::INVALID, "spawn");
    let door = module.objects().with_tag("CRYPT_DOOR")[0];

    let location =
        functions.call_by_name(&mut module, "GetLocation", vec![Variable::Object(door)], &site)?;
    let skeleton = functions
        .call_by_name(
            &mut module,
            "CreateObject",
            vec![Variable::Int(1), Variable::from("skeleton"), location],
            &site,
        )?
        .as_object()?;
    assert!(skeleton.is_valid());
    assert_eq!(module.objects().with_tag("SKELETON"), &[skeleton]);
    assert!(module
        .events()
        .iter()
        .any(|event| event.starts_with("object.create SKELETON")));
    Ok(())
}

//! Resources read from a directory of JSON stand-ins for the game archives.
//!
//! `<name>.<ext>` files hold records (`guard.utc`, `m01.ifo`, ...),
//! `<table>.2da.json` files hold a JSON array of rows, and `dialog.tlk.json`
//! (plus an optional `dialogf.tlk.json`) holds the talk table strings.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use walkdir::WalkDir;

use crate::record::Record;
use crate::services::{ReadSeek, ResourceProvider, ResourceType, TalkStrings};

const TALK_TABLE: &str = "dialog.tlk.json";
const TALK_TABLE_FEMALE: &str = "dialogf.tlk.json";
const TABLE_SUFFIX: &str = ".2da.json";

/// Every resource below a directory, indexed by lowercase name. Records are
/// read on demand; tables and the talk table are parsed up front.
#[derive(Debug)]
pub struct ResourceDirectory {
    root: PathBuf,
    records: HashMap<(ResourceType, String), PathBuf>,
    tables: HashMap<String, Vec<Record>>,
    talk: Option<TalkStrings>,
}

impl ResourceDirectory {
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }

        let mut resources = Self {
            root: dir.to_path_buf(),
            records: HashMap::new(),
            tables: HashMap::new(),
            talk: None,
        };
        let mut female = None;

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry under {}: {err}", dir.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let file_name = file_name.to_ascii_lowercase();

            if file_name == TALK_TABLE || file_name == TALK_TABLE_FEMALE {
                match read_json::<Vec<String>>(path) {
                    Ok(strings) if file_name == TALK_TABLE => {
                        resources.talk = Some(TalkStrings::new(strings));
                    }
                    Ok(strings) => female = Some(strings),
                    Err(err) => warn!("{err:#}"),
                }
            } else if let Some(table) = file_name.strip_suffix(TABLE_SUFFIX) {
                match read_json::<Vec<Record>>(path) {
                    Ok(rows) => {
                        resources.tables.insert(table.to_string(), rows);
                    }
                    Err(err) => warn!("{err:#}"),
                }
            } else if let Some((name, kind)) = file_name
                .rsplit_once('.')
                .and_then(|(name, ext)| Some((name, ResourceType::from_extension(ext)?)))
            {
                let key = (kind, name.to_string());
                if let Some(previous) = resources.records.insert(key, path.to_path_buf()) {
                    warn!(
                        "{} shadows {}",
                        path.display(),
                        previous.display()
                    );
                }
            } else {
                debug!("ignoring {}", path.display());
            }
        }

        if let Some(female) = female {
            let male = resources.talk.take().unwrap_or_default();
            resources.talk = Some(male.with_female(female));
        }
        if resources.records.is_empty() && resources.tables.is_empty() {
            bail!("no resources found in {}", dir.display());
        }

        info!(
            "indexed {} records and {} tables under {}",
            resources.records.len(),
            resources.tables.len(),
            dir.display()
        );
        Ok(resources)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn talk_table(&self) -> Option<&TalkStrings> {
        self.talk.as_ref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ResourceProvider for ResourceDirectory {
    fn resource(&self, kind: ResourceType, name: &str) -> Option<Box<dyn ReadSeek>> {
        let path = self.records.get(&(kind, name.to_ascii_lowercase()))?;
        match File::open(path) {
            Ok(file) => Some(Box::new(file)),
            Err(err) => {
                warn!("opening {}: {err}", path.display());
                None
            }
        }
    }

    fn row(&self, table: &str, index: usize) -> Option<Record> {
        self.tables
            .get(&table.to_ascii_lowercase())
            .and_then(|rows| rows.get(index))
            .cloned()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))
}

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;

static CALL_SPEC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?::(.*))?$").expect("valid regex"));

#[derive(Parser, Debug)]
#[command(
    about = "Headless host that loads a module and drives script functions",
    version
)]
pub struct Args {
    /// Directory of JSON resources (records, 2DA tables, talk table)
    #[arg(long)]
    pub resources: Option<PathBuf>,

    /// Module IFO to load from the resource directory (requires --resources)
    #[arg(long)]
    pub module: Option<String>,

    /// Creature blueprint (UTC) to load as the player character
    #[arg(long, value_name = "UTC")]
    pub pc: Option<String>,

    /// Seed for the deterministic random source
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Number of delayed-action ticks to simulate after the calls
    #[arg(long, default_value_t = 0)]
    pub ticks: u32,

    /// Milliseconds of game time per tick
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,

    /// Call a script function by name, e.g. `--call GetObjectByTag:NPC,1`
    #[arg(long = "call", value_name = "NAME[:ARG,...]")]
    pub calls: Vec<String>,

    /// Object the calls run as: a tag, `pc` or `module` (default: the module)
    #[arg(long)]
    pub caller: Option<String>,

    /// Print the registered function table as JSON and exit
    #[arg(long)]
    pub list_functions: bool,

    /// Path to write the run report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Log at debug level
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug)]
pub enum Command {
    ListFunctions,
    Run(RunArgs),
}

#[derive(Debug)]
pub struct RunArgs {
    pub resources: PathBuf,
    pub module: String,
    pub pc: Option<String>,
    pub seed: u64,
    pub ticks: u32,
    pub tick_ms: u64,
    pub calls: Vec<CallSpec>,
    pub caller: Option<String>,
    pub report: Option<PathBuf>,
}

/// One `--call` argument: a function name and its literal arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSpec {
    pub name: String,
    pub args: Vec<String>,
}

impl CallSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let Some(captures) = CALL_SPEC.captures(spec.trim()) else {
            bail!("malformed --call {spec:?}, expected NAME[:ARG,...]");
        };
        let name = captures[1].to_string();
        let args = match captures.get(2) {
            Some(args) if !args.as_str().is_empty() => {
                args.as_str().split(',').map(|arg| arg.trim().to_string()).collect()
            }
            _ => Vec::new(),
        };
        Ok(Self { name, args })
    }
}

pub fn parse() -> Result<Command> {
    let args = Args::parse();
    args.into_command()
}

impl Args {
    pub fn into_command(self) -> Result<Command> {
        if self.list_functions {
            return Ok(Command::ListFunctions);
        }
        if self.module.is_some() && self.resources.is_none() {
            bail!("--module requires --resources");
        }
        let Some(resources) = self.resources else {
            bail!("--resources is required unless --list-functions is given");
        };
        let Some(module) = self.module else {
            bail!("--module is required to run");
        };
        if self.tick_ms == 0 && self.ticks > 0 {
            bail!("--tick-ms must be positive");
        }

        let calls = self
            .calls
            .iter()
            .map(|spec| CallSpec::parse(spec))
            .collect::<Result<Vec<_>>>()?;

        Ok(Command::Run(RunArgs {
            resources,
            module,
            pc: self.pc,
            seed: self.seed,
            ticks: self.ticks,
            tick_ms: self.tick_ms,
            calls,
            caller: self.caller,
            report: self.report,
        }))
    }
}

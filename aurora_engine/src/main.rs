use std::fs;

use anyhow::{Context, Result};
use aurora_engine::cli::{self, Command};
use aurora_engine::runtime::{execute, function_table_json, RunReport};

fn main() -> Result<()> {
    let verbose = std::env::args().any(|arg| arg == "--verbose");
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli::parse()? {
        Command::ListFunctions => {
            println!("{}", function_table_json()?);
        }
        Command::Run(args) => {
            let report = execute(&args)?;
            describe_run(&report);
            if let Some(path) = args.report.as_ref() {
                let json = serde_json::to_string_pretty(&report)
                    .context("serializing run report to JSON")?;
                fs::write(path, json)
                    .with_context(|| format!("writing run report to {}", path.display()))?;
                println!("Saved run report to {}", path.display());
            }
        }
    }
    Ok(())
}

fn describe_run(report: &RunReport) {
    let snapshot = &report.snapshot;
    println!(
        "Module: {} | objects: {} | pending actions: {}",
        snapshot.module.as_deref().unwrap_or(&report.module),
        snapshot.objects.len(),
        snapshot.pending_actions.len()
    );

    if !report.calls.is_empty() {
        println!("\nCalls:");
        for call in &report.calls {
            let outcome = match (&call.result, &call.error) {
                (Some(result), _) => result.clone(),
                (None, Some(error)) => format!("error: {error}"),
                (None, None) => String::new(),
            };
            println!("  {}({}) -> {}", call.name, call.args.join(", "), outcome);
        }
    }

    if report.ticks > 0 {
        println!(
            "\nTicks: {} | delayed actions executed: {}",
            report.ticks, report.actions_executed
        );
    }

    println!("\nEvents:");
    for event in &report.events {
        println!("  {event}");
    }
}

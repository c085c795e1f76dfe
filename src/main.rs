//! Entry point for the **gdswitch** command.
//!
//! Parses one command, runs it against gdctl and exits.  Exit status is 0
//! on success and 1 on any failure.

use gdswitch::backup::BackupStore;
use gdswitch::command::{parse_args, Command};
use gdswitch::config::Config;
use gdswitch::gdctl::tool::GdctlTool;
use gdswitch::profile::Catalog;
use gdswitch::render;
use gdswitch::switcher::{MonitorSelector, SwitchError};
use log::{info, warn};
use std::process::ExitCode;

/// Try to load the config from the default path, falling back to the
/// compiled-in table.
fn load_config() -> Config {
    let path = Config::default_path();
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) if e.is_not_found() => {
            info!("no config file at {}, using defaults", path.display());
            Config::default()
        }
        Err(e) => {
            warn!("{}, using defaults", e);
            Config::default()
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let cmd = match parse_args(&arg_refs) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("gdswitch: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = load_config();
    let catalog = match config.catalog() {
        Ok(c) => c,
        Err(e) => {
            // Only reachable if the compiled-in table itself is broken.
            eprintln!("gdswitch: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let selector = MonitorSelector::new(
        GdctlTool::new(&config.tool),
        catalog,
        BackupStore::new(config.backup.resolved_dir()),
    );

    match run(&selector, cmd) {
        Ok(code) => code,
        Err(e) => {
            let env = match e {
                SwitchError::NotConnected { ref connected, .. } => {
                    Some(selector.environment(connected))
                }
                _ => None,
            };
            eprint!("{}", render::failure(&e, env));
            ExitCode::FAILURE
        }
    }
}

fn run(selector: &MonitorSelector<GdctlTool>, cmd: Command) -> Result<ExitCode, SwitchError> {
    let catalog: &Catalog = selector.catalog();
    match cmd {
        Command::Usage => {
            let connected = selector.list_available().ok();
            let current = connected.as_ref().map(|c| (c, selector.environment(c)));
            print!("{}", render::usage(catalog, current));
            return Ok(ExitCode::FAILURE);
        }
        Command::Help => print!("{}", render::usage(catalog, None)),
        Command::Show => {
            println!("Current monitor configuration:");
            println!("{}", "=".repeat(50));
            print!("{}", selector.show_current()?);
        }
        Command::List => print!("{}", render::list(catalog)),
        Command::Available => {
            let connected = selector.list_available()?;
            let env = selector.environment(&connected);
            let satisfied = selector.satisfied_targets(&connected);
            print!("{}", render::available(catalog, &connected, env, &satisfied));
        }
        Command::Modes(filter) => {
            let mut monitors = selector.list_modes()?;
            if let Some(ref name) = filter {
                let wanted = match catalog.resolve(name) {
                    Some(target) => target.name().to_string(),
                    None => name.clone(),
                };
                monitors.retain(|m| m.id == wanted);
            }
            print!("{}", render::modes(&monitors));
        }
        Command::SetMode { monitor, mode } => {
            let applied = selector.set_mode(&monitor, &mode)?;
            print!("{}", render::applied(&applied));
        }
        Command::Switch(target) => {
            let applied = selector.switch_to(&target)?;
            print!("{}", render::applied(&applied));
        }
    }
    Ok(ExitCode::SUCCESS)
}

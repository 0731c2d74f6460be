// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use log::{error, info, warn};
use runtime::WriterRuntime;
use std::env;
use std::path::PathBuf;
use worktravel_app::{AppState, Snapshot};
use worktravel_db::{RecordKey, SnapshotWriter, Store};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    match options.action {
        Action::Help => {
            print_help();
            return Ok(());
        }
        Action::PrintConfigPath => {
            println!("{}", options.config_path.display());
            return Ok(());
        }
        Action::PrintExampleConfig => {
            print!("{}", Config::example_config(&options.config_path));
            return Ok(());
        }
        Action::PrintDbPath | Action::Check | Action::Run => {}
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; `worktravel --print-example-config` prints a working template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.action == Action::PrintDbPath {
        println!("{}", db_path.display());
        return Ok(());
    }

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {}; set [storage].db_path or WORKTRAVEL_DB_PATH to use another file",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    if options.demo {
        store.seed_demo_data()?;
    }
    let flush_timeout = config.flush_timeout()?;
    let log_dir = config.log_dir()?;
    if options.action == Action::Check {
        return Ok(());
    }

    let _logger = logging::init(config.log_level(), &log_dir)?;
    info!("event=store_open path={}", db_path.display());

    let mut state = AppState::default();
    let pruned = state.hydrate(load_snapshot(&store));
    if pruned > 0 {
        info!("event=orphans_pruned count={pruned}");
    }
    info!(
        "event=state_loaded mode={} items={} completed={}",
        state.mode.as_str(),
        state.todos.len(),
        state.completed.len()
    );

    let writer = SnapshotWriter::spawn(store)?;
    let mut runtime = WriterRuntime::new(writer, config.haptics());
    let outcome = worktravel_tui::run_app(&mut state, &mut runtime);

    let flushed = runtime.into_writer().shutdown(flush_timeout);
    if let Err(error) = &flushed {
        error!("event=flush_failed error={error:#}");
    }
    info!("event=app_exit");
    outcome?;
    flushed
        .map(drop)
        .map_err(|error| anyhow!("{error:#}; recent changes may be lost"))
}

/// Each record loads on its own; a broken record falls back to its default
/// without taking the others down with it, and is marked so it is not
/// written back until the user changes that part of the state.
fn load_snapshot(store: &Store) -> Snapshot {
    let mut snapshot = Snapshot::default();
    match store.load_mode() {
        Ok(mode) => snapshot.mode = mode,
        Err(error) => {
            log_load_failure(RecordKey::Mode, &error);
            snapshot.parts.mode = false;
        }
    }
    match store.load_todos() {
        Ok(todos) => snapshot.todos = todos,
        Err(error) => {
            log_load_failure(RecordKey::ToDos, &error);
            snapshot.parts.todos = false;
        }
    }
    match store.load_completed() {
        Ok(completed) => snapshot.completed = completed,
        Err(error) => {
            log_load_failure(RecordKey::Completed, &error);
            snapshot.parts.completed = false;
        }
    }
    snapshot
}

fn log_load_failure(key: RecordKey, error: &anyhow::Error) {
    warn!(
        "event=load_failed record={} error={error:#} action=kept_on_disk",
        key.as_str()
    );
}

/// What the invocation asks for. When several flags are given the
/// highest-ranked one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
enum Action {
    #[default]
    Run,
    Check,
    PrintDbPath,
    PrintExampleConfig,
    PrintConfigPath,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    demo: bool,
    action: Action,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        demo: false,
        action: Action::Run,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let requested = match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
                continue;
            }
            "--demo" => {
                options.demo = true;
                continue;
            }
            "--check" => Action::Check,
            "--print-path" => Action::PrintDbPath,
            "--print-example-config" => Action::PrintExampleConfig,
            "--print-config-path" => Action::PrintConfigPath,
            "--help" | "-h" => Action::Help,
            unknown => bail!("unknown argument {unknown:?}; run with --help to see supported options"),
        };
        options.action = options.action.max(requested);
    }

    Ok(options)
}

fn print_help() {
    println!("worktravel: Work and Travel to-do lists");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with seeded demo data (in-memory)");
    println!("  --check                  Validate config and database, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{Action, CliOptions, load_snapshot, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;
    use worktravel_app::{AppCommand, AppState, ListMode, SnapshotParts};
    use worktravel_db::{RecordKey, Store};
    use worktravel_testkit::fixture_id;

    fn fallback_config() -> PathBuf {
        PathBuf::from("/tmp/worktravel-config.toml")
    }

    #[test]
    fn no_arguments_runs_with_default_config() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), fallback_config())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: fallback_config(),
                demo: false,
                action: Action::Run,
            }
        );
        Ok(())
    }

    #[test]
    fn config_flag_replaces_path() -> Result<()> {
        let options = parse_cli_args(["--config", "/etc/wt.toml", "--demo"], fallback_config())?;
        assert_eq!(options.config_path, PathBuf::from("/etc/wt.toml"));
        assert!(options.demo);
        assert_eq!(options.action, Action::Run);
        Ok(())
    }

    #[test]
    fn bad_arguments_are_rejected() {
        let missing = parse_cli_args(["--config"], fallback_config())
            .expect_err("--config without a value should fail");
        assert!(missing.to_string().contains("--config requires a file path"));

        let unknown = parse_cli_args(["--verbose"], fallback_config())
            .expect_err("unknown flag should fail");
        let message = unknown.to_string();
        assert!(message.contains("unknown argument \"--verbose\""));
        assert!(message.contains("--help"));
    }

    #[test]
    fn strongest_action_wins_regardless_of_order() -> Result<()> {
        let cases: [(&[&str], Action); 5] = [
            (&["--check"], Action::Check),
            (&["--check", "--print-path"], Action::PrintDbPath),
            (&["--print-config-path", "--print-example-config"], Action::PrintConfigPath),
            (&["-h", "--check"], Action::Help),
            (&["--demo", "--print-path"], Action::PrintDbPath),
        ];
        for (args, expected) in cases {
            let options = parse_cli_args(args.iter().copied(), fallback_config())?;
            assert_eq!(options.action, expected, "args {args:?}");
        }
        Ok(())
    }

    #[test]
    fn load_snapshot_isolates_a_broken_record() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        store.put_record(RecordKey::Mode, "travel")?;
        store.put_record(RecordKey::ToDos, "[1, 2")?;
        store.put_record(
            RecordKey::Completed,
            &format!(r#"{{"{}":true}}"#, fixture_id(4)),
        )?;

        let snapshot = load_snapshot(&store);
        assert_eq!(snapshot.mode, ListMode::Travel);
        assert!(snapshot.todos.is_empty());
        assert_eq!(snapshot.completed.len(), 1);
        assert!(!snapshot.parts.todos);
        assert!(snapshot.parts.mode && snapshot.parts.completed);

        let mut state = AppState::default();
        assert_eq!(state.hydrate(snapshot), 0);
        state.dispatch(AppCommand::SetMode(ListMode::Work));
        assert!(store.save_snapshot(1, &state.snapshot())?);
        assert_eq!(store.get_record(RecordKey::ToDos)?.as_deref(), Some("[1, 2"));
        Ok(())
    }

    #[test]
    fn load_snapshot_reads_demo_data() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        store.seed_demo_data()?;

        let snapshot = load_snapshot(&store);
        assert_eq!(snapshot.parts, SnapshotParts::ALL);
        let mut state = AppState::default();
        assert_eq!(state.hydrate(snapshot), 0);
        assert!(!state.todos.is_empty());
        assert_eq!(state.mode, ListMode::Work);
        Ok(())
    }
}

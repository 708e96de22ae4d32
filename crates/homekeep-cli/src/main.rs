// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use homekeep_app::{HouseId, TaskKey};
use homekeep_db::validation::{parse_month, parse_year};
use homekeep_db::{Store, month_and_year};
use runtime::DbRuntime;
use std::env;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `homekeep --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    init_logging(config.log_level());

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or HOMEKEEP_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    if options.demo {
        store.seed_demo_data()?;
    }

    let catalog = config.load_catalog().with_context(|| {
        format!(
            "load maintenance catalog; check [catalog] and [schedule] in {}",
            options.config_path.display()
        )
    })?;
    debug!(tasks = catalog.task_count(), "catalog loaded");
    if options.check_only {
        return Ok(());
    }

    if options.list_regions {
        for zone in catalog.zones() {
            println!("{zone}");
        }
        return Ok(());
    }

    let today = OffsetDateTime::now_utc().date();
    let (current_month, current_year) = month_and_year(today);
    let month = options.month.unwrap_or(current_month);
    let year = options.year.unwrap_or(current_year);

    let runtime = DbRuntime::new(&store, &catalog, config.default_region());
    let house_id = runtime.resolve_house(options.house)?;

    if let Some(key) = &options.complete {
        runtime.set_completed(house_id, key, month, year, true)?;
    }
    if let Some(key) = &options.reopen {
        runtime.set_completed(house_id, key, month, year, false)?;
    }
    if let Some(key) = &options.reset_override
        && !runtime.reset_override(house_id, key)?
    {
        eprintln!("no override stored for {key}; nothing to reset");
    }

    let digest = runtime.plan(house_id, month, year)?;
    for key in [&options.complete, &options.reopen].into_iter().flatten() {
        if !runtime::digest_has_task(&digest, key) {
            eprintln!("warning: no task keyed {key} is planned for {month}/{year}; see the plan's key lines");
        }
    }
    if options.json {
        println!("{}", runtime::render_json(&digest)?);
        return Ok(());
    }

    print!("{}", runtime::render_digest(&digest));
    let warranties = runtime.expiring_warranties(house_id, today)?;
    if !warranties.is_empty() {
        println!();
        print!("{}", runtime::render_warranties(&warranties));
    }
    Ok(())
}

/// `HOMEKEEP_LOG`, then `RUST_LOG`, then the config level. Events go to
/// stderr so plans on stdout stay pipeable.
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env("HOMEKEEP_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    list_regions: bool,
    json: bool,
    house: Option<HouseId>,
    month: Option<u8>,
    year: Option<i32>,
    complete: Option<TaskKey>,
    reopen: Option<TaskKey>,
    reset_override: Option<TaskKey>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        list_regions: false,
        json: false,
        house: None,
        month: None,
        year: None,
        complete: None,
        reopen: None,
        reset_override: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = flag_value(&mut iter, "--config", "a file path")?;
                options.config_path = PathBuf::from(value);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--list-regions" => {
                options.list_regions = true;
            }
            "--json" => {
                options.json = true;
            }
            "--house" => {
                let raw = flag_value(&mut iter, "--house", "a house id")?;
                let id = raw
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|id| *id > 0)
                    .ok_or_else(|| anyhow!("--house expects a positive id, got {raw:?}"))?;
                options.house = Some(HouseId::new(id));
            }
            "--month" => {
                let raw = flag_value(&mut iter, "--month", "a month (1-12 or a name)")?;
                let month = parse_month(&raw)
                    .map_err(|_| anyhow!("--month expects 1-12 or a month name, got {raw:?}"))?;
                options.month = Some(month);
            }
            "--year" => {
                let raw = flag_value(&mut iter, "--year", "a four digit year")?;
                let year = parse_year(&raw)
                    .map_err(|_| anyhow!("--year expects a four digit year, got {raw:?}"))?;
                options.year = Some(year);
            }
            "--complete" => {
                let value = flag_value(&mut iter, "--complete", "a task key")?;
                options.complete = Some(TaskKey::new(value));
            }
            "--reopen" => {
                let value = flag_value(&mut iter, "--reopen", "a task key")?;
                options.reopen = Some(TaskKey::new(value));
            }
            "--reset-override" => {
                let value = flag_value(&mut iter, "--reset-override", "a task key")?;
                options.reset_override = Some(TaskKey::new(value));
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn flag_value<I, S>(iter: &mut I, flag: &str, what: &str) -> Result<String>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    iter.next()
        .map(|value| value.as_ref().to_owned())
        .ok_or_else(|| anyhow!("{flag} requires {what}"))
}

fn print_help() {
    println!("homekeep: monthly home maintenance plans");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Run against seeded demo data (in-memory)");
    println!("  --check                  Validate config, database and catalog, then exit");
    println!("  --list-regions           Print the catalog's regions");
    println!("  --house <id>             Plan for this house (default: first house)");
    println!("  --month <1-12|name>      Plan for this month (default: current)");
    println!("  --year <yyyy>            Plan for this year (default: current)");
    println!("  --complete <key>         Mark a task done for the planned month");
    println!("  --reopen <key>           Clear a task's done mark for the planned month");
    println!("  --reset-override <key>   Drop a task override, restoring catalog defaults");
    println!("  --json                   Print the plan as JSON");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use homekeep_app::{HouseId, TaskKey};
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/homekeep-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_db_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                list_regions: false,
                json: false,
                house: None,
                month: None,
                year: None,
                complete: None,
                reopen: None,
                reset_override: None,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_reads_plan_selection() -> Result<()> {
        let options = parse_cli_args(
            vec!["--house", "2", "--month", "sep", "--year", "2027", "--json"],
            default_options_path(),
        )?;
        assert_eq!(options.house, Some(HouseId::new(2)));
        assert_eq!(options.month, Some(9));
        assert_eq!(options.year, Some(2027));
        assert!(options.json);
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_bad_plan_values() {
        for args in [
            vec!["--house", "0"],
            vec!["--house", "abc"],
            vec!["--month", "13"],
            vec!["--year", "26"],
            vec!["--month"],
        ] {
            assert!(
                parse_cli_args(args.clone(), default_options_path()).is_err(),
                "args {args:?}"
            );
        }
    }

    #[test]
    fn parse_cli_args_reads_task_actions() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--complete",
                "clean-gutters",
                "--reopen",
                "replace-hvac-filter",
                "--reset-override",
                "inspect-roof",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.complete, Some(TaskKey::new("clean-gutters")));
        assert_eq!(options.reopen, Some(TaskKey::new("replace-hvac-filter")));
        assert_eq!(options.reset_override, Some(TaskKey::new("inspect-roof")));
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--print-config-path",
                "--print-example-config",
                "--check",
                "--list-regions",
            ],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(!options.print_db_path);
        assert!(!options.demo);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.list_regions);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_demo_and_db_path_print_flags() -> Result<()> {
        let options = parse_cli_args(vec!["--demo", "--print-path"], default_options_path())?;
        assert!(!options.print_config_path);
        assert!(options.print_db_path);
        assert!(options.demo);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}

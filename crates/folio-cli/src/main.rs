// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use folio_db::Database;
use runtime::{Shell, TerminalDialog};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "\
usage: folio [--config <path>] [--demo] [ACTION]

Edits a bookstore chain catalog. Without an action, opens the shell.

actions:
  --check                  open the database and print row counts per table
  --print-path             print the database path the config resolves to
  --print-config-path      print the config file path
  --print-example-config   print a commented config template
  -h, --help               print this text

options:
  --config <path>          read this config file instead of the default
  --demo                   use a throwaway in-memory database with demo data
";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let invocation = Invocation::parse(env::args().skip(1), Config::default_path()?)?;
    match invocation.action {
        Action::Help => {
            print!("{USAGE}");
            return Ok(());
        }
        Action::ShowConfigPath => {
            println!("{}", invocation.config.display());
            return Ok(());
        }
        Action::ExampleConfig => {
            print!("{}", Config::example_config(&invocation.config));
            return Ok(());
        }
        Action::Shell | Action::Check | Action::ShowDbPath => {}
    }

    let config = Config::load(&invocation.config).with_context(|| {
        format!(
            "load config {}; run `folio --print-example-config` to generate a template",
            invocation.config.display()
        )
    })?;
    init_tracing(config.log_level())?;

    let db_path = invocation.db_path(&config)?;
    if invocation.action == Action::ShowDbPath {
        println!("{}", db_path.display());
        return Ok(());
    }

    let mut db = open_database(&db_path, invocation.demo)?;
    if invocation.action == Action::Check {
        for (table, rows) in db.table_counts()? {
            println!("{table:<20} {rows:>8}");
        }
        return Ok(());
    }

    let mut stdout = io::stdout();
    let mut shell = Shell::new(&mut db, TerminalDialog);
    println!("folio: type `help` for commands");
    shell.open(config.default_screen(), config.default_store(), &mut stdout)?;
    shell.run(runtime::stdin_line, &mut stdout)
}

fn open_database(path: &Path, demo: bool) -> Result<Database> {
    let mut db = Database::open(path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or FOLIO_DB_PATH",
            path.display()
        )
    })?;
    db.bootstrap()?;
    if demo {
        db.seed_demo_data()?;
    }
    info!(path = %path.display(), demo, "database ready");
    Ok(db)
}

fn init_tracing(configured: &str) -> Result<()> {
    let filter = match env::var("FOLIO_LOG") {
        Ok(value) if !value.trim().is_empty() => EnvFilter::try_new(&value)
            .with_context(|| format!("FOLIO_LOG={value:?} is not a valid filter"))?,
        _ => EnvFilter::try_new(configured)?,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}

/// What one run of the binary does. At most one may be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Shell,
    Check,
    ShowDbPath,
    ShowConfigPath,
    ExampleConfig,
    Help,
}

impl Action {
    fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "--check" => Some(Self::Check),
            "--print-path" => Some(Self::ShowDbPath),
            "--print-config-path" => Some(Self::ShowConfigPath),
            "--print-example-config" => Some(Self::ExampleConfig),
            "--help" | "-h" => Some(Self::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    action: Action,
    config: PathBuf,
    demo: bool,
}

impl Invocation {
    fn parse<I, S>(args: I, default_config: PathBuf) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut invocation = Self {
            action: Action::Shell,
            config: default_config,
            demo: false,
        };
        let mut chosen: Option<String> = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            if let Some(path) = arg.strip_prefix("--config=") {
                invocation.config = config_path(path)?;
                continue;
            }
            match arg {
                "--config" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow!("--config needs a path, e.g. --config ~/folio.toml"))?;
                    invocation.config = config_path(path.as_ref())?;
                }
                "--demo" => invocation.demo = true,
                flag => {
                    let action = Action::from_flag(flag).ok_or_else(|| {
                        anyhow!("unrecognized argument {flag:?} -- see `folio --help`")
                    })?;
                    if action == Action::Help {
                        invocation.action = Action::Help;
                        return Ok(invocation);
                    }
                    if let Some(previous) = chosen.as_deref()
                        && previous != flag
                    {
                        bail!("{previous} and {flag} cannot be combined -- pick one");
                    }
                    chosen = Some(flag.to_owned());
                    invocation.action = action;
                }
            }
        }
        Ok(invocation)
    }

    fn db_path(&self, config: &Config) -> Result<PathBuf> {
        if self.demo {
            return Ok(PathBuf::from(":memory:"));
        }
        config.db_path()
    }
}

fn config_path(raw: &str) -> Result<PathBuf> {
    if raw.trim().is_empty() {
        bail!("--config needs a non-empty path");
    }
    Ok(PathBuf::from(raw))
}

//! Liaison CLI - Command-line interface for the actor relationship engine.

use clap::Parser;
use liaison_cli::commands;
use liaison_cli::{Cli, Command, Config, Formatter};
use liaison_engine::RelationshipEngine;
use liaison_store::SqliteStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so stdout stays machine-readable
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> liaison_cli::Result<()> {
    // Load or create config
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_init()?,
    };

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    // Open the database
    let db_path: PathBuf = match cli.db {
        Some(path) => path.into(),
        None => config.database_path()?,
    };
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!("Opening database at {}", db_path.display());
    let store = SqliteStore::new(&db_path)?;
    let mut engine = RelationshipEngine::with_config(store, config.engine)?;

    match cli.command {
        Command::Actor(args) => commands::execute_actor(args, &mut engine, &formatter)?,
        Command::Link(args) => commands::execute_link(args, &mut engine, &formatter)?,
        Command::Reclassify(args) => commands::execute_reclassify(args, &mut engine, &formatter)?,
        Command::End(args) => commands::execute_end(args, &mut engine, &formatter)?,
        Command::Remove(args) => commands::execute_remove(args, &mut engine, &formatter)?,
        Command::Show(args) => commands::execute_show(args, &engine, &formatter)?,
        Command::List(args) => commands::execute_list(args, &engine, &formatter)?,
        Command::Assign(args) => commands::execute_assign(args, &mut engine, &formatter)?,
        Command::Unassign(args) => commands::execute_unassign(args, &mut engine, &formatter)?,
        Command::Assignment(args) => commands::execute_assignment(args, &mut engine, &formatter)?,
        Command::Assignments(args) => commands::execute_assignments(args, &engine, &formatter)?,
    }

    Ok(())
}

//! Actor command implementation.
//!
//! Actors are owned outside the engine; the CLI registers them directly in
//! the store so relationships have parties to link.

use super::parse_id;
use crate::cli::{ActorAction, ActorArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use liaison_domain::traits::RelationshipRepository;
use liaison_domain::{Actor, ActorId, ActorKind, Gender};
use liaison_engine::{Clock, EngineError, RelationshipEngine, SystemClock};
use liaison_store::SqliteStore;

/// Execute an actor subcommand.
pub fn execute_actor(
    args: ActorArgs,
    engine: &mut RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ActorAction::Add { name, kind, gender } => {
            let actor = build_actor(&name, kind.into(), gender.as_deref())?;
            engine.store_mut().upsert_actor(&actor)?;
            println!("{}", formatter.created("Actor", &actor.id.to_string()));
        }
        ActorAction::Show { id } => {
            let id: ActorId = parse_id(&id, "actor")?;
            let actor = engine
                .store()
                .get_actor(id)?
                .ok_or_else(|| EngineError::NotFound(format!("actor {}", id)))?;
            println!("{}", formatter.format_actors(&[actor])?);
        }
        ActorAction::List => {
            let actors = engine.store().list_actors()?;
            println!("{}", formatter.format_actors(&actors)?);
        }
        ActorAction::Remove { id } => {
            let id: ActorId = parse_id(&id, "actor")?;
            engine.store_mut().soft_delete_actor(id, SystemClock.now())?;
            println!("{}", formatter.success(&format!("Actor removed: {}", id)));
            println!(
                "{}",
                formatter.warning("Existing relationships are kept and show the actor as deleted")
            );
        }
    }

    Ok(())
}

/// Build an actor from command arguments.
fn build_actor(name: &str, kind: ActorKind, gender: Option<&str>) -> Result<Actor> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidInput("Actor name cannot be empty".to_string()));
    }

    Ok(match kind {
        ActorKind::Person => Actor::person(name, gender.map(Gender::parse).unwrap_or_default()),
        ActorKind::Organization => {
            if gender.is_some() {
                return Err(CliError::InvalidInput(
                    "Organizations do not take a gender".to_string(),
                ));
            }
            Actor::organization(name)
        }
    })
}

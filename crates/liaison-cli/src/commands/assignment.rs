//! Share assignment command implementations.

use super::parse_id;
use crate::cli::{AssignArgs, AssignmentAction, AssignmentArgs, AssignmentsArgs, EndArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use liaison_domain::{ActorId, AssignmentId, ShareId};
use liaison_engine::{NewAssignment, RelationshipEngine};
use liaison_store::SqliteStore;

/// Execute the assign command.
pub fn execute_assign(
    args: AssignArgs,
    engine: &mut RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let actor: ActorId = parse_id(&args.actor, "actor")?;
    let share: ShareId = parse_id(&args.share, "share")?;

    let mut request = NewAssignment::new(actor, share, args.assignment_type.into());
    if let Some(percentage) = args.percentage {
        request = request.with_percentage(percentage);
    }
    if let Some(notes) = args.notes {
        request = request.with_notes(notes);
    }
    if args.exclusive {
        request = request.exclusive();
    }

    let outcome = engine.assign_share(request)?;
    println!("{}", formatter.created("Assignment", &outcome.id.to_string()));
    for closed in &outcome.superseded {
        println!("{}", formatter.info(&format!("Ended superseded assignment {}", closed)));
    }
    Ok(())
}

/// Execute the unassign command.
pub fn execute_unassign(
    args: EndArgs,
    engine: &mut RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let id: AssignmentId = parse_id(&args.id, "assignment")?;
    engine.end_assignment(id, args.at)?;
    println!("{}", formatter.success(&format!("Assignment ended: {}", id)));
    Ok(())
}

/// Execute a single-assignment subcommand.
pub fn execute_assignment(
    args: AssignmentArgs,
    engine: &mut RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        AssignmentAction::Show { id } => {
            let id: AssignmentId = parse_id(&id, "assignment")?;
            let assignment = engine.get_assignment(id)?;
            println!("{}", formatter.format_assignments(&[assignment])?);
        }
        AssignmentAction::Remove { id } => {
            let id: AssignmentId = parse_id(&id, "assignment")?;
            engine.soft_delete_assignment(id)?;
            println!("{}", formatter.success(&format!("Assignment removed: {}", id)));
        }
    }
    Ok(())
}

/// Execute the assignments command.
pub fn execute_assignments(
    args: AssignmentsArgs,
    engine: &RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let only_current = !args.all;
    let assignments = match (args.actor, args.share) {
        (Some(actor), None) => {
            engine.list_assignments_for_actor(parse_id(&actor, "actor")?, only_current)?
        }
        (None, Some(share)) => {
            engine.list_assignments_for_share(parse_id(&share, "share")?, only_current)?
        }
        _ => {
            return Err(CliError::InvalidInput(
                "Specify exactly one of --actor or --share".to_string(),
            ))
        }
    };

    println!("{}", formatter.format_assignments(&assignments)?);
    Ok(())
}

//! Relationship command implementations.

use super::parse_id;
use crate::cli::{EndArgs, IdArgs, LinkArgs, ListArgs, ReclassifyArgs};
use crate::error::Result;
use crate::output::Formatter;
use liaison_domain::{ActorId, RelationshipId};
use liaison_engine::{parse_category, NewRelationship, RelationshipEngine, RelationshipFilter};
use liaison_store::SqliteStore;

/// Execute the link command.
pub fn execute_link(
    args: LinkArgs,
    engine: &mut RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let request = build_request(args)?;
    let outcome = engine.create_relationship(request)?;
    println!("{}", formatter.link_created(&outcome)?);
    Ok(())
}

/// Turn link arguments into an engine request.
fn build_request(args: LinkArgs) -> Result<NewRelationship> {
    let origin: ActorId = parse_id(&args.origin, "origin actor")?;
    let destination: ActorId = parse_id(&args.destination, "destination actor")?;
    let relationship_type = parse_category(&args.relationship_type)?;

    let mut request = NewRelationship::new(origin, destination, relationship_type);
    if let Some(sub_type) = args.sub_type {
        request = request.with_sub_type(sub_type);
    }
    if let Some(notes) = args.notes {
        request = request.with_notes(notes);
    }
    if args.one_way {
        request = request.one_way();
    }
    Ok(request)
}

/// Execute the reclassify command.
pub fn execute_reclassify(
    args: ReclassifyArgs,
    engine: &mut RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let id: RelationshipId = parse_id(&args.id, "relationship")?;
    let superseded = engine.reclassify_relationship(id, &args.sub_type)?;

    println!(
        "{}",
        formatter.success(&format!("Relationship {} reclassified as {}", id, args.sub_type))
    );
    for closed in superseded {
        println!(
            "{}",
            formatter.info(&format!("Ended superseded relationship {}", closed))
        );
    }
    Ok(())
}

/// Execute the end command.
pub fn execute_end(
    args: EndArgs,
    engine: &mut RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let id: RelationshipId = parse_id(&args.id, "relationship")?;
    engine.end_relationship(id, args.at)?;
    println!("{}", formatter.success(&format!("Relationship ended: {}", id)));
    Ok(())
}

/// Execute the remove command.
pub fn execute_remove(
    args: IdArgs,
    engine: &mut RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let id: RelationshipId = parse_id(&args.id, "relationship")?;
    engine.soft_delete_relationship(id)?;
    println!("{}", formatter.success(&format!("Relationship removed: {}", id)));
    Ok(())
}

/// Execute the show command.
pub fn execute_show(
    args: IdArgs,
    engine: &RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let id: RelationshipId = parse_id(&args.id, "relationship")?;
    let relationship = engine.get_relationship(id)?;
    println!("{}", formatter.format_relationship(&relationship)?);
    Ok(())
}

/// Execute the list command.
pub fn execute_list(
    args: ListArgs,
    engine: &RelationshipEngine<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let actor: ActorId = parse_id(&args.actor, "actor")?;
    let filter = RelationshipFilter {
        only_current: !args.all,
        relationship_type: args
            .relationship_type
            .as_deref()
            .map(parse_category)
            .transpose()?,
    };

    let views = engine.list_relationships_for_actor_filtered(actor, filter)?;
    println!("{}", formatter.format_relationships(&views)?);
    Ok(())
}

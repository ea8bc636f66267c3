//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use liaison_domain::{Actor, ActorSummary, Assignment, Relationship};
use liaison_engine::{EnrichedRelationship, LinkOutcome};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format actors.
    pub fn format_actors(&self, actors: &[Actor]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = actors.iter().map(actor_json).collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => Ok(self.format_actors_table(actors)),
            OutputFormat::Quiet => Ok(join_ids(actors.iter().map(|a| a.id.to_string()))),
        }
    }

    fn format_actors_table(&self, actors: &[Actor]) -> String {
        if actors.is_empty() {
            return self.colorize("No actors found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Name", "Kind", "Gender", "Deleted"]);
        for actor in actors {
            builder.push_record([
                actor.id.to_string(),
                actor.display_name.clone(),
                actor.kind.to_string(),
                actor.gender.to_string(),
                opt_ts(actor.deleted_at),
            ]);
        }
        render(builder)
    }

    /// Format an actor's relationships as seen by that actor.
    pub fn format_relationships(&self, views: &[EnrichedRelationship]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = views.iter().map(enriched_json).collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => Ok(self.format_relationships_table(views)),
            OutputFormat::Quiet => Ok(join_ids(
                views.iter().map(|v| v.relationship.id.to_string()),
            )),
        }
    }

    fn format_relationships_table(&self, views: &[EnrichedRelationship]) -> String {
        if views.is_empty() {
            return self.colorize("No relationships found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Type", "Sub-type", "Their role", "With", "Your role", "Since", "Until"]);
        for view in views {
            let rel = &view.relationship;
            let counterpart = view
                .counterpart()
                .map(summary_label)
                .unwrap_or_else(|| view.counterpart_id().to_string());
            builder.push_record([
                short_id(&rel.id.to_string()),
                rel.relationship_type.to_string(),
                rel.sub_type.clone().unwrap_or_default(),
                view.counterpart_role().to_string(),
                counterpart,
                view.viewer_role().to_string(),
                rel.start_date.to_string(),
                opt_ts(rel.end_date),
            ]);
        }
        render(builder)
    }

    /// Format a single relationship record (audit view).
    pub fn format_relationship(&self, rel: &Relationship) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&relationship_json(rel))?),
            OutputFormat::Quiet => Ok(rel.id.to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                let rows = [
                    ("ID", rel.id.to_string()),
                    ("Origin", rel.origin_actor_id.to_string()),
                    ("Destination", rel.destination_actor_id.to_string()),
                    ("Type", rel.relationship_type.to_string()),
                    ("Sub-type", rel.sub_type.clone().unwrap_or_default()),
                    ("Origin role", rel.origin_role.to_string()),
                    ("Destination role", rel.destination_role.to_string()),
                    ("Bidirectional", rel.is_bidirectional.to_string()),
                    ("Exclusive", rel.exclusive.to_string()),
                    ("State", rel.state().to_string()),
                    ("Start", rel.start_date.to_string()),
                    ("End", opt_ts(rel.end_date)),
                    ("Deleted", opt_ts(rel.deleted_at)),
                    ("Notes", rel.notes.clone().unwrap_or_default()),
                ];
                for (field, value) in rows {
                    builder.push_record([field.to_string(), value]);
                }
                for (key, value) in &rel.attributes {
                    builder.push_record([format!("attr.{}", key), value.clone()]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format share assignments.
    pub fn format_assignments(&self, assignments: &[Assignment]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = assignments.iter().map(assignment_json).collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => Ok(self.format_assignments_table(assignments)),
            OutputFormat::Quiet => Ok(join_ids(assignments.iter().map(|a| a.id.to_string()))),
        }
    }

    fn format_assignments_table(&self, assignments: &[Assignment]) -> String {
        if assignments.is_empty() {
            return self.colorize("No assignments found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Actor", "Share", "Type", "%", "State", "Since", "Until"]);
        for a in assignments {
            builder.push_record([
                short_id(&a.id.to_string()),
                short_id(&a.actor_id.to_string()),
                short_id(&a.share_id.to_string()),
                a.assignment_type.to_string(),
                a.percentage.map(|p| format!("{:.2}", p)).unwrap_or_default(),
                a.state().to_string(),
                a.start_date.to_string(),
                opt_ts(a.end_date),
            ]);
        }
        render(builder)
    }

    /// Report a new relationship and anything it superseded.
    pub fn link_created(&self, outcome: &LinkOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "id": outcome.id.to_string(),
                "superseded": outcome.superseded.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
            }))?),
            OutputFormat::Quiet => Ok(outcome.id.to_string()),
            OutputFormat::Table => {
                let mut lines = vec![self.success(&format!("Relationship created: {}", outcome.id))];
                for id in &outcome.superseded {
                    lines.push(self.info(&format!("Ended superseded relationship {}", id)));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Report a newly created record by id.
    pub fn created(&self, what: &str, id: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({ "id": id }).to_string(),
            OutputFormat::Quiet => id.to_string(),
            OutputFormat::Table => self.success(&format!("{} created: {}", what, id)),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn join_ids(ids: impl Iterator<Item = String>) -> String {
    ids.collect::<Vec<_>>().join("\n")
}

/// Truncate an ID for readability
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn opt_ts(ts: Option<u64>) -> String {
    ts.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
}

fn summary_label(summary: &ActorSummary) -> String {
    if summary.is_deleted {
        format!("{} (deleted)", summary.display_name)
    } else {
        summary.display_name.clone()
    }
}

fn actor_json(actor: &Actor) -> serde_json::Value {
    serde_json::json!({
        "id": actor.id.to_string(),
        "kind": actor.kind.as_str(),
        "display_name": actor.display_name,
        "gender": actor.gender.as_str(),
        "deleted_at": actor.deleted_at,
    })
}

fn summary_json(summary: Option<&ActorSummary>) -> serde_json::Value {
    match summary {
        Some(s) => serde_json::json!({
            "id": s.id.to_string(),
            "kind": s.kind.as_str(),
            "display_name": s.display_name,
            "gender": s.gender.as_str(),
            "is_deleted": s.is_deleted,
        }),
        None => serde_json::Value::Null,
    }
}

fn relationship_json(rel: &Relationship) -> serde_json::Value {
    serde_json::json!({
        "id": rel.id.to_string(),
        "origin_actor_id": rel.origin_actor_id.to_string(),
        "destination_actor_id": rel.destination_actor_id.to_string(),
        "relationship_type": rel.relationship_type.as_str(),
        "sub_type": rel.sub_type,
        "origin_role": rel.origin_role.as_str(),
        "destination_role": rel.destination_role.as_str(),
        "is_bidirectional": rel.is_bidirectional,
        "exclusive": rel.exclusive,
        "attributes": rel.attributes,
        "notes": rel.notes,
        "start_date": rel.start_date,
        "end_date": rel.end_date,
        "deleted_at": rel.deleted_at,
        "created_at": rel.created_at,
        "updated_at": rel.updated_at,
        "state": rel.state().as_str(),
        "is_current": rel.is_current(),
    })
}

fn enriched_json(view: &EnrichedRelationship) -> serde_json::Value {
    serde_json::json!({
        "relationship": relationship_json(&view.relationship),
        "origin": summary_json(view.origin.as_ref()),
        "destination": summary_json(view.destination.as_ref()),
        "viewer": view.viewer.to_string(),
        "viewer_side": view.viewer_side.as_str(),
        "viewer_role": view.viewer_role().as_str(),
        "counterpart_role": view.counterpart_role().as_str(),
        "is_current": view.is_current,
    })
}

fn assignment_json(a: &Assignment) -> serde_json::Value {
    serde_json::json!({
        "id": a.id.to_string(),
        "actor_id": a.actor_id.to_string(),
        "share_id": a.share_id.to_string(),
        "assignment_type": a.assignment_type.as_str(),
        "percentage": a.percentage,
        "notes": a.notes,
        "start_date": a.start_date,
        "end_date": a.end_date,
        "deleted_at": a.deleted_at,
        "state": a.state().as_str(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use liaison_domain::roles::{Role, RolePair};
    use liaison_domain::{ActorId, AssignmentType, Gender, RelationshipType, ShareId};

    fn create_test_relationship() -> Relationship {
        let mut rel = Relationship::active(
            ActorId::new(),
            ActorId::new(),
            RelationshipType::Family,
            Some("child".to_string()),
            RolePair {
                origin: Role::Mother,
                destination: Role::Child,
            },
            false,
            Some("adopted".to_string()),
            1_000,
        );
        rel.attributes.insert("requested_sub_type".to_string(), "hija".to_string());
        rel
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_relationship(&create_test_relationship()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["origin_role"], "mother");
        assert_eq!(value["state"], "active");
        assert_eq!(value["attributes"]["requested_sub_type"], "hija");
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let rel = create_test_relationship();
        let output = formatter.format_relationship(&rel).unwrap();
        assert_eq!(output, rel.id.to_string());
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_relationship(&create_test_relationship()).unwrap();
        assert!(output.contains("Origin role"));
        assert!(output.contains("attr.requested_sub_type"));
    }

    #[test]
    fn test_empty_lists() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.format_relationships(&[]).unwrap().contains("No relationships found"));
        assert!(formatter.format_assignments(&[]).unwrap().contains("No assignments found"));
        assert!(formatter.format_actors(&[]).unwrap().contains("No actors found"));
    }

    #[test]
    fn test_assignment_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let actor = ActorId::new();
        let a = Assignment::active(actor, ShareId::new(), AssignmentType::Beneficiary, Some(12.5), None, 5);
        let output = formatter.format_assignments(&[a]).unwrap();
        assert!(output.contains("beneficiary"));
        assert!(output.contains("12.50"));
    }

    #[test]
    fn test_actor_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let actor = Actor::person("Marta", Gender::Female);
        let output = formatter.format_actors(&[actor]).unwrap();
        assert!(output.contains("\"gender\": \"female\""));
    }

    #[test]
    fn test_link_created_lists_superseded() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let outcome = LinkOutcome {
            id: liaison_domain::RelationshipId::new(),
            superseded: vec![liaison_domain::RelationshipId::new()],
        };
        let output = formatter.link_created(&outcome).unwrap();
        assert!(output.starts_with("✓ Relationship created"));
        assert!(output.contains("Ended superseded relationship"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}

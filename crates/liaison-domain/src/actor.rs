//! Actor module - the parties that relationships connect
//!
//! Actors are owned by collaborator subsystems (member registry, company
//! registry). The engine only reads the attributes it needs for role
//! derivation and existence checks.

use crate::{ActorId, Timestamp};

/// Kind of party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    /// A natural person
    Person,

    /// A company or other legal entity
    Organization,
}

impl ActorKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Person => "person",
            ActorKind::Organization => "organization",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "person" | "persona" => Some(ActorKind::Person),
            "organization" | "organisation" | "company" | "empresa" => {
                Some(ActorKind::Organization)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category attribute used to derive gendered role labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gender {
    /// Masculine role labels (father, son, ...)
    Male,

    /// Feminine role labels (mother, daughter, ...)
    Female,

    /// Neutral role labels (parent, child, ...)
    #[default]
    Unspecified,
}

impl Gender {
    /// Get the gender name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unspecified => "unspecified",
        }
    }

    /// Parse a gender from a string; anything unrecognized is `Unspecified`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "masculino" => Gender::Male,
            "female" | "f" | "femenino" => Gender::Female,
            _ => Gender::Unspecified,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A party that can participate in relationships and share assignments
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// Unique identifier
    pub id: ActorId,

    /// Person or organization
    pub kind: ActorKind,

    /// Human-readable name
    pub display_name: String,

    /// Attribute driving gendered role labels
    pub gender: Gender,

    /// Soft-delete marker; deleted actors cannot join new relationships
    pub deleted_at: Option<Timestamp>,
}

impl Actor {
    /// Create a live person
    pub fn person(display_name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: ActorId::new(),
            kind: ActorKind::Person,
            display_name: display_name.into(),
            gender,
            deleted_at: None,
        }
    }

    /// Create a live organization
    pub fn organization(display_name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            kind: ActorKind::Organization,
            display_name: display_name.into(),
            gender: Gender::Unspecified,
            deleted_at: None,
        }
    }

    /// Whether the actor has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Identity data exposed on enriched relationship views
    pub fn summary(&self) -> ActorSummary {
        ActorSummary {
            id: self.id,
            kind: self.kind,
            display_name: self.display_name.clone(),
            gender: self.gender,
            is_deleted: self.is_deleted(),
        }
    }
}

/// Read-only identity snapshot of an actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSummary {
    /// Actor identifier
    pub id: ActorId,

    /// Person or organization
    pub kind: ActorKind,

    /// Human-readable name
    pub display_name: String,

    /// Role-derivation attribute
    pub gender: Gender,

    /// Whether the actor has been soft-deleted since the link was made
    pub is_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parse_is_total() {
        assert_eq!(Gender::parse("Male"), Gender::Male);
        assert_eq!(Gender::parse(" f "), Gender::Female);
        assert_eq!(Gender::parse("femenino"), Gender::Female);
        assert_eq!(Gender::parse(""), Gender::Unspecified);
        assert_eq!(Gender::parse("nonbinary"), Gender::Unspecified);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ActorKind::parse("Company"), Some(ActorKind::Organization));
        assert_eq!(ActorKind::parse("person"), Some(ActorKind::Person));
        assert_eq!(ActorKind::parse("robot"), None);
    }

    #[test]
    fn test_summary_reflects_soft_delete() {
        let mut actor = Actor::person("Ana", Gender::Female);
        assert!(!actor.summary().is_deleted);

        actor.deleted_at = Some(10);
        assert!(actor.is_deleted());
        assert!(actor.summary().is_deleted);
    }
}

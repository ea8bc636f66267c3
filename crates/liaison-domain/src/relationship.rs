//! Relationship module - direct, one-hop links between two actors
//!
//! A relationship is stored with an ordered (origin, destination) pair but is
//! semantically bidirectional unless `is_bidirectional` is false. The
//! `sub_type` names what the destination is *to* the origin: sub-type
//! `child` means the destination is the origin's child.

use std::collections::BTreeMap;

use crate::lifecycle::LifecycleState;
use crate::roles::{Role, RolePair};
use crate::{ActorId, RelationshipId, Timestamp};

/// Open attribute bag for category-specific metadata
pub type Attributes = BTreeMap<String, String>;

/// Attribute holding a sub-type label that was not in the vocabulary
pub const ATTR_REQUESTED_SUB_TYPE: &str = "requested_sub_type";

/// Attribute holding the sub-type in force before the last reclassification
pub const ATTR_PREVIOUS_SUB_TYPE: &str = "previous_sub_type";

/// Attribute holding the timestamp of the last reclassification
pub const ATTR_RECLASSIFIED_AT: &str = "reclassified_at";

/// Relationship category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    /// Kinship and marriage
    Family,

    /// Employer / employee
    Employment,

    /// One party referred the other
    Referral,

    /// Membership of a person in an organization
    Membership,

    /// Commercial dealings between parties
    Commercial,

    /// Anything else
    Other,
}

impl RelationshipType {
    /// All categories, in declaration order
    pub const ALL: [RelationshipType; 6] = [
        RelationshipType::Family,
        RelationshipType::Employment,
        RelationshipType::Referral,
        RelationshipType::Membership,
        RelationshipType::Commercial,
        RelationshipType::Other,
    ];

    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Family => "family",
            RelationshipType::Employment => "employment",
            RelationshipType::Referral => "referral",
            RelationshipType::Membership => "membership",
            RelationshipType::Commercial => "commercial",
            RelationshipType::Other => "other",
        }
    }

    /// Parse a category; unknown categories are rejected
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "family" | "familiar" => Some(RelationshipType::Family),
            "employment" | "laboral" => Some(RelationshipType::Employment),
            "referral" | "referido" => Some(RelationshipType::Referral),
            "membership" | "membresia" => Some(RelationshipType::Membership),
            "commercial" | "comercial" => Some(RelationshipType::Commercial),
            "other" | "otro" => Some(RelationshipType::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid relationship type: {}", s))
    }
}

/// Fine-grained family relation: what the destination is to the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FamilySubType {
    /// Destination is the origin's spouse
    Spouse,

    /// Destination is the origin's child
    Child,

    /// Destination is the origin's parent
    Parent,

    /// Destination is the origin's sibling
    Sibling,

    /// Destination is the origin's father-in-law
    FatherInLaw,

    /// Destination is the origin's mother-in-law
    MotherInLaw,

    /// Destination is the origin's son-in-law
    SonInLaw,

    /// Destination is the origin's daughter-in-law
    DaughterInLaw,

    /// Any other or unrecognized relation
    Other,
}

impl FamilySubType {
    /// The full vocabulary
    pub const ALL: [FamilySubType; 9] = [
        FamilySubType::Spouse,
        FamilySubType::Child,
        FamilySubType::Parent,
        FamilySubType::Sibling,
        FamilySubType::FatherInLaw,
        FamilySubType::MotherInLaw,
        FamilySubType::SonInLaw,
        FamilySubType::DaughterInLaw,
        FamilySubType::Other,
    ];

    /// Canonical storage label
    pub fn as_str(&self) -> &'static str {
        match self {
            FamilySubType::Spouse => "spouse",
            FamilySubType::Child => "child",
            FamilySubType::Parent => "parent",
            FamilySubType::Sibling => "sibling",
            FamilySubType::FatherInLaw => "father_in_law",
            FamilySubType::MotherInLaw => "mother_in_law",
            FamilySubType::SonInLaw => "son_in_law",
            FamilySubType::DaughterInLaw => "daughter_in_law",
            FamilySubType::Other => "other",
        }
    }

    /// Strict parse: `None` for labels outside the vocabulary
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "spouse" | "husband" | "wife" | "conyuge" => Some(FamilySubType::Spouse),
            "child" | "son" | "daughter" | "hijo" | "hija" => Some(FamilySubType::Child),
            "parent" | "father" | "mother" | "padre" | "madre" => Some(FamilySubType::Parent),
            "sibling" | "brother" | "sister" | "hermano" | "hermana" => {
                Some(FamilySubType::Sibling)
            }
            "father_in_law" | "suegro" => Some(FamilySubType::FatherInLaw),
            "mother_in_law" | "suegra" => Some(FamilySubType::MotherInLaw),
            "son_in_law" | "yerno" => Some(FamilySubType::SonInLaw),
            "daughter_in_law" | "nuera" => Some(FamilySubType::DaughterInLaw),
            "other" | "otro" => Some(FamilySubType::Other),
            _ => None,
        }
    }

    /// Lenient parse: unrecognized labels fall back to `Other`
    pub fn from_label(s: &str) -> Self {
        Self::parse(s).unwrap_or(FamilySubType::Other)
    }

    /// Whether both parties carry the same role label
    pub fn is_symmetric(&self) -> bool {
        matches!(
            self,
            FamilySubType::Spouse | FamilySubType::Sibling | FamilySubType::Other
        )
    }
}

impl std::fmt::Display for FamilySubType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relationship between two actors
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Unique identifier
    pub id: RelationshipId,

    /// Storage-ordered first party
    pub origin_actor_id: ActorId,

    /// Storage-ordered second party
    pub destination_actor_id: ActorId,

    /// Category
    pub relationship_type: RelationshipType,

    /// Canonical sub-type label (family vocabulary or free-form label)
    pub sub_type: Option<String>,

    /// Role held by the origin, fixed at write time
    pub origin_role: Role,

    /// Role held by the destination, fixed at write time
    pub destination_role: Role,

    /// False for relationships that only read one way
    pub is_bidirectional: bool,

    /// Whether the sub-type was exclusive when last written
    pub exclusive: bool,

    /// Category-specific metadata
    pub attributes: Attributes,

    /// Free-text notes
    pub notes: Option<String>,

    /// Start of temporal validity
    pub start_date: Timestamp,

    /// End of temporal validity; `None` while active
    pub end_date: Option<Timestamp>,

    /// Soft-delete marker; terminal once set
    pub deleted_at: Option<Timestamp>,

    /// Audit: creation time
    pub created_at: Timestamp,

    /// Audit: last mutation time
    pub updated_at: Timestamp,
}

impl Relationship {
    /// Build a fresh active relationship starting at `now`
    #[allow(clippy::too_many_arguments)]
    pub fn active(
        origin_actor_id: ActorId,
        destination_actor_id: ActorId,
        relationship_type: RelationshipType,
        sub_type: Option<String>,
        roles: RolePair,
        exclusive: bool,
        notes: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: RelationshipId::new(),
            origin_actor_id,
            destination_actor_id,
            relationship_type,
            sub_type,
            origin_role: roles.origin,
            destination_role: roles.destination,
            is_bidirectional: true,
            exclusive,
            attributes: Attributes::new(),
            notes,
            start_date: now,
            end_date: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current lifecycle state, derived from the two timestamps
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_timestamps(self.end_date, self.deleted_at)
    }

    /// True iff the relationship has no end date and is not soft-deleted
    pub fn is_current(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// Family sub-type, if this is a family relationship
    pub fn family_sub_type(&self) -> Option<FamilySubType> {
        match self.relationship_type {
            RelationshipType::Family => {
                Some(FamilySubType::from_label(self.sub_type.as_deref().unwrap_or("")))
            }
            _ => None,
        }
    }

    /// Whether `actor` is either party
    pub fn involves(&self, actor: ActorId) -> bool {
        self.origin_actor_id == actor || self.destination_actor_id == actor
    }

    /// Stored role pair
    pub fn roles(&self) -> RolePair {
        RolePair {
            origin: self.origin_role,
            destination: self.destination_role,
        }
    }
}

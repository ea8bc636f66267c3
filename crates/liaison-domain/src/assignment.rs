//! Assignment module - actor ↔ share ownership, titularship and beneficiary links
//!
//! Assignments follow the same temporal-validity and soft-delete discipline as
//! relationships, but the role is the assignment type chosen by the caller.

use crate::lifecycle::LifecycleState;
use crate::{ActorId, AssignmentId, ShareId, Timestamp};

/// How an actor holds a share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentType {
    /// Legal owner of the share
    Owner,

    /// Registered titleholder (may differ from the owner)
    Titleholder,

    /// Beneficiary of the share's rights
    Beneficiary,
}

impl AssignmentType {
    /// Get the assignment type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentType::Owner => "owner",
            AssignmentType::Titleholder => "titleholder",
            AssignmentType::Beneficiary => "beneficiary",
        }
    }

    /// Parse an assignment type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "owner" | "dueno" | "propietario" => Some(AssignmentType::Owner),
            "titleholder" | "titular" => Some(AssignmentType::Titleholder),
            "beneficiary" | "beneficiario" => Some(AssignmentType::Beneficiary),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssignmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid assignment type: {}", s))
    }
}

/// A share assigned to an actor
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Unique identifier
    pub id: AssignmentId,

    /// Holder of the share
    pub actor_id: ActorId,

    /// Share being held
    pub share_id: ShareId,

    /// How the share is held
    pub assignment_type: AssignmentType,

    /// Participation percentage in [0, 100], mostly for beneficiaries
    pub percentage: Option<f64>,

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

impl Assignment {
    /// Build a fresh active assignment starting at `now`
    pub fn active(
        actor_id: ActorId,
        share_id: ShareId,
        assignment_type: AssignmentType,
        percentage: Option<f64>,
        notes: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            actor_id,
            share_id,
            assignment_type,
            percentage,
            notes,
            start_date: now,
            end_date: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_timestamps(self.end_date, self.deleted_at)
    }

    /// True iff the assignment has no end date and is not soft-deleted
    pub fn is_current(&self) -> bool {
        self.state() == LifecycleState::Active
    }
}

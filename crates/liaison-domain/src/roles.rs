//! Role reciprocity - maps a sub-type and the origin's gender to a role pair
//!
//! Resolution is a pure function over a fixed table. Symmetric sub-types give
//! both parties the same label; asymmetric ones gender the origin's label and
//! fix the destination's label by the requested sub-type. Unrecognized labels
//! resolve to the neutral `relative` pair and never fail.

use crate::actor::Gender;
use crate::relationship::{FamilySubType, RelationshipType};

/// Human-meaningful label held by one party of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Role {
    Spouse,
    Sibling,
    Father,
    Mother,
    Parent,
    Son,
    Daughter,
    Child,
    FatherInLaw,
    MotherInLaw,
    ParentInLaw,
    SonInLaw,
    DaughterInLaw,
    ChildInLaw,
    Relative,
    Employer,
    Employee,
    Referrer,
    Referred,
    Organization,
    Member,
    CommercialPartner,
    Related,
}

impl Role {
    /// Storage label
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Spouse => "spouse",
            Role::Sibling => "sibling",
            Role::Father => "father",
            Role::Mother => "mother",
            Role::Parent => "parent",
            Role::Son => "son",
            Role::Daughter => "daughter",
            Role::Child => "child",
            Role::FatherInLaw => "father_in_law",
            Role::MotherInLaw => "mother_in_law",
            Role::ParentInLaw => "parent_in_law",
            Role::SonInLaw => "son_in_law",
            Role::DaughterInLaw => "daughter_in_law",
            Role::ChildInLaw => "child_in_law",
            Role::Relative => "relative",
            Role::Employer => "employer",
            Role::Employee => "employee",
            Role::Referrer => "referrer",
            Role::Referred => "referred",
            Role::Organization => "organization",
            Role::Member => "member",
            Role::CommercialPartner => "commercial_partner",
            Role::Related => "related",
        }
    }

    /// Parse a storage label
    pub fn parse(s: &str) -> Option<Self> {
        let role = match s {
            "spouse" => Role::Spouse,
            "sibling" => Role::Sibling,
            "father" => Role::Father,
            "mother" => Role::Mother,
            "parent" => Role::Parent,
            "son" => Role::Son,
            "daughter" => Role::Daughter,
            "child" => Role::Child,
            "father_in_law" => Role::FatherInLaw,
            "mother_in_law" => Role::MotherInLaw,
            "parent_in_law" => Role::ParentInLaw,
            "son_in_law" => Role::SonInLaw,
            "daughter_in_law" => Role::DaughterInLaw,
            "child_in_law" => Role::ChildInLaw,
            "relative" => Role::Relative,
            "employer" => Role::Employer,
            "employee" => Role::Employee,
            "referrer" => Role::Referrer,
            "referred" => Role::Referred,
            "organization" => Role::Organization,
            "member" => Role::Member,
            "commercial_partner" => Role::CommercialPartner,
            "related" => Role::Related,
            _ => return None,
        };
        Some(role)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matched (origin, destination) role labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RolePair {
    /// Role held by the origin actor
    pub origin: Role,

    /// Role held by the destination actor
    pub destination: Role,
}

impl RolePair {
    /// Pair where both parties carry the same label
    pub fn symmetric(role: Role) -> Self {
        Self {
            origin: role,
            destination: role,
        }
    }

    /// Whether this pair is a row of the reciprocity table for `sub_type`
    pub fn is_reciprocal_for(&self, sub_type: FamilySubType) -> bool {
        [Gender::Male, Gender::Female, Gender::Unspecified]
            .iter()
            .any(|gender| resolve_roles(sub_type, *gender) == *self)
    }
}

/// Gendered label triple: (male, female, neutral)
fn gendered(gender: Gender, male: Role, female: Role, neutral: Role) -> Role {
    match gender {
        Gender::Male => male,
        Gender::Female => female,
        Gender::Unspecified => neutral,
    }
}

/// Resolve the role pair for a family sub-type and the origin's gender
pub fn resolve_roles(sub_type: FamilySubType, origin_gender: Gender) -> RolePair {
    let g = origin_gender;
    let (origin, destination) = match sub_type {
        FamilySubType::Spouse => (Role::Spouse, Role::Spouse),
        FamilySubType::Sibling => (Role::Sibling, Role::Sibling),
        FamilySubType::Child => (gendered(g, Role::Father, Role::Mother, Role::Parent), Role::Child),
        FamilySubType::Parent => (gendered(g, Role::Son, Role::Daughter, Role::Child), Role::Parent),
        FamilySubType::FatherInLaw => (
            gendered(g, Role::SonInLaw, Role::DaughterInLaw, Role::ChildInLaw),
            Role::FatherInLaw,
        ),
        FamilySubType::MotherInLaw => (
            gendered(g, Role::SonInLaw, Role::DaughterInLaw, Role::ChildInLaw),
            Role::MotherInLaw,
        ),
        FamilySubType::SonInLaw => (
            gendered(g, Role::FatherInLaw, Role::MotherInLaw, Role::ParentInLaw),
            Role::SonInLaw,
        ),
        FamilySubType::DaughterInLaw => (
            gendered(g, Role::FatherInLaw, Role::MotherInLaw, Role::ParentInLaw),
            Role::DaughterInLaw,
        ),
        FamilySubType::Other => (Role::Relative, Role::Relative),
    };

    RolePair { origin, destination }
}

/// Resolve from a raw sub-type label; unknown labels use the `other` pair
pub fn resolve_roles_for_label(label: &str, origin_gender: Gender) -> RolePair {
    resolve_roles(FamilySubType::from_label(label), origin_gender)
}

/// Role pair for a non-family category
///
/// Non-family categories carry no gendered vocabulary; the pair depends only
/// on the category, with the origin as the initiating party.
pub fn category_roles(relationship_type: RelationshipType) -> RolePair {
    let (origin, destination) = match relationship_type {
        RelationshipType::Family => (Role::Relative, Role::Relative),
        RelationshipType::Employment => (Role::Employer, Role::Employee),
        RelationshipType::Referral => (Role::Referrer, Role::Referred),
        RelationshipType::Membership => (Role::Organization, Role::Member),
        RelationshipType::Commercial => (Role::CommercialPartner, Role::CommercialPartner),
        RelationshipType::Other => (Role::Related, Role::Related),
    };

    RolePair { origin, destination }
}

/// Resolve roles for any category
///
/// Family relationships use the reciprocity table; everything else uses the
/// fixed per-category pair.
pub fn resolve_for(
    relationship_type: RelationshipType,
    sub_type: Option<&str>,
    origin_gender: Gender,
) -> RolePair {
    match relationship_type {
        RelationshipType::Family => resolve_roles_for_label(sub_type.unwrap_or(""), origin_gender),
        other => category_roles(other),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn gender_strategy() -> impl Strategy<Value = Gender> {
        prop_oneof![
            Just(Gender::Male),
            Just(Gender::Female),
            Just(Gender::Unspecified),
        ]
    }

    proptest! {
        /// Property: resolution is deterministic and always lands in the table
        #[test]
        fn test_resolution_is_pure(label in "[a-z_ -]{0,16}", gender in gender_strategy()) {
            let first = resolve_roles_for_label(&label, gender);
            let second = resolve_roles_for_label(&label, gender);
            prop_assert_eq!(first, second);

            let sub_type = FamilySubType::from_label(&label);
            prop_assert!(first.is_reciprocal_for(sub_type));
        }

        /// Property: the destination role never depends on the origin's gender
        #[test]
        fn test_destination_is_gender_independent(idx in 0usize..9) {
            let sub_type = FamilySubType::ALL[idx];
            let male = resolve_roles(sub_type, Gender::Male);
            let female = resolve_roles(sub_type, Gender::Female);
            prop_assert_eq!(male.destination, female.destination);
        }
    }
}

//! Configuration for engine operations
//!
//! Defines which family sub-types are exclusive and the validation bounds
//! applied to caller input.

use std::path::Path;

use liaison_domain::{FamilySubType, RelationshipType};
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Configuration for the relationship engine
///
/// # Examples
///
/// ```
/// use liaison_engine::EngineConfig;
/// use liaison_domain::FamilySubType;
///
/// let config = EngineConfig::default();
/// assert!(config.is_exclusive_sub_type(FamilySubType::Spouse));
/// assert!(!config.is_exclusive_sub_type(FamilySubType::Sibling));
///
/// let config = EngineConfig::permissive();
/// assert!(!config.is_exclusive_sub_type(FamilySubType::Spouse));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Family sub-types an origin may hold at most one active instance of
    /// Default: spouse, parent, father_in_law, mother_in_law
    #[serde(default = "default_exclusive_sub_types")]
    pub exclusive_sub_types: Vec<String>,

    /// Whether an explicit end date may lie before the time of the call
    /// (never before the relationship's start date)
    /// Default: true
    #[serde(default = "default_true")]
    pub allow_backdated_end: bool,

    /// Maximum length of free-text notes, in characters
    /// Default: 2000
    #[serde(default = "default_max_notes_len")]
    pub max_notes_len: usize,
}

fn default_exclusive_sub_types() -> Vec<String> {
    [
        FamilySubType::Spouse,
        FamilySubType::Parent,
        FamilySubType::FatherInLaw,
        FamilySubType::MotherInLaw,
    ]
    .iter()
    .map(|s| s.as_str().to_string())
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_max_notes_len() -> usize {
    2000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exclusive_sub_types: default_exclusive_sub_types(),
            allow_backdated_end: true,
            max_notes_len: default_max_notes_len(),
        }
    }
}

impl EngineConfig {
    /// Strict configuration: child-in-law sub-types are exclusive too, and
    /// end dates may not be backdated
    pub fn strict() -> Self {
        let mut exclusive = default_exclusive_sub_types();
        exclusive.push(FamilySubType::SonInLaw.as_str().to_string());
        exclusive.push(FamilySubType::DaughterInLaw.as_str().to_string());

        Self {
            exclusive_sub_types: exclusive,
            allow_backdated_end: false,
            max_notes_len: 500,
        }
    }

    /// Permissive configuration: nothing is exclusive
    pub fn permissive() -> Self {
        Self {
            exclusive_sub_types: Vec::new(),
            allow_backdated_end: true,
            max_notes_len: 10_000,
        }
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Reject labels outside the family vocabulary
    pub fn validate(&self) -> Result<(), EngineError> {
        for label in &self.exclusive_sub_types {
            match FamilySubType::parse(label) {
                None => {
                    return Err(EngineError::Config(format!(
                        "unknown exclusive sub-type '{}'",
                        label
                    )))
                }
                Some(FamilySubType::Other) => {
                    return Err(EngineError::Config(
                        "the 'other' sub-type cannot be exclusive".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Whether a family sub-type is exclusive
    pub fn is_exclusive_sub_type(&self, sub_type: FamilySubType) -> bool {
        self.exclusive_sub_types
            .iter()
            .any(|label| FamilySubType::parse(label) == Some(sub_type))
    }

    /// Whether a (category, sub-type label) pair is exclusive
    pub fn is_exclusive(&self, relationship_type: RelationshipType, sub_type: Option<&str>) -> bool {
        match (relationship_type, sub_type) {
            (RelationshipType::Family, Some(label)) => FamilySubType::parse(label)
                .is_some_and(|sub_type| self.is_exclusive_sub_type(sub_type)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.is_exclusive_sub_type(FamilySubType::Spouse));
        assert!(config.is_exclusive_sub_type(FamilySubType::Parent));
        assert!(config.is_exclusive_sub_type(FamilySubType::FatherInLaw));
        assert!(config.is_exclusive_sub_type(FamilySubType::MotherInLaw));
        assert!(!config.is_exclusive_sub_type(FamilySubType::Child));
        assert!(!config.is_exclusive_sub_type(FamilySubType::Other));
        assert!(config.allow_backdated_end);
        assert_eq!(config.max_notes_len, 2000);
    }

    #[test]
    fn test_strict_config() {
        let config = EngineConfig::strict();
        assert!(config.is_exclusive_sub_type(FamilySubType::SonInLaw));
        assert!(!config.allow_backdated_end);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_exclusive_only_for_family() {
        let config = EngineConfig::default();
        assert!(config.is_exclusive(RelationshipType::Family, Some("spouse")));
        assert!(!config.is_exclusive(RelationshipType::Commercial, Some("spouse")));
        assert!(!config.is_exclusive(RelationshipType::Family, None));
    }

    #[test]
    fn test_toml_partial_uses_defaults() {
        let config = EngineConfig::from_toml_str("max_notes_len = 80\n").unwrap();
        assert_eq!(config.max_notes_len, 80);
        assert_eq!(config.exclusive_sub_types, EngineConfig::default().exclusive_sub_types);
    }

    #[test]
    fn test_toml_rejects_unknown_sub_type() {
        let err = EngineConfig::from_toml_str("exclusive_sub_types = [\"cousin\"]\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "exclusive_sub_types = [\"spouse\"]\nallow_backdated_end = false\n")
            .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert!(config.is_exclusive_sub_type(FamilySubType::Spouse));
        assert!(!config.is_exclusive_sub_type(FamilySubType::Parent));
        assert!(!config.allow_backdated_end);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = EngineConfig::strict();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}

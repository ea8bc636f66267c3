//! Identifier types - UUIDv7-backed handles for every stored record

use std::fmt;

/// Defines a UUIDv7-backed identifier newtype.
///
/// UUIDv7 provides:
/// - Chronological sortability (records created later sort later)
/// - 128-bit uniqueness
/// - No coordination required for generation
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an identifier from a raw u128 value
            ///
            /// This is primarily for storage layer deserialization.
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an identifier from its hyphenated UUID string
            pub fn from_string(s: &str) -> Result<Self, String> {
                uuid::Uuid::parse_str(s.trim())
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| format!("Invalid {} '{}': {}", stringify!($name), s, e))
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }

            /// Big-endian byte representation used by the storage layer
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_be_bytes()
            }

            /// Rebuild an identifier from its big-endian bytes
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
                let arr: [u8; 16] = bytes.try_into().map_err(|_| {
                    format!(
                        "Expected 16 bytes for {}, got {}",
                        stringify!($name),
                        bytes.len()
                    )
                })?;
                Ok(Self(u128::from_be_bytes(arr)))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

uuid_id! {
    /// Identifier of an actor (person or organization)
    ActorId
}

uuid_id! {
    /// Identifier of an actor-to-actor relationship record
    RelationshipId
}

uuid_id! {
    /// Identifier of a share ("acción") that can be assigned to actors
    ShareId
}

uuid_id! {
    /// Identifier of an actor-to-share assignment record
    AssignmentId
}

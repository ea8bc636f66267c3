//! Command implementations.

pub mod actor;
pub mod assignment;
pub mod relationship;

pub use self::actor::execute_actor;
pub use self::assignment::{
    execute_assign, execute_assignment, execute_assignments, execute_unassign,
};
pub use self::relationship::{
    execute_end, execute_link, execute_list, execute_reclassify, execute_remove, execute_show,
};

use crate::error::{CliError, Result};
use std::str::FromStr;

/// Parse an identifier argument, naming the kind of record on failure.
pub(crate) fn parse_id<T>(input: &str, what: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    T::from_str(input.trim())
        .map_err(|e| CliError::InvalidInput(format!("Invalid {} ID '{}': {}", what, input, e)))
}

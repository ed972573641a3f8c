// handlers/mod.rs - Two security tiers
//
// Public (token optional) → Protected (valid bearer token required)

pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Book ids in paths are positive integers
pub(crate) fn parse_book_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request("Invalid book ID")),
    }
}

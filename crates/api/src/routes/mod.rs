pub(crate) mod ai;
pub(crate) mod classes;
pub(crate) mod framework;
pub(crate) mod lessons;
pub(crate) mod progress;
pub(crate) mod students;

use std::str::FromStr;

use aet_core::model::ParseIdError;

use crate::ApiError;

/// Parse a numeric id from a path segment.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = ParseIdError>,
{
    Ok(raw.parse::<T>()?)
}

//! BucketKV - Duration Strings
//! Parses token lifetimes such as `24h`, `30m` or `1h30m`.

use std::time::Duration;

use crate::error::{BucketKvError, Result};

/// Parse a human-readable duration into a [`Duration`].
///
/// Accepts a sequence of `<integer><unit>` terms, optionally space separated, with
/// units from `ns` up to `d` (`250ms`, `90s`, `1h30m`, `2d`).
pub fn parse(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| BucketKvError::Validation(format!("invalid duration {input:?}: {e}")))
}

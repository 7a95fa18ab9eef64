use chrono::{SecondsFormat, Utc};

/// Current UTC time as an RFC 3339 string with millisecond precision,
/// the format written into metadata and profile documents.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

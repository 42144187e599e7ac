pub mod attendance;
pub mod courses;
pub mod materials;
pub mod notifications;
pub mod users;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn format_naive_iso(value: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(value, Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

use chrono::{NaiveDateTime, NaiveTime};

use crate::database::models::AttendanceRecord;
use crate::engine::reconciliation::{AttendancePolicy, merge_observations};

pub const AUTO_CHECKOUT_OBSERVATION: &str = "Automatic system checkout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoClose {
    pub exit_time: NaiveTime,
    pub observations: Option<String>,
}

/// Closes a record that has been open for at least `auto_checkout_after`.
///
/// The synthesised exit is entry plus `auto_checkout_shift`, wrapping past midnight.
pub fn plan_auto_close(
    policy: &AttendancePolicy,
    now: NaiveDateTime,
    record: &AttendanceRecord,
) -> Option<AutoClose> {
    if !record.is_open() || record.date > now.date() {
        return None;
    }
    let entry_time = record.entry_time?;
    let entry_at = record.date.and_time(entry_time);
    if now - entry_at < policy.auto_checkout_after {
        return None;
    }

    Some(AutoClose {
        exit_time: entry_time + policy.auto_checkout_shift,
        observations: merge_observations(
            record.observations.as_deref(),
            Some(AUTO_CHECKOUT_OBSERVATION),
        ),
    })
}

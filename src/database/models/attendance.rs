use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub observations: Option<String>,
    pub auto_closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn entry_at(&self) -> Option<NaiveDateTime> {
        self.entry_time.map(|time| self.date.and_time(time))
    }

    pub fn is_open(&self) -> bool {
        self.entry_time.is_some() && self.exit_time.is_none()
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum AttendanceStatus {
        #[default]
        Present => "present",
        Absent => "absent",
        Late => "late",
        Permission => "permission",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum PunchKind {
        Entry => "entry",
        Exit => "exit",
    }
}

/// A clock-in or clock-out. Missing date/time default to the clock's "now".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunchInput {
    pub employee_id: Uuid,
    pub kind: PunchKind,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub observations: Option<String>,
}

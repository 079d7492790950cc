use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        Admin => "admin",
        Supervisor => "supervisor",
        Technician => "technician",
        Helpdesk => "helpdesk",
        Noc => "noc",
    }
}

impl Role {
    /// Administrators are never scheduled.
    pub fn has_schedule(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Active, non-admin employees get schedules and appear in reports.
    pub fn is_eligible(&self) -> bool {
        self.is_active && self.role.has_schedule()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Day schedule {0} is locked by a leave request")]
    LockedByLeaveRequest(Uuid),

    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Not deletable: {0}")]
    NotDeletable(String),

    #[error("No eligible employees to schedule")]
    NoEligibleEmployees,

    #[error("Nothing updated: every selected day is locked by a leave request")]
    NothingUpdated,

    #[error("Employee {employee_id} already clocked in on {date}")]
    AlreadyClockedIn { employee_id: Uuid, date: NaiveDate },

    #[error("Employee {employee_id} already clocked out on {date}")]
    AlreadyClockedOut { employee_id: Uuid, date: NaiveDate },

    #[error("Employee {employee_id} has no entry on {date}")]
    NoEntryYet { employee_id: Uuid, date: NaiveDate },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

impl AppError {
    /// Duplicate or overlapping writes: a week over another week, a second punch.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AppError::Conflict(_)
                | AppError::AlreadyClockedIn { .. }
                | AppError::AlreadyClockedOut { .. }
        )
    }

    /// Local validation failures the caller can fix and retry.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AppError::DatabaseError(_) | AppError::InternalServerError(_)
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                log::warn!("Unique constraint violated: {}", db_error);
                return AppError::Conflict(format!(
                    "duplicate row ({})",
                    db_error.constraint().unwrap_or("unique constraint")
                ));
            }
        }

        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        log::error!("Anyhow error: {}", error);

        // Check if this is a sqlx::Error and handle it appropriately
        match error.downcast::<sqlx::Error>() {
            Ok(sqlx_err) => AppError::from(sqlx_err),
            Err(original_error) => AppError::InternalServerError(Some(original_error.to_string())),
        }
    }
}

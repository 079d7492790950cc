use anyhow::Result;
use serde_json::json;

use crate::database::models::{Employee, LeaveRequest};

/// Outbound notifications about leave requests. Called after the triggering
/// transaction has committed; callers log failures and move on.
pub trait Notifier: Send + Sync {
    fn notify_new_leave_request(&self, request: &LeaveRequest, employee: &Employee) -> Result<()>;

    fn notify_leave_request_decision(
        &self,
        request: &LeaveRequest,
        employee: &Employee,
    ) -> Result<()>;
}

/// Writes each notification as a JSON payload to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    fn payload(event: &str, request: &LeaveRequest, employee: &Employee) -> serde_json::Value {
        json!({
            "event": event,
            "employee": {
                "id": employee.id,
                "name": employee.full_name,
                "email": employee.email,
            },
            "request": request,
        })
    }
}

impl Notifier for LogNotifier {
    fn notify_new_leave_request(&self, request: &LeaveRequest, employee: &Employee) -> Result<()> {
        let payload = Self::payload("leave_request.created", request, employee);
        log::info!("notification: {}", serde_json::to_string(&payload)?);
        Ok(())
    }

    fn notify_leave_request_decision(
        &self,
        request: &LeaveRequest,
        employee: &Employee,
    ) -> Result<()> {
        let payload = Self::payload("leave_request.decided", request, employee);
        log::info!("notification: {}", serde_json::to_string(&payload)?);
        Ok(())
    }
}

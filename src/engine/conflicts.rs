use uuid::Uuid;

use crate::database::models::{Employee, LeaveRequest, RoleConflict};
use crate::engine::calendar::DateRange;

fn claims(request: &LeaveRequest, range: &DateRange) -> bool {
    let requested = DateRange {
        start: request.start_date,
        end: request.end_date,
    };
    request.status.is_active() && requested.overlaps(range)
}

/// The employee's own pending/approved requests that overlap `range`.
///
/// `exclude` skips the request being checked when it is already stored.
pub fn own_conflicts(
    employee_id: Uuid,
    range: &DateRange,
    requests: &[LeaveRequest],
    exclude: Option<Uuid>,
) -> Vec<LeaveRequest> {
    requests
        .iter()
        .filter(|r| r.employee_id == employee_id)
        .filter(|r| Some(r.id) != exclude)
        .filter(|r| claims(r, range))
        .cloned()
        .collect()
}

/// Overlapping pending/approved requests from other active employees with the requester's role.
pub fn role_conflicts(
    requester: &Employee,
    range: &DateRange,
    candidates: &[(Employee, LeaveRequest)],
) -> Vec<RoleConflict> {
    candidates
        .iter()
        .filter(|(employee, _)| {
            employee.id != requester.id && employee.is_active && employee.role == requester.role
        })
        .filter(|(_, request)| claims(request, range))
        .map(|(employee, request)| RoleConflict {
            employee_id: employee.id,
            employee_name: employee.full_name.clone(),
            request: request.clone(),
        })
        .collect()
}

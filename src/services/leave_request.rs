use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::{Connection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{
        Employee, LeaveDecision, LeaveDecisionOutcome, LeaveRequest, LeaveRequestInput,
        LeaveStatus, LeaveSubmission, OverlayOutcome, RoleConflict, WeekSchedule,
    },
    repositories::{
        base_schedule as base_repo, day_schedule as day_repo, employee as employee_repo,
        leave_request as leave_repo, week_schedule as week_repo,
    },
    transaction::DatabaseTransaction,
};
use crate::engine::{
    BaseScheduleIndex, DateRange, OverlayStep, conflicts,
    overlay::{plan_overlay, plan_revert},
};
use crate::error::AppError;
use crate::services::notifier::Notifier;

/// Overlays `request` onto every week in `weeks`, one savepoint per week.
///
/// A week that fails is rolled back on its own, logged, and listed in
/// `failed_weeks`; the surrounding transaction carries on.
pub(crate) async fn apply_to_weeks(
    tx: &mut Transaction<'_, Postgres>,
    request: &LeaveRequest,
    requester: &Employee,
    weeks: &[WeekSchedule],
) -> Result<OverlayOutcome, AppError> {
    let mut outcome = OverlayOutcome::default();

    for week in weeks {
        let mut savepoint = Connection::begin(&mut **tx).await?;
        match apply_to_week(&mut savepoint, request, requester, week).await {
            Ok(days) => {
                savepoint.commit().await?;
                outcome.weeks_touched.push(week.id);
                outcome.days_overlaid += days;
            }
            Err(err) => {
                log::warn!(
                    "Could not overlay leave request {} onto week {} ({}): {}",
                    request.id,
                    week.id,
                    week.range(),
                    err
                );
                savepoint.rollback().await?;
                outcome.failed_weeks.push(week.id);
            }
        }
    }

    Ok(outcome)
}

async fn apply_to_week(
    tx: &mut Transaction<'_, Postgres>,
    request: &LeaveRequest,
    requester: &Employee,
    week: &WeekSchedule,
) -> Result<usize, AppError> {
    let days = day_repo::list_for_week(tx, week.id).await?;
    let steps = plan_overlay(request, requester, week, &days);

    for step in &steps {
        match step {
            OverlayStep::Update(id, fields) => {
                day_repo::update_fields(tx, *id, fields).await?;
            }
            OverlayStep::Insert(day) => {
                day_repo::insert_day(tx, week.id, day).await?;
            }
        }
    }

    log::debug!(
        "Leave request {} overlaid {} day(s) of week {}",
        request.id,
        steps.len(),
        week.id
    );
    Ok(steps.len())
}

/// Turns every day linked to `leave_request_id` back into a manual normal day.
pub(crate) async fn revert_from_schedules(
    tx: &mut Transaction<'_, Postgres>,
    leave_request_id: Uuid,
) -> Result<usize, AppError> {
    let linked = day_repo::list_by_leave_request(tx, leave_request_id).await?;
    if linked.is_empty() {
        return Ok(0);
    }

    let mut employee_ids: Vec<Uuid> = linked.iter().map(|day| day.employee_id).collect();
    employee_ids.sort();
    employee_ids.dedup();
    let base_rows = base_repo::list_for_employees(tx, &employee_ids).await?;
    let base = BaseScheduleIndex::from_rows(base_rows);

    let reverted = plan_revert(&linked, &base);
    for (id, fields) in &reverted {
        day_repo::update_fields(tx, *id, fields).await?;
    }

    Ok(reverted.len())
}

async fn load_role_conflicts(
    tx: &mut Transaction<'_, Postgres>,
    requester: &Employee,
    range: &DateRange,
) -> Result<Vec<RoleConflict>, AppError> {
    let colleagues = employee_repo::list_by_role(tx, requester.role).await?;
    let requests = leave_repo::list_active_overlapping_for_role(tx, requester.role, range).await?;

    let candidates: Vec<(Employee, LeaveRequest)> = requests
        .into_iter()
        .filter_map(|request| {
            colleagues
                .iter()
                .find(|colleague| colleague.id == request.employee_id)
                .map(|colleague| (colleague.clone(), request))
        })
        .collect();

    Ok(conflicts::role_conflicts(requester, range, &candidates))
}

async fn require_employee(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: Uuid,
) -> Result<Employee, AppError> {
    employee_repo::find_by_id(tx, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("employee {}", employee_id)))
}

async fn require_request(
    tx: &mut Transaction<'_, Postgres>,
    request_id: Uuid,
) -> Result<LeaveRequest, AppError> {
    leave_repo::find_by_id_for_update(tx, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("leave request {}", request_id)))
}

#[derive(Clone)]
pub struct LeaveRequestService {
    pool: PgPool,
    notifier: Arc<dyn Notifier>,
}

impl LeaveRequestService {
    pub fn new(pool: PgPool, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, notifier }
    }

    /// Stores a pending request. Overlaps with the employee's own requests and
    /// with colleagues of the same role are returned as warnings.
    pub async fn submit(&self, input: LeaveRequestInput) -> Result<LeaveSubmission, AppError> {
        let range = DateRange::new(input.start_date, input.end_date)?;

        let (submission, employee) = DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let employee = require_employee(tx, input.employee_id).await?;

                let existing = leave_repo::list_active_overlapping(tx, employee.id, &range).await?;
                let request = leave_repo::create_request(tx, input).await?;
                let own_conflicts =
                    conflicts::own_conflicts(employee.id, &range, &existing, Some(request.id));
                let role_conflicts = load_role_conflicts(tx, &employee, &range).await?;

                log::info!(
                    "Leave request {} submitted by {} for {} ({} own / {} role overlaps)",
                    request.id,
                    employee.id,
                    range,
                    own_conflicts.len(),
                    role_conflicts.len()
                );

                Ok((
                    LeaveSubmission {
                        request,
                        own_conflicts,
                        role_conflicts,
                    },
                    employee,
                ))
            })
        })
        .await?;

        if let Err(err) = self
            .notifier
            .notify_new_leave_request(&submission.request, &employee)
        {
            log::warn!(
                "New leave request notification for {} failed: {}",
                submission.request.id,
                err
            );
        }

        Ok(submission)
    }

    /// The employee's own pending/approved requests overlapping the dates.
    pub async fn detect_conflicts(
        &self,
        employee_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let range = DateRange::new(start_date, end_date)?;

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let existing = leave_repo::list_active_overlapping(tx, employee_id, &range).await?;
                Ok(conflicts::own_conflicts(employee_id, &range, &existing, None))
            })
        })
        .await
    }

    pub async fn detect_role_conflicts(
        &self,
        employee_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RoleConflict>, AppError> {
        let range = DateRange::new(start_date, end_date)?;

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let employee = require_employee(tx, employee_id).await?;
                load_role_conflicts(tx, &employee, &range).await
            })
        })
        .await
    }

    /// Approves or rejects a pending request.
    ///
    /// Approval overlays the request onto every week intersecting its dates.
    /// Rejection reverts any days still linked to it.
    pub async fn decide(
        &self,
        request_id: Uuid,
        decision: LeaveDecision,
        approver_id: Uuid,
        notes: Option<String>,
    ) -> Result<LeaveDecisionOutcome, AppError> {
        let (outcome, employee) = DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let current = require_request(tx, request_id).await?;
                if current.status != LeaveStatus::Pending {
                    return Err(AppError::AlreadyProcessed(format!(
                        "leave request {} is already {}",
                        request_id, current.status
                    )));
                }

                let employee = require_employee(tx, current.employee_id).await?;
                let request =
                    leave_repo::record_decision(tx, request_id, decision.into(), approver_id, notes)
                        .await?;

                let (overlay, days_reverted) = match decision {
                    LeaveDecision::Approved => {
                        let range = DateRange::new(request.start_date, request.end_date)?;
                        let weeks = week_repo::list_overlapping(tx, &range).await?;
                        let overlay = apply_to_weeks(tx, &request, &employee, &weeks).await?;
                        (Some(overlay), 0)
                    }
                    LeaveDecision::Rejected => (None, revert_from_schedules(tx, request.id).await?),
                };

                log::info!(
                    "Leave request {} {} by {}",
                    request.id,
                    request.status,
                    approver_id
                );

                Ok((
                    LeaveDecisionOutcome {
                        request,
                        overlay,
                        days_reverted,
                    },
                    employee,
                ))
            })
        })
        .await?;

        if let Some(overlay) = &outcome.overlay {
            if !overlay.is_complete() {
                log::warn!(
                    "Leave request {} approved but {} week(s) could not be updated",
                    outcome.request.id,
                    overlay.failed_weeks.len()
                );
            }
        }

        if let Err(err) = self
            .notifier
            .notify_leave_request_decision(&outcome.request, &employee)
        {
            log::warn!(
                "Decision notification for leave request {} failed: {}",
                outcome.request.id,
                err
            );
        }

        Ok(outcome)
    }

    /// Withdraws a pending or approved request, reverting its days first when approved.
    pub async fn cancel(&self, request_id: Uuid) -> Result<LeaveDecisionOutcome, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let current = require_request(tx, request_id).await?;
                if !current.status.is_active() {
                    return Err(AppError::AlreadyProcessed(format!(
                        "leave request {} is already {}",
                        request_id, current.status
                    )));
                }

                let days_reverted = if current.status == LeaveStatus::Approved {
                    revert_from_schedules(tx, request_id).await?
                } else {
                    0
                };
                let request =
                    leave_repo::update_status(tx, request_id, LeaveStatus::Cancelled).await?;

                log::info!(
                    "Leave request {} cancelled, {} day(s) reverted",
                    request_id,
                    days_reverted
                );

                Ok(LeaveDecisionOutcome {
                    request,
                    overlay: None,
                    days_reverted,
                })
            })
        })
        .await
    }

    pub async fn get_request(&self, request_id: Uuid) -> Result<LeaveRequest, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move { require_request(tx, request_id).await })
        })
        .await
    }

    pub async fn list_for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move { Ok(leave_repo::list_for_employee(tx, employee_id).await?) })
        })
        .await
    }

    pub async fn list_pending(&self) -> Result<Vec<LeaveRequest>, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move { Ok(leave_repo::list_by_status(tx, LeaveStatus::Pending).await?) })
        })
        .await
    }
}

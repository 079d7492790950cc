//! Scheduling and reconciliation rules. Nothing in here touches the database;
//! services load rows, call into these functions and persist what comes back.

pub mod auto_checkout;
pub mod calendar;
pub mod conflicts;
pub mod overlay;
pub mod reconciliation;
pub mod week_plan;

#[cfg(test)]
pub(crate) mod test_support;

pub use auto_checkout::{AUTO_CHECKOUT_OBSERVATION, AutoClose, plan_auto_close};
pub use calendar::{DateRange, DayClass, classify_day, validate_week_span};
pub use overlay::OverlayStep;
pub use reconciliation::{AttendancePolicy, LATE_PUNCH_OBSERVATION, ResolvedSchedule};
pub use week_plan::BaseScheduleIndex;

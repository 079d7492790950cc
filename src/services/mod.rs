pub mod attendance;
pub mod base_schedule;
pub mod leave_request;
pub mod notifier;
pub mod sweeper;
pub mod week_schedule;

pub use attendance::AttendanceService;
pub use base_schedule::BaseScheduleService;
pub use leave_request::LeaveRequestService;
pub use notifier::{LogNotifier, Notifier};
pub use sweeper::spawn_auto_checkout;
pub use week_schedule::WeekScheduleService;

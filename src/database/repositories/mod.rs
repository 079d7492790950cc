pub mod attendance;
pub mod base_schedule;
pub mod day_schedule;
pub mod employee;
pub mod leave_request;
pub mod week_schedule;

pub mod clock;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod services;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::AppError;
pub use services::{
    AttendanceService, BaseScheduleService, LeaveRequestService, LogNotifier, Notifier,
    WeekScheduleService,
};

pub mod attendance;
pub mod employee;
pub mod leave_request;
pub mod macros;
pub mod report;
pub mod schedule;

// Re-export all models for easy importing
pub use attendance::*;
pub use employee::*;
pub use leave_request::*;
pub use report::*;
pub use schedule::*;

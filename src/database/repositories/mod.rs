pub mod activity;
pub mod attendance;
pub mod employee;
pub mod leave;
pub mod stats;
pub mod user;

// Re-export all repositories for easy importing
pub use activity::ActivityRepository;
pub use attendance::AttendanceRepository;
pub use employee::EmployeeRepository;
pub use leave::{CancelActor, LeaveRepository};
pub use stats::StatsRepository;
pub use user::UserRepository;

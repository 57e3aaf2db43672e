mod macros;

pub mod activity;
pub mod attendance;
pub mod auth;
pub mod employee;
pub mod leave;
pub mod pagination;
pub mod stats;
pub mod user;

// Re-export all models for easy importing
pub use activity::*;
pub use attendance::*;
pub use auth::*;
pub use employee::*;
pub use leave::*;
pub use pagination::*;
pub use stats::*;
pub use user::*;

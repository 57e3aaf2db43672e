pub mod activity_logger;
pub mod auth;
pub mod user_context;

pub use activity_logger::ActivityLogger;
pub use auth::{AuthService, Claims};
pub use user_context::{AnyRole, Authorized, RoleSet, Staff, UserContext};

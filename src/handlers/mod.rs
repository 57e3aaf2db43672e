pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod employees;
pub mod leaves;
pub mod shared;

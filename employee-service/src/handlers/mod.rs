pub mod employees;
pub mod fallback;
pub mod health;

pub use employees::{add_employee, delete_employee, get_employees, preflight, update_employee};
pub use fallback::{method_not_allowed, not_found};
pub use health::{health_check, metrics_endpoint, readiness_check};

pub mod employee;
pub mod user;

pub use employee::{Employee, EmployeeInput, EmployeePatch, EmployeeResponse};
pub use user::User;

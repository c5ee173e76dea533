pub mod employees;
pub mod users;

//! Pages
//!
//! Top-level page components for each route.

pub mod appointments;
pub mod users;

pub use appointments::ManageAppointments;
pub use users::ManageUsers;

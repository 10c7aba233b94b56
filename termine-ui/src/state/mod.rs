//! State Management
//!
//! Global notices and the user table runtime.

pub mod global;
pub mod users;

pub use global::{provide_global_state, GlobalState};
pub use users::UserTableState;

//! UI Components
//!
//! Reusable Leptos components for the back office.

pub mod add_user;
pub mod loading;
pub mod nav;
pub mod user_table;

pub use add_user::AddUser;
pub use loading::{ErrorBanner, InlineLoading, Notices};
pub use nav::Nav;
pub use user_table::UserTable;

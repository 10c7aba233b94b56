//! # Termine Admin
//!
//! Back office for the Termine appointment booking service: list users,
//! toggle admin rights, edit coupon counts inline and create appointment
//! slots through the admin REST API.
//!
//! ## Modules
//!
//! - [`users`]: Data model and the inline-edit/refresh state machine (no I/O,
//!   also compiled into the browser frontend)
//! - `client`: Admin REST API client over `reqwest`
//! - `controller`: Runs the user table on tokio with polling and spinner timers
//! - `config`: TOML configuration with environment overrides
//!
//! Everything except [`users`] requires the default `client` feature.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use termine_admin::client::{ClientConfig, HttpUserApi};
//! use termine_admin::controller::UserTableController;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = HttpUserApi::new(ClientConfig::new("http://localhost:8000/admin_api"))?;
//!     let controller = UserTableController::new(api);
//!
//!     controller.load_users().await;
//!     controller.begin_edit("alice")?;
//!     controller.change_input("coupons", "5")?;
//!     controller.commit_edit().await?;
//!
//!     controller.shutdown();
//!     Ok(())
//! }
//! ```

pub mod users;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub mod config;
#[cfg(feature = "client")]
pub mod controller;

// Re-export top-level types for convenience
pub use users::{
    ApiError, ApiResult, AppointmentBatch, CommitTicket, EditBuffer, FieldError, NewUser,
    Operation, Spinner, SpinnerState, TableError, TimerCommand, User, UserField, UserList,
    UserTable, ValidationError, ENTER_KEY, POLL_INTERVAL, SPINNER_MIN_VISIBLE,
};

#[cfg(feature = "client")]
pub use client::{ClientConfig, HttpUserApi, UserApi};

#[cfg(feature = "client")]
pub use config::{Config, ConfigError, DisplayConfig, LoggingConfig};

#[cfg(feature = "client")]
pub use controller::{ControllerError, UserTableController};

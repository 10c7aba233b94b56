//! User Management Core
//!
//! Data model and inline-edit state machine for the back-office user table.
//! Nothing in this module performs I/O or owns a timer, so both the tokio
//! controller and the browser frontend drive the same [`UserTable`].

mod edit;
mod error;
mod spinner;
mod table;
mod types;

use std::time::Duration;

pub use edit::{CommitTicket, EditBuffer};
pub use error::{ApiError, ApiResult, FieldError, ValidationError};
pub use spinner::{Spinner, SpinnerState, TimerCommand};
pub use table::{Operation, TableError, UserTable};
pub use types::{AppointmentBatch, NewUser, User, UserField, UserList};

/// Period of the background user list refresh
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Minimum time the refresh spinner stays up after the last call finishes
pub const SPINNER_MIN_VISIBLE: Duration = Duration::from_millis(1250);

/// `KeyboardEvent.key` value that saves the open edit
pub const ENTER_KEY: &str = "Enter";

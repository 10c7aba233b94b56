//! User Table State
//!
//! The edit-and-refresh state machine behind the user management view. It
//! keeps the displayed list, the open inline edit, the refresh trigger, the
//! spinner and the last error together, so every runtime (tokio controller,
//! browser view) applies the same rules:
//!
//! - fetched lists replace the displayed list wholesale; a failed fetch keeps
//!   the stale list
//! - admin toggles send the flipped record without touching the list first
//! - coupon edits are written into the list immediately and sent on blur or
//!   Enter, only when something changed
//! - every write schedules a refresh whatever its outcome; a failed edit is
//!   rolled back to the last server value

use std::fmt;

use super::edit::{CommitTicket, EditBuffer};
use super::error::{ApiError, ApiResult};
use super::spinner::{Spinner, TimerCommand};
use super::types::{User, UserField, UserList};
use super::ENTER_KEY;

/// Which table operation produced an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    LoadUsers,
    ToggleAdmin { user_name: String },
    SaveEdit { user_name: String },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::LoadUsers => write!(f, "Loading users"),
            Operation::ToggleAdmin { user_name } => {
                write!(f, "Changing admin rights of {}", user_name)
            }
            Operation::SaveEdit { user_name } => write!(f, "Saving {}", user_name),
        }
    }
}

/// Error shown by the table until dismissed or superseded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableError {
    pub operation: Operation,
    pub error: ApiError,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.error.summary())
    }
}

#[derive(Debug, Clone)]
pub struct UserTable {
    users: UserList,
    edit: EditBuffer,
    spinner: Spinner,
    refresh_requested: bool,
    last_error: Option<TableError>,
}

impl Default for UserTable {
    fn default() -> Self {
        Self::new()
    }
}

impl UserTable {
    /// Empty table with a refresh already requested, so the first effect pass
    /// loads the list.
    pub fn new() -> Self {
        Self {
            users: UserList::new(),
            edit: EditBuffer::new(),
            spinner: Spinner::default(),
            refresh_requested: true,
            last_error: None,
        }
    }

    pub fn with_spinner(mut self, spinner: Spinner) -> Self {
        self.spinner = spinner;
        self
    }

    pub fn users(&self) -> &UserList {
        &self.users
    }

    pub fn edit(&self) -> &EditBuffer {
        &self.edit
    }

    pub fn last_error(&self) -> Option<&TableError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    // ---- refresh ----

    /// Apply the outcome of `GET /user`
    pub fn apply_users(&mut self, result: ApiResult<Vec<User>>) {
        match result {
            Ok(records) => {
                let mut users = UserList::from_records(records);
                let open = self.edit.user_name().map(str::to_string);
                if let Some(name) = open {
                    if let Some(shown) = self.edit.rebase(users.get(&name)) {
                        users.replace(&name, shown);
                    }
                }
                tracing::debug!(count = users.len(), "User list refreshed");
                self.users = users;

                if matches!(
                    self.last_error,
                    Some(TableError { operation: Operation::LoadUsers, .. })
                ) {
                    self.last_error = None;
                }
            }
            Err(error) => {
                tracing::warn!("Failed to load users: {}", error);
                self.record_error(Operation::LoadUsers, error);
            }
        }
    }

    pub fn schedule_refresh(&mut self) {
        self.refresh_requested = true;
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh_requested
    }

    /// Consume the refresh trigger
    pub fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    // ---- admin toggle ----

    /// Payload for toggling the admin flag of `user_name`. The displayed row
    /// keeps its old value until the next refresh.
    pub fn toggle_admin(&self, user_name: &str) -> Option<User> {
        self.users.get(user_name).map(User::with_admin_toggled)
    }

    pub fn finish_toggle(&mut self, user_name: &str, result: ApiResult<()>) {
        if let Err(error) = result {
            tracing::warn!("Failed to toggle admin for {}: {}", user_name, error);
            self.record_error(
                Operation::ToggleAdmin { user_name: user_name.to_string() },
                error,
            );
        }
        self.schedule_refresh();
    }

    // ---- inline edit ----

    /// Open the edit buffer on a row (input focus)
    pub fn begin_edit(&mut self, user_name: &str) -> bool {
        match self.users.get(user_name) {
            Some(user) => {
                self.edit.open(user);
                true
            }
            None => false,
        }
    }

    /// Apply a keystroke to the open edit and show it in the list at once
    pub fn change_field(&mut self, field: UserField) -> bool {
        match self.edit.change(field) {
            Some(snapshot) => {
                let snapshot = snapshot.clone();
                let key = snapshot.user_name.clone();
                self.users.replace(&key, snapshot);
                true
            }
            None => false,
        }
    }

    /// Snapshot to send on blur, if the row changed since its last save
    pub fn commit_edit(&mut self) -> Option<CommitTicket> {
        self.edit.commit()
    }

    /// Enter saves without waiting for blur
    pub fn on_key_down(&mut self, key: &str) -> Option<CommitTicket> {
        if key == ENTER_KEY {
            self.commit_edit()
        } else {
            None
        }
    }

    pub fn finish_commit(&mut self, ticket: &CommitTicket, result: ApiResult<()>) {
        let succeeded = result.is_ok();
        if let Some(rollback) = self.edit.finish(ticket, succeeded) {
            let key = rollback.user_name.clone();
            self.users.replace(&key, rollback);
        }

        if let Err(error) = result {
            tracing::warn!("Failed to save {}: {}", ticket.user_name(), error);
            self.record_error(
                Operation::SaveEdit { user_name: ticket.user_name().to_string() },
                error,
            );
        }
        self.schedule_refresh();
    }

    // ---- spinner ----

    pub fn spinner_visible(&self) -> bool {
        self.spinner.is_visible()
    }

    pub fn call_started(&mut self) -> Option<TimerCommand> {
        self.spinner.acquire()
    }

    pub fn call_finished(&mut self) -> Option<TimerCommand> {
        self.spinner.release()
    }

    pub fn spinner_hide_elapsed(&mut self) -> bool {
        self.spinner.hide_elapsed()
    }

    fn record_error(&mut self, operation: Operation, error: ApiError) {
        self.last_error = Some(TableError { operation, error });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> UserTable {
        let mut table = UserTable::new();
        assert!(table.take_refresh());
        table.apply_users(Ok(vec![
            User::new("alice").bookings(3).coupons(2),
            User::new("bob").coupons(1),
        ]));
        table
    }

    #[test]
    fn test_initial_refresh_requested() {
        let mut table = UserTable::new();
        assert!(table.refresh_pending());
        assert!(table.take_refresh());
        assert!(!table.take_refresh());
    }

    #[test]
    fn test_failed_load_keeps_list() {
        let mut table = loaded();
        table.apply_users(Err(ApiError::Network("connection refused".to_string())));

        assert_eq!(table.users().len(), 2);
        let error = table.last_error().unwrap();
        assert_eq!(error.operation, Operation::LoadUsers);
        assert_eq!(error.to_string(), "Loading users failed: Server not reachable");

        table.apply_users(Ok(vec![User::new("alice")]));
        assert!(table.last_error().is_none());
    }

    #[test]
    fn test_edit_then_blur_scenario() {
        let mut table = loaded();
        assert!(table.begin_edit("alice"));
        assert!(table.change_field(UserField::Coupons(5)));

        // Optimistic write
        assert_eq!(table.users().get("alice").map(|u| u.coupons), Some(5));

        let ticket = table.commit_edit().unwrap();
        assert_eq!(
            ticket.payload(),
            &User::new("alice").bookings(3).coupons(5)
        );

        table.finish_commit(&ticket, Ok(()));
        assert!(!table.edit().is_touched());
        assert!(table.take_refresh());
        assert!(table.commit_edit().is_none());
    }

    #[test]
    fn test_failed_commit_rolls_back_row() {
        let mut table = loaded();
        table.begin_edit("alice");
        table.change_field(UserField::Coupons(40));
        let ticket = table.commit_edit().unwrap();

        table.finish_commit(
            &ticket,
            Err(ApiError::Server { status: 400, message: String::new() }),
        );

        assert_eq!(table.users().get("alice").map(|u| u.coupons), Some(2));
        assert!(!table.edit().is_touched());
        assert!(table.refresh_pending());
        assert_eq!(
            table.last_error().map(|e| e.operation.clone()),
            Some(Operation::SaveEdit { user_name: "alice".to_string() })
        );
    }

    #[test]
    fn test_stale_failure_leaves_active_edit_visible() {
        let mut table = loaded();
        table.begin_edit("alice");
        table.change_field(UserField::Coupons(5));
        let ticket = table.commit_edit().unwrap();

        // Focus moves to bob and back before the save fails
        table.begin_edit("bob");
        table.begin_edit("alice");
        table.change_field(UserField::Coupons(7));

        table.finish_commit(&ticket, Err(ApiError::Network("timeout".to_string())));

        let shown = table.users().get("alice").map(|u| u.coupons);
        let buffered = table.edit().snapshot().map(|u| u.coupons);
        assert_eq!(shown, Some(7));
        assert_eq!(shown, buffered);
        assert!(table.edit().is_touched());
        assert_eq!(table.commit_edit().map(|t| t.payload().coupons), Some(7));
    }

    #[test]
    fn test_enter_commits_other_keys_do_not() {
        let mut table = loaded();
        table.begin_edit("bob");
        table.change_field(UserField::Coupons(3));

        assert!(table.on_key_down("Tab").is_none());
        assert!(table.on_key_down("3").is_none());
        let ticket = table.on_key_down(ENTER_KEY).unwrap();
        assert_eq!(ticket.user_name(), "bob");
    }

    #[test]
    fn test_toggle_is_not_optimistic() {
        let mut table = loaded();
        let payload = table.toggle_admin("bob").unwrap();
        assert!(payload.is_admin);
        assert_eq!(payload.coupons, 1);
        assert!(!table.users().get("bob").unwrap().is_admin);
        assert!(table.toggle_admin("nobody").is_none());

        table.finish_toggle("bob", Err(ApiError::Network("timeout".to_string())));
        assert!(table.refresh_pending());
        assert!(table.last_error().is_some());
    }

    #[test]
    fn test_refresh_keeps_pending_edit_visible() {
        let mut table = loaded();
        table.begin_edit("alice");
        table.change_field(UserField::Coupons(5));

        table.apply_users(Ok(vec![User::new("alice").bookings(4).coupons(2)]));
        let alice = table.users().get("alice").unwrap();
        assert_eq!(alice.coupons, 5);
        assert_eq!(alice.total_bookings, 4);
        assert!(table.edit().is_touched());
    }

    #[test]
    fn test_change_without_open_edit_is_ignored() {
        let mut table = loaded();
        assert!(!table.change_field(UserField::Coupons(5)));
        assert!(!table.begin_edit("nobody"));
        assert_eq!(table.users().get("alice").map(|u| u.coupons), Some(2));
    }
}

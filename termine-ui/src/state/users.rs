//! User Table Runtime
//!
//! Runs the shared [`UserTable`] state machine in the browser: a reactive
//! signal holds the table, an effect reloads the list whenever the refresh
//! trigger is set, an owned `Interval` polls independently of that trigger and
//! an owned `Timeout` hides the spinner. Both timers are dropped, and so
//! cancelled, when the page is cleaned up. Responses that arrive after that
//! find the signal disposed and are discarded.

use gloo_timers::callback::{Interval, Timeout};
use leptos::*;
use std::time::Duration;

use termine_admin::{
    ApiResult, CommitTicket, NewUser, TimerCommand, UserField, UserTable, POLL_INTERVAL,
};

use super::global::GlobalState;
use crate::api::AdminApi;

/// Reactive handle on the user table of the Manage Users page
#[derive(Clone, Copy)]
pub struct UserTableState {
    pub table: RwSignal<UserTable>,
    api: StoredValue<AdminApi>,
    global: GlobalState,
    poll: StoredValue<Option<Interval>>,
    spinner_timer: StoredValue<Option<Timeout>>,
}

/// Keeps the spinner counter raised while one request is outstanding
struct CallGuard {
    state: UserTableState,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        if let Some(command) = self.state.table.try_update(UserTable::call_finished) {
            self.state.apply_timer(command);
        }
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

impl UserTableState {
    /// Create the table, start polling and request the first load.
    ///
    /// Must be called inside the component that owns the table.
    pub fn new(api: AdminApi, global: GlobalState) -> Self {
        let state = Self {
            table: create_rw_signal(UserTable::new()),
            api: store_value(api),
            global,
            poll: store_value(None),
            spinner_timer: store_value(None),
        };

        let refresh_pending = create_memo(move |_| state.table.with(UserTable::refresh_pending));
        create_effect(move |_| {
            if refresh_pending.get() {
                let pending = state.table.try_update(UserTable::take_refresh);
                if pending == Some(true) {
                    state.load_users();
                }
            }
        });

        let poll = Interval::new(millis(POLL_INTERVAL), move || state.load_users());
        state.poll.set_value(Some(poll));

        on_cleanup(move || {
            state.poll.try_update_value(|poll| *poll = None);
            state.spinner_timer.try_update_value(|timer| *timer = None);
            web_sys::console::log_1(&"User table timers stopped".into());
        });

        state
    }

    fn track(self) -> Option<CallGuard> {
        let command = self.table.try_update(UserTable::call_started)?;
        self.apply_timer(command);
        Some(CallGuard { state: self })
    }

    fn apply_timer(self, command: Option<TimerCommand>) {
        let Some(command) = command else {
            return;
        };

        let table = self.table;
        let timer = match command {
            TimerCommand::Arm(delay) => Some(Timeout::new(millis(delay), move || {
                table.try_update(UserTable::spinner_hide_elapsed);
            })),
            TimerCommand::Cancel => None,
        };
        // Replacing the slot drops the previous timeout, which clears it
        self.spinner_timer.try_update_value(|slot| *slot = timer);
    }

    /// Show the table's current error as a notice
    fn surface_error(self) {
        let message = self
            .table
            .try_with_untracked(|table| table.last_error().map(ToString::to_string))
            .flatten();
        if let Some(message) = message {
            self.global.show_error(&message);
        }
    }

    pub fn load_users(self) {
        let Some(api) = self.api.try_get_value() else {
            return;
        };
        let Some(guard) = self.track() else {
            return;
        };

        spawn_local(async move {
            let result = api.fetch_users().await;
            drop(guard);
            self.table.try_update(|table| table.apply_users(result));
        });
    }

    /// Refresh icon click
    pub fn refresh(self) {
        self.table.update(UserTable::schedule_refresh);
    }

    pub fn dismiss_error(self) {
        self.table.update(UserTable::dismiss_error);
    }

    /// Admin checkbox click. The row flips once the refresh lands.
    pub fn toggle_admin(self, user_name: String) {
        let Some(payload) = self.table.with_untracked(|table| table.toggle_admin(&user_name)) else {
            return;
        };
        let api = self.api.get_value();
        let Some(guard) = self.track() else {
            return;
        };

        spawn_local(async move {
            let result = api.patch_user(&payload).await;
            drop(guard);
            let failed = result.is_err();
            if self
                .table
                .try_update(|table| table.finish_toggle(&user_name, result))
                .is_some()
                && failed
            {
                self.surface_error();
            }
        });
    }

    /// Coupons input focus
    pub fn begin_edit(self, user_name: &str) {
        self.table.update(|table| {
            table.begin_edit(user_name);
        });
    }

    /// Coupons input change
    pub fn change_coupons(self, value: &str) {
        match UserField::parse(UserField::COUPONS, value) {
            Ok(field) => self.table.update(|table| {
                table.change_field(field);
            }),
            Err(e) => web_sys::console::log_1(&format!("Ignoring input: {}", e).into()),
        }
    }

    /// Coupons input blur
    pub fn commit_edit(self) {
        if let Some(Some(ticket)) = self.table.try_update(UserTable::commit_edit) {
            self.send_commit(ticket);
        }
    }

    pub fn on_key_down(self, key: &str) {
        if let Some(Some(ticket)) = self.table.try_update(|table| table.on_key_down(key)) {
            self.send_commit(ticket);
        }
    }

    fn send_commit(self, ticket: CommitTicket) {
        let api = self.api.get_value();
        let Some(guard) = self.track() else {
            return;
        };

        spawn_local(async move {
            let result = api.patch_user(ticket.payload()).await;
            drop(guard);
            let failed = result.is_err();
            if self
                .table
                .try_update(|table| table.finish_commit(&ticket, result))
                .is_some()
                && failed
            {
                self.surface_error();
            }
        });
    }

    /// Create a user; the list refreshes on success
    pub async fn add_user(self, user: NewUser) -> ApiResult<()> {
        let api = self.api.get_value();
        let _guard = self.track();
        api.add_user(&user).await?;
        self.table.try_update(UserTable::schedule_refresh);
        Ok(())
    }
}

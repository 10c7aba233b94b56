//! User Table Controller
//!
//! Drives a [`UserTable`] on tokio against a [`UserApi`]:
//!
//! - a refresh task reloads the list whenever the refresh trigger is set
//!   (initially, and after every write)
//! - a poll task reloads the list every poll period, independent of the
//!   trigger, so edits never delay the periodic refresh
//! - every network call holds a [`CallGuard`] that keeps the spinner up and
//!   releases it on drop, including when the task is aborted
//! - the spinner-hide timer is a single owned task, aborted before it is
//!   re-armed
//!
//! All timers are aborted by [`UserTableController::shutdown`] (also run on
//! drop). Responses that arrive afterwards are discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::client::UserApi;
use crate::users::{
    ApiError, AppointmentBatch, CommitTicket, FieldError, NewUser, TableError, TimerCommand,
    User, UserField, UserList, UserTable, ValidationError, POLL_INTERVAL,
};

/// Errors returned by controller operations
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("No edit in progress")]
    NoOpenEdit,

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Controller has been shut down")]
    Closed,
}

/// Owns the user table, its timers and the API client
pub struct UserTableController<A: UserApi + 'static> {
    shared: Arc<Shared<A>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

struct Shared<A> {
    api: A,
    table: Mutex<UserTable>,
    refresh: Notify,
    spinner_timer: Mutex<Option<JoinHandle<()>>>,
    /// Number of completed list loads
    loads: watch::Sender<u64>,
    closed: AtomicBool,
}

/// Keeps the spinner counter raised for the lifetime of one network call
struct CallGuard<A: UserApi + 'static> {
    shared: Arc<Shared<A>>,
}

impl<A: UserApi + 'static> Drop for CallGuard<A> {
    fn drop(&mut self) {
        let command = self.shared.table().call_finished();
        self.shared.apply_timer(command);
    }
}

impl<A: UserApi + 'static> Shared<A> {
    fn table(&self) -> MutexGuard<'_, UserTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), ControllerError> {
        if self.is_closed() {
            Err(ControllerError::Closed)
        } else {
            Ok(())
        }
    }

    /// Apply a state change unless the controller has been shut down
    fn apply(&self, f: impl FnOnce(&mut UserTable)) {
        if self.is_closed() {
            tracing::debug!("Discarding response after shutdown");
            return;
        }
        f(&mut self.table());
    }

    fn wake_refresh(&self) {
        if self.table().refresh_pending() {
            self.refresh.notify_one();
        }
    }

    fn track(self: &Arc<Self>) -> CallGuard<A> {
        let command = self.table().call_started();
        self.apply_timer(command);
        CallGuard {
            shared: Arc::clone(self),
        }
    }

    fn apply_timer(self: &Arc<Self>, command: Option<TimerCommand>) {
        let Some(command) = command else {
            return;
        };

        let mut slot = self
            .spinner_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }

        if let TimerCommand::Arm(delay) = command {
            if self.is_closed() {
                return;
            }
            // Guards can be dropped while the runtime itself is shutting down
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                return;
            };
            let shared = Arc::downgrade(self);
            *slot = Some(runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(shared) = shared.upgrade() {
                    if shared.table().spinner_hide_elapsed() {
                        tracing::trace!("Spinner hidden");
                    }
                }
            }));
        }
    }

    async fn load_users(self: &Arc<Self>) {
        if self.is_closed() {
            return;
        }
        let _guard = self.track();
        let result = self.api.fetch_users().await;
        self.apply(|table| table.apply_users(result));
        if !self.is_closed() {
            self.loads.send_modify(|n| *n += 1);
        }
    }

    async fn send_commit(self: &Arc<Self>, ticket: CommitTicket) -> Result<(), ControllerError> {
        tracing::info!(
            user = ticket.user_name(),
            coupons = ticket.payload().coupons,
            "Saving user"
        );
        let result = {
            let _guard = self.track();
            self.api.patch_user(ticket.payload()).await
        };
        self.apply(|table| table.finish_commit(&ticket, result.clone()));
        self.wake_refresh();
        result.map_err(ControllerError::from)
    }
}

impl<A: UserApi + 'static> UserTableController<A> {
    /// Create the controller and start its refresh and poll tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(api: A) -> Self {
        Self::with_poll_interval(api, POLL_INTERVAL)
    }

    pub fn with_poll_interval(api: A, poll_interval: Duration) -> Self {
        let shared = Arc::new(Shared {
            api,
            table: Mutex::new(UserTable::new()),
            refresh: Notify::new(),
            spinner_timer: Mutex::new(None),
            loads: watch::channel(0).0,
            closed: AtomicBool::new(false),
        });

        let tasks = vec![
            spawn_refresh(Arc::clone(&shared)),
            spawn_poll(Arc::clone(&shared), poll_interval),
        ];

        Self {
            shared,
            tasks: Mutex::new(tasks),
        }
    }

    pub fn api(&self) -> &A {
        &self.shared.api
    }

    /// Fetch the user list now
    pub async fn load_users(&self) {
        self.shared.load_users().await;
    }

    /// Wait until at least one list load has completed, successfully or not
    pub async fn first_load(&self) {
        let mut loads = self.shared.loads.subscribe();
        // The sender lives as long as `self`
        let _ = loads.wait_for(|n| *n > 0).await;
    }

    /// Ask the refresh task to reload the list
    pub fn schedule_refresh(&self) {
        self.shared.apply(UserTable::schedule_refresh);
        self.shared.wake_refresh();
    }

    /// Flip the admin flag of `user_name` on the server
    pub async fn toggle_admin(&self, user_name: &str) -> Result<(), ControllerError> {
        self.shared.ensure_open()?;
        let payload = self
            .shared
            .table()
            .toggle_admin(user_name)
            .ok_or_else(|| ControllerError::UnknownUser(user_name.to_string()))?;

        tracing::info!(user = user_name, is_admin = payload.is_admin, "Toggling admin");
        let result = {
            let _guard = self.shared.track();
            self.shared.api.patch_user(&payload).await
        };
        self.shared
            .apply(|table| table.finish_toggle(user_name, result.clone()));
        self.shared.wake_refresh();
        result.map_err(ControllerError::from)
    }

    /// Open the edit buffer on a row
    pub fn begin_edit(&self, user_name: &str) -> Result<(), ControllerError> {
        self.shared.ensure_open()?;
        if self.shared.table().begin_edit(user_name) {
            Ok(())
        } else {
            Err(ControllerError::UnknownUser(user_name.to_string()))
        }
    }

    pub fn change_field(&self, field: UserField) -> Result<(), ControllerError> {
        self.shared.ensure_open()?;
        if self.shared.table().change_field(field) {
            Ok(())
        } else {
            Err(ControllerError::NoOpenEdit)
        }
    }

    /// Apply a raw `(field id, value)` edit as an input element reports it
    pub fn change_input(&self, field_id: &str, value: &str) -> Result<(), ControllerError> {
        let field = UserField::parse(field_id, value)?;
        self.change_field(field)
    }

    /// Save the open edit if it changed. Returns whether a request was sent.
    pub async fn commit_edit(&self) -> Result<bool, ControllerError> {
        self.shared.ensure_open()?;
        let ticket = self.shared.table().commit_edit();
        match ticket {
            Some(ticket) => self.shared.send_commit(ticket).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Key handler for the edit input; Enter saves immediately
    pub async fn on_key_down(&self, key: &str) -> Result<bool, ControllerError> {
        self.shared.ensure_open()?;
        let ticket = self.shared.table().on_key_down(key);
        match ticket {
            Some(ticket) => self.shared.send_commit(ticket).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Create a user and refresh the list on success
    pub async fn add_user(&self, user: &NewUser) -> Result<(), ControllerError> {
        self.shared.ensure_open()?;
        user.validate()?;

        tracing::info!(user = %user.new_user_name, "Adding user");
        {
            let _guard = self.shared.track();
            self.shared.api.add_user(user).await?;
        }
        self.schedule_refresh();
        Ok(())
    }

    /// Create a day of appointment slots
    pub async fn add_appointments(&self, batch: &AppointmentBatch) -> Result<(), ControllerError> {
        self.shared.ensure_open()?;
        batch.validate()?;

        let date = format!("{}-{:02}-{:02}", batch.year, batch.month, batch.day);
        tracing::info!(
            %date,
            slots = batch.num_slots,
            per_slot = batch.num_appointment_per_slot,
            "Adding appointments"
        );
        let _guard = self.shared.track();
        self.shared.api.add_appointments(batch).await?;
        Ok(())
    }

    pub fn users(&self) -> UserList {
        self.shared.table().users().clone()
    }

    pub fn user(&self, user_name: &str) -> Option<User> {
        self.shared.table().users().get(user_name).cloned()
    }

    /// Copy of the full table state for rendering
    pub fn snapshot(&self) -> UserTable {
        self.shared.table().clone()
    }

    pub fn spinner_visible(&self) -> bool {
        self.shared.table().spinner_visible()
    }

    pub fn last_error(&self) -> Option<TableError> {
        self.shared.table().last_error().cloned()
    }

    pub fn dismiss_error(&self) {
        self.shared.table().dismiss_error();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Stop polling and cancel all timers
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
        if let Some(timer) = self
            .shared
            .spinner_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }

        tracing::debug!("User table controller shut down");
    }
}

impl<A: UserApi + 'static> Drop for UserTableController<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_refresh<A: UserApi + 'static>(shared: Arc<Shared<A>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let pending = shared.table().take_refresh();
            if pending {
                shared.load_users().await;
            } else {
                shared.refresh.notified().await;
            }
        }
    })
}

fn spawn_poll<A: UserApi + 'static>(shared: Arc<Shared<A>>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            tracing::debug!("Polling user list");
            shared.load_users().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{ApiResult, Operation, SPINNER_MIN_VISIBLE};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct MockApi {
        users: Mutex<Vec<User>>,
        patches: Mutex<Vec<User>>,
        fetches: AtomicUsize,
        fail_patches: AtomicBool,
        delay: Duration,
    }

    impl MockApi {
        fn with_users(users: Vec<User>) -> Self {
            Self {
                users: Mutex::new(users),
                ..Self::default()
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn patches(&self) -> Vec<User> {
            self.patches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserApi for MockApi {
        async fn fetch_users(&self) -> ApiResult<Vec<User>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.users.lock().unwrap().clone())
        }

        async fn patch_user(&self, user: &User) -> ApiResult<()> {
            self.patches.lock().unwrap().push(user.clone());
            tokio::time::sleep(self.delay).await;
            if self.fail_patches.load(Ordering::SeqCst) {
                return Err(ApiError::Server {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let mut users = self.users.lock().unwrap();
            if let Some(stored) = users.iter_mut().find(|u| u.user_name == user.user_name) {
                *stored = user.clone();
            }
            Ok(())
        }

        async fn add_user(&self, user: &NewUser) -> ApiResult<()> {
            self.users
                .lock()
                .unwrap()
                .push(User::new(user.new_user_name.clone()).coupons(10));
            Ok(())
        }

        async fn add_appointments(&self, _batch: &AppointmentBatch) -> ApiResult<()> {
            Ok(())
        }

        async fn increment_coupons(&self, _user_name: &str, _increment: i64) -> ApiResult<()> {
            Ok(())
        }

        async fn health(&self) -> ApiResult<()> {
            Ok(())
        }
    }

    fn alice() -> User {
        User::new("alice").bookings(3).coupons(2)
    }

    fn bob() -> User {
        User::new("bob").bookings(1).coupons(4)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_then_poll_until_shutdown() {
        let controller = UserTableController::new(MockApi::with_users(vec![alice()]));
        settle().await;

        assert_eq!(controller.api().fetches(), 1);
        assert_eq!(controller.user("alice"), Some(alice()));

        tokio::time::sleep(POLL_INTERVAL).await;
        assert_eq!(controller.api().fetches(), 2);

        tokio::time::sleep(POLL_INTERVAL).await;
        assert_eq!(controller.api().fetches(), 3);

        controller.shutdown();
        tokio::time::sleep(POLL_INTERVAL * 3).await;
        assert_eq!(controller.api().fetches(), 3);
        assert!(controller.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_load_waits_for_fetch() {
        let api = MockApi::with_users(vec![alice(), bob()]).delayed(Duration::from_millis(500));
        let controller = UserTableController::new(api);
        assert!(controller.users().is_empty());

        controller.first_load().await;
        assert_eq!(controller.users().len(), 2);
        assert_eq!(controller.api().fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggered_refresh_does_not_reset_poll() {
        let controller = UserTableController::new(MockApi::with_users(vec![alice()]));
        settle().await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        controller.schedule_refresh();
        settle().await;
        assert_eq!(controller.api().fetches(), 2);

        // The poll still fires 60s after start, not 60s after the refresh
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(controller.api().fetches(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spinner_stays_visible_for_minimum_dwell() {
        let delay = Duration::from_millis(100);
        let controller =
            UserTableController::new(MockApi::with_users(vec![alice()]).delayed(delay));

        settle().await;
        assert!(controller.spinner_visible());

        // Fetch finished at 100ms; hide fires 1250ms later
        tokio::time::sleep(delay + SPINNER_MIN_VISIBLE - Duration::from_millis(60)).await;
        assert_eq!(controller.user("alice"), Some(alice()));
        assert!(controller.spinner_visible());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!controller.spinner_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_untouched_commit_sends_nothing() {
        let controller = UserTableController::new(MockApi::with_users(vec![alice()]));
        settle().await;

        controller.begin_edit("alice").unwrap();
        assert!(!controller.commit_edit().await.unwrap());
        assert!(!controller.on_key_down("Enter").await.unwrap());
        assert!(controller.api().patches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_coupons_then_blur() {
        let controller = UserTableController::new(MockApi::with_users(vec![alice()]));
        settle().await;

        controller.begin_edit("alice").unwrap();
        controller.change_input("coupons", "5").unwrap();
        assert_eq!(controller.user("alice").map(|u| u.coupons), Some(5));

        assert!(controller.commit_edit().await.unwrap());
        assert_eq!(
            controller.api().patches(),
            vec![User::new("alice").bookings(3).coupons(5)]
        );
        assert!(!controller.snapshot().edit().is_touched());

        // Blur after the save changes nothing
        assert!(!controller.commit_edit().await.unwrap());
        assert_eq!(controller.api().patches().len(), 1);

        settle().await;
        assert_eq!(controller.api().fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_saves_without_blur() {
        let controller = UserTableController::new(MockApi::with_users(vec![alice()]));
        settle().await;

        controller.begin_edit("alice").unwrap();
        controller.change_field(UserField::Coupons(7)).unwrap();
        assert!(!controller.on_key_down("7").await.unwrap());
        assert!(controller.on_key_down("Enter").await.unwrap());
        assert_eq!(controller.api().patches()[0].coupons, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_during_inflight_edit_keeps_payloads_apart() {
        let api = MockApi::with_users(vec![alice(), bob()]).delayed(Duration::from_millis(200));
        let controller = UserTableController::new(api);
        tokio::time::sleep(Duration::from_millis(300)).await;

        controller.begin_edit("alice").unwrap();
        controller.change_input("coupons", "5").unwrap();

        let (commit, toggle) =
            tokio::join!(controller.commit_edit(), controller.toggle_admin("bob"));
        assert!(commit.unwrap());
        toggle.unwrap();

        let patches = controller.api().patches();
        assert_eq!(patches.len(), 2);
        let alice_patch = patches.iter().find(|u| u.user_name == "alice").unwrap();
        let bob_patch = patches.iter().find(|u| u.user_name == "bob").unwrap();
        assert_eq!(alice_patch, &User::new("alice").bookings(3).coupons(5));
        assert_eq!(bob_patch, &bob().admin(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_admin_is_not_optimistic() {
        let api = MockApi::with_users(vec![bob()]).delayed(Duration::from_millis(50));
        let controller = UserTableController::new(api);
        tokio::time::sleep(Duration::from_millis(100)).await;

        controller.toggle_admin("bob").await.unwrap();
        // Row shows the old value until the refresh lands
        assert!(!controller.user("bob").unwrap().is_admin);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(controller.user("bob").unwrap().is_admin);

        assert!(matches!(
            controller.toggle_admin("nobody").await,
            Err(ControllerError::UnknownUser(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_commit_rolls_back_and_surfaces_error() {
        let api = MockApi::with_users(vec![alice()]);
        api.fail_patches.store(true, Ordering::SeqCst);
        let controller = UserTableController::new(api);
        settle().await;

        controller.begin_edit("alice").unwrap();
        controller.change_input("coupons", "40").unwrap();

        let err = controller.commit_edit().await.unwrap_err();
        assert!(matches!(err, ControllerError::Api(ApiError::Server { status: 500, .. })));
        assert_eq!(controller.user("alice"), Some(alice()));

        let error = controller.last_error().unwrap();
        assert_eq!(
            error.operation,
            Operation::SaveEdit { user_name: "alice".to_string() }
        );

        // The write still triggers a reconciling refresh
        settle().await;
        assert_eq!(controller.api().fetches(), 2);

        controller.dismiss_error();
        assert!(controller.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_user_validates_and_refreshes() {
        let controller = UserTableController::new(MockApi::with_users(vec![alice()]));
        settle().await;

        let mismatch = NewUser {
            new_user_password_confirm: "nope".to_string(),
            ..NewUser::new("carol", "secret")
        };
        assert!(matches!(
            controller.add_user(&mismatch).await,
            Err(ControllerError::Validation(ValidationError::PasswordMismatch))
        ));

        controller.add_user(&NewUser::new("carol", "secret")).await.unwrap();
        settle().await;
        assert_eq!(controller.user("carol").map(|u| u.coupons), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_operations_after_shutdown() {
        let controller = UserTableController::new(MockApi::with_users(vec![alice()]));
        settle().await;
        controller.shutdown();

        assert!(matches!(
            controller.begin_edit("alice"),
            Err(ControllerError::Closed)
        ));
        controller.load_users().await;
        assert_eq!(controller.api().fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_after_shutdown_is_discarded() {
        let api = MockApi::with_users(vec![alice()]).delayed(Duration::from_millis(500));
        api.fail_patches.store(true, Ordering::SeqCst);
        let controller = UserTableController::new(api);
        controller.first_load().await;

        controller.begin_edit("alice").unwrap();
        controller.change_input("coupons", "40").unwrap();

        let (commit, ()) = tokio::join!(controller.commit_edit(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.shutdown();
        });
        assert!(commit.is_err());

        // Neither the rollback nor the error of the failed save is applied
        assert_eq!(controller.user("alice").map(|u| u.coupons), Some(40));
        assert!(controller.last_error().is_none());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(controller.api().fetches(), 1);
        assert_eq!(controller.api().patches().len(), 1);
        assert!(!controller.snapshot().refresh_pending());
    }
}

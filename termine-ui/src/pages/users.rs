//! Manage Users Page
//!
//! Add users and edit admin rights and coupons inline.

use leptos::*;

use crate::api::AdminApi;
use crate::components::{AddUser, ErrorBanner, InlineLoading, UserTable};
use crate::config::AdminConfig;
use crate::state::{GlobalState, UserTableState};

#[component]
pub fn ManageUsers(config: AdminConfig) -> impl IntoView {
    let global = use_context::<GlobalState>().expect("GlobalState not found");
    let state = UserTableState::new(AdminApi::new(config.api_base_url), global);

    let table = state.table;
    let error = Signal::derive(move || table.with(|t| t.last_error().map(ToString::to_string)));
    let count = move || table.with(|t| t.users().len());

    view! {
        <div class="space-y-8">
            <div class="flex items-center justify-between">
                <div>
                    <h1 class="text-3xl font-bold">{config.instance_name}</h1>
                    <p class="text-gray-400 mt-1">
                        {move || format!("{} users", count())}
                    </p>
                </div>
                {move || table.with(|t| t.spinner_visible()).then(|| view! { <InlineLoading /> })}
            </div>

            <AddUser state=state />

            <ErrorBanner message=error on_dismiss=move || state.dismiss_error() />

            <UserTable state=state />
        </div>
    }
}

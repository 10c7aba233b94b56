//! User Table Component
//!
//! One row per user with the admin checkbox and the inline coupons editor.

use leptos::*;

use termine_admin::User;

use crate::state::UserTableState;

/// User table with the refresh icon in the header
#[component]
pub fn UserTable(state: UserTableState) -> impl IntoView {
    let table = state.table;
    let spinner_visible = create_memo(move |_| table.with(|t| t.spinner_visible()));
    let users = create_memo(move |_| table.with(|t| t.users().to_vec()));

    view! {
        <div class="bg-gray-800 rounded-xl overflow-hidden">
            <table class="w-full text-left">
                <thead class="bg-gray-700 text-gray-300 text-sm">
                    <tr>
                        <th class="px-4 py-3">"Username"</th>
                        <th class="px-4 py-3">"Administrator"</th>
                        <th class="px-4 py-3">"Termine gebucht (total)"</th>
                        <th class="px-4 py-3">
                            <div class="flex items-center justify-between">
                                <span>"Verfügbare Termine"</span>
                                <RefreshIcon spinning=spinner_visible on_click=move || state.refresh() />
                            </div>
                        </th>
                    </tr>
                </thead>
                <tbody>
                    <For
                        each=move || users.get()
                        key=|user| user.user_name.clone()
                        children=move |user| view! { <UserRow user=user.user_name state=state /> }
                    />
                </tbody>
            </table>

            {move || {
                if users.with(Vec::is_empty) {
                    view! {
                        <p class="text-center text-gray-400 py-8">"No users loaded"</p>
                    }.into_view()
                } else {
                    view! {}.into_view()
                }
            }}
        </div>
    }
}

/// Row keyed by user name; cells read the current record from the table
#[component]
fn UserRow(user: String, state: UserTableState) -> impl IntoView {
    let table = state.table;
    let name = user.clone();
    let record = create_memo(move |_| table.with(|t| t.users().get(&name).cloned()));

    let toggle_name = user.clone();
    let focus_name = user.clone();

    view! {
        <tr class="border-t border-gray-700 text-lg">
            <td class="px-4 py-3">{user}</td>
            <td class="px-4 py-3">
                <input
                    id="is_admin"
                    type="checkbox"
                    prop:checked=move || record.with(|u| u.as_ref().is_some_and(|u| u.is_admin))
                    on:change=move |_| state.toggle_admin(toggle_name.clone())
                    class="w-5 h-5"
                />
            </td>
            <td class="px-4 py-3">{cell(record, |u| u.total_bookings.to_string())}</td>
            <td class="px-4 py-3">
                <input
                    id="coupons"
                    type="number"
                    min="0"
                    prop:value=cell(record, |u| u.coupons.to_string())
                    on:focus=move |_| state.begin_edit(&focus_name)
                    on:input=move |ev| state.change_coupons(&event_target_value(&ev))
                    on:blur=move |_| state.commit_edit()
                    on:keydown=move |ev| state.on_key_down(&ev.key())
                    class="w-24 bg-gray-700 rounded-lg px-3 py-1
                           border border-gray-600 focus:border-primary-500 focus:outline-none"
                />
            </td>
        </tr>
    }
}

/// Text of one cell, empty once the row is gone
fn cell(record: Memo<Option<User>>, text: fn(&User) -> String) -> impl Fn() -> String + Copy {
    move || record.with(|u| u.as_ref().map(text).unwrap_or_default())
}

/// Refresh icon, animated while requests are running
#[component]
fn RefreshIcon(
    #[prop(into)]
    spinning: Signal<bool>,
    on_click: impl Fn() + 'static,
) -> impl IntoView {
    view! {
        <button
            on:click=move |_| on_click()
            title="Refresh"
            class=move || refresh_icon_class(spinning.get())
        >
            "⟳"
        </button>
    }
}

fn refresh_icon_class(spinning: bool) -> &'static str {
    if spinning {
        "text-xl text-primary-400 animate-spin"
    } else {
        "text-xl text-gray-400 hover:text-white"
    }
}

//! Add User Component
//!
//! Form for creating a back-office user.

use leptos::*;

use termine_admin::NewUser;

use crate::state::{GlobalState, UserTableState};

#[component]
pub fn AddUser(state: UserTableState) -> impl IntoView {
    let global = use_context::<GlobalState>().expect("GlobalState not found");

    let (name, set_name) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (confirm, set_confirm) = create_signal(String::new());
    let (submitting, set_submitting) = create_signal(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let user = NewUser {
            new_user_name: name.get().trim().to_string(),
            new_user_password: password.get(),
            new_user_password_confirm: confirm.get(),
        };
        if let Err(e) = user.validate() {
            global.show_error(&e.to_string());
            return;
        }

        set_submitting.set(true);
        spawn_local(async move {
            let created = user.new_user_name.clone();
            match state.add_user(user).await {
                Ok(()) => {
                    global.show_success(&format!("User {} created", created));
                    set_name.set(String::new());
                    set_password.set(String::new());
                    set_confirm.set(String::new());
                }
                Err(e) => global.show_api_error("Creating user", &e),
            }
            set_submitting.set(false);
        });
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6">
            <h2 class="text-xl font-semibold mb-4">"Add User"</h2>

            <form on:submit=on_submit class="grid md:grid-cols-4 gap-4 items-end">
                <TextField label="Username" kind="text" value=name set_value=set_name />
                <TextField label="Password" kind="password" value=password set_value=set_password />
                <TextField label="Confirm password" kind="password" value=confirm set_value=set_confirm />

                <button
                    type="submit"
                    disabled=move || submitting.get()
                    class="px-4 py-3 bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600
                           rounded-lg font-medium transition-colors"
                >
                    {move || if submitting.get() { "Creating..." } else { "Create" }}
                </button>
            </form>
        </section>
    }
}

#[component]
fn TextField(
    label: &'static str,
    kind: &'static str,
    value: ReadSignal<String>,
    set_value: WriteSignal<String>,
) -> impl IntoView {
    view! {
        <div>
            <label class="block text-sm text-gray-400 mb-2">{label}</label>
            <input
                type=kind
                prop:value=move || value.get()
                on:input=move |ev| set_value.set(event_target_value(&ev))
                class="w-full bg-gray-700 rounded-lg px-4 py-3
                       border border-gray-600 focus:border-primary-500 focus:outline-none"
            />
        </div>
    }
}

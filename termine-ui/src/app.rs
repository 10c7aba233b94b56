//! App Root Component
//!
//! Main application component with routing and global providers.

use leptos::*;
use leptos_router::*;

use crate::components::{Nav, Notices};
use crate::config::AdminConfig;
use crate::pages::{ManageAppointments, ManageUsers};
use crate::state::provide_global_state;

/// Root application component
#[component]
pub fn App(config: AdminConfig) -> impl IntoView {
    provide_global_state();

    let instance_name = config.instance_name.clone();
    let users_config = config.clone();
    let appointments_config = config.clone();

    view! {
        <Router>
            <div class="min-h-screen bg-gray-900 text-white flex flex-col">
                <Nav instance_name=instance_name />

                <main class="flex-1 container mx-auto px-4 py-8 pb-24">
                    <Routes>
                        <Route path="/" view=|| view! { <Redirect path="/users" /> } />
                        <Route
                            path="/users"
                            view=move || view! { <ManageUsers config=users_config.clone() /> }
                        />
                        <Route
                            path="/appointments"
                            view=move || view! { <ManageAppointments config=appointments_config.clone() /> }
                        />
                        <Route path="/*any" view=NotFound />
                    </Routes>
                </main>

                <Footer api_base_url=config.api_base_url />

                <Notices />
            </div>
        </Router>
    }
}

/// Footer showing which admin API the page talks to
#[component]
fn Footer(api_base_url: String) -> impl IntoView {
    view! {
        <footer class="fixed bottom-0 left-0 right-0 bg-gray-800 border-t border-gray-700 py-3 px-4">
            <div class="container mx-auto flex items-center justify-between text-sm text-gray-400">
                <span>{api_base_url}</span>
                <span>{format!("v{}", env!("CARGO_PKG_VERSION"))}</span>
            </div>
        </footer>
    }
}

/// 404 Not Found page
#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center min-h-[60vh] text-center">
            <div class="text-6xl mb-4">"🔍"</div>
            <h1 class="text-3xl font-bold mb-2">"Page Not Found"</h1>
            <p class="text-gray-400 mb-6">"The page you're looking for doesn't exist."</p>
            <A
                href="/users"
                class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
            >
                "Go to Users"
            </A>
        </div>
    }
}

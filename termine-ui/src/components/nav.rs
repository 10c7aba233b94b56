//! Navigation Component
//!
//! Header navigation bar with the instance name and page links.

use leptos::*;
use leptos_router::*;

/// Page tabs as `(route, label)`
const TABS: [(&str, &str); 2] = [
    ("/users", "Manage Users"),
    ("/appointments", "Manage Appointments"),
];

/// Navigation header component
#[component]
pub fn Nav(#[prop(into)] instance_name: String) -> impl IntoView {
    view! {
        <nav class="bg-gray-800 border-b border-gray-700">
            <div class="container mx-auto px-4">
                <div class="flex items-center justify-between h-16">
                    <A href="/users" class="flex items-center space-x-3">
                        <span class="text-2xl">"📅"</span>
                        <span class="text-xl font-bold text-white">{instance_name}</span>
                    </A>

                    <div class="flex items-center space-x-1">
                        {TABS.iter().map(|&(href, label)| view! { <NavLink href=href label=label /> }).collect_view()}
                    </div>
                </div>
            </div>
        </nav>
    }
}

/// Individual navigation link
#[component]
fn NavLink(
    href: &'static str,
    label: &'static str,
) -> impl IntoView {
    view! {
        <A
            href=href
            class="px-4 py-2 rounded-lg text-gray-300 hover:text-white hover:bg-gray-700 transition-colors"
            active_class="bg-gray-700 text-white"
        >
            {label}
        </A>
    }
}

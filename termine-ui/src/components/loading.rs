//! Loading Component
//!
//! Spinners, the inline error banner and the notices raised by page actions.

use leptos::*;

use crate::state::GlobalState;

/// Inline loading spinner
#[component]
pub fn InlineLoading() -> impl IntoView {
    view! {
        <span class="inline-block loading-spinner w-4 h-4" />
    }
}

/// Dismissible error banner
#[component]
pub fn ErrorBanner(
    #[prop(into)]
    message: Signal<Option<String>>,
    on_dismiss: impl Fn() + 'static,
) -> impl IntoView {
    let on_dismiss = store_value(on_dismiss);

    view! {
        {move || message.get().map(|msg| view! {
            <div class="flex items-center justify-between bg-red-900/60 border border-red-700
                        text-red-100 px-4 py-3 rounded-lg">
                <span class="text-sm">{msg}</span>
                <button
                    on:click=move |_| on_dismiss.with_value(|f| f())
                    class="text-red-300 hover:text-white ml-4"
                >
                    "✕"
                </button>
            </div>
        })}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeKind {
    Saved,
    Failed,
}

impl NoticeKind {
    fn label(self) -> &'static str {
        match self {
            NoticeKind::Saved => "Gespeichert",
            NoticeKind::Failed => "Fehler",
        }
    }

    fn class(self) -> &'static str {
        match self {
            NoticeKind::Saved => "border-green-600 bg-green-900/80 text-green-100",
            NoticeKind::Failed => "border-red-600 bg-red-900/80 text-red-100",
        }
    }
}

/// Success and failure notices of the last page action, stacked above the
/// footer until they time out or are dismissed
#[component]
pub fn Notices() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <div class="fixed bottom-16 left-1/2 -translate-x-1/2 z-50 w-full max-w-xl space-y-2 px-4">
            {move || state.success.get().map(|msg| view! {
                <Notice kind=NoticeKind::Saved message=msg signal=state.success />
            })}
            {move || state.error.get().map(|msg| view! {
                <Notice kind=NoticeKind::Failed message=msg signal=state.error />
            })}
        </div>
    }
}

#[component]
fn Notice(kind: NoticeKind, message: String, signal: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        <div class=format!("flex items-start gap-3 border-l-4 rounded px-4 py-2 shadow {}", kind.class())>
            <strong class="text-xs uppercase tracking-wide pt-0.5">{kind.label()}</strong>
            <span class="flex-1 text-sm">{message}</span>
            <button on:click=move |_| signal.set(None) class="opacity-70 hover:opacity-100">
                "✕"
            </button>
        </div>
    }
}

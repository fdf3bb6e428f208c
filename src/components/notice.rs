//! Notices
//!
//! Blocking browser dialogs for errors and confirmations, plus short-lived
//! toasts for successful actions.

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;

const TOAST_MS: u32 = 3_000;

pub fn alert(message: &str) {
    if let Some(win) = web_sys::window() {
        let _ = win.alert_with_message(message);
    }
}

/// `window.confirm`; false when no window is available
pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|win| win.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// Toast queue shared through context
#[derive(Clone, Copy)]
pub struct Toaster {
    toasts: RwSignal<Vec<(u32, String)>>,
    next_id: StoredValue<u32>,
}

impl Toaster {
    pub fn new() -> Self {
        Self { toasts: RwSignal::new(Vec::new()), next_id: StoredValue::new(0) }
    }

    /// Show `message` for a few seconds
    pub fn notify(&self, message: impl Into<String>) {
        let id = self.next_id.get_value();
        self.next_id.set_value(id + 1);
        self.toasts.update(|t| t.push((id, message.into())));

        let toasts = self.toasts;
        spawn_local(async move {
            TimeoutFuture::new(TOAST_MS).await;
            toasts.try_update(|t| t.retain(|(i, _)| *i != id));
        });
    }
}

pub fn use_toaster() -> Toaster {
    expect_context::<Toaster>()
}

#[component]
pub fn ToastHost() -> impl IntoView {
    let toaster = use_toaster();

    view! {
        <div class="toast-host">
            <For
                each=move || toaster.toasts.get()
                key=|(id, _)| *id
                children=move |(_, message)| view! { <div class="toast">{message}</div> }
            />
        </div>
    }
}

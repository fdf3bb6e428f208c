//! Admin login

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::use_api;
use crate::models::Credentials;
use crate::query::use_query_client;
use crate::routes::{use_router, Route};

#[component]
pub fn LoginPage() -> impl IntoView {
    let api = use_api();
    let router = use_router();
    let query = use_query_client();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let error = RwSignal::new(None::<String>);
    let busy = RwSignal::new(false);

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let credentials = Credentials { email: email.get_untracked().trim().to_string(), password: password.get_untracked() };
        let api = api.clone();
        busy.set(true);
        error.set(None);
        spawn_local(async move {
            let result = api.login(&credentials).await;
            busy.try_set(false);
            match result {
                Ok(_) => {
                    log::info!("[SESSION] signed in as {}", credentials.email);
                    query.clear();
                    router.navigate(Route::Inventory);
                }
                Err(e) => {
                    log::warn!("[SESSION] login failed: {e}");
                    error.try_set(Some(e.to_string()));
                }
            }
        });
    };

    view! {
        <div class="login-page">
            <form class="login-card" on:submit=submit>
                <h1>"Admin Login"</h1>
                {move || error.get().map(|msg| view! { <p class="form-error">{msg}</p> })}
                <label>
                    "Email"
                    <input
                        type="email"
                        autocomplete="username"
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                    />
                </label>
                <label>
                    "Password"
                    <input
                        type="password"
                        autocomplete="current-password"
                        prop:value=move || password.get()
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                    />
                </label>
                <button type="submit" class="primary" disabled=move || busy.get()>
                    {move || if busy.get() { "Signing in..." } else { "Sign In" }}
                </button>
            </form>
        </div>
    }
}

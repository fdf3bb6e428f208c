//! Yarn Rates App
//!
//! Root component: provides the shared services and renders the page for
//! the current route.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::ApiClient;
use crate::components::{AdminShell, ToastHost, Toaster};
use crate::config::AppConfig;
use crate::pages::{BroadcastPage, HomePage, InventoryPage, LoginPage, WhatsAppPage};
use crate::query::QueryClient;
use crate::routes::{Route, Router};

#[component]
pub fn App() -> impl IntoView {
    let config = AppConfig::from_env();
    let api = ApiClient::new(&config);
    let router = Router::install();
    let query = QueryClient::new();

    provide_context(config);
    provide_context(api.clone());
    provide_context(query);
    provide_context(router);
    provide_context(Toaster::new());

    // Check the token with the backend once per session on entering admin
    let verified = StoredValue::new(false);
    Effect::new(move |_| {
        if !router.route().is_admin() || verified.get_value() {
            return;
        }
        verified.set_value(true);
        let api = api.clone();
        spawn_local(async move {
            match api.verify_token().await {
                Ok(resp) => log::debug!("[SESSION] token valid for {}", resp.email),
                Err(e) => {
                    log::info!("[SESSION] token rejected: {e}");
                    verified.set_value(false);
                    query.clear();
                    router.navigate(Route::Login);
                }
            }
        });
    });

    view! {
        {move || match router.route() {
            Route::Home => view! { <HomePage /> }.into_any(),
            Route::Login => view! { <LoginPage /> }.into_any(),
            Route::Inventory => view! { <AdminShell><InventoryPage /></AdminShell> }.into_any(),
            Route::WhatsApp => view! { <AdminShell><WhatsAppPage /></AdminShell> }.into_any(),
            Route::Broadcast => view! { <AdminShell><BroadcastPage /></AdminShell> }.into_any(),
            Route::NotFound => view! {
                <div class="not-found">
                    <h1>"Page not found"</h1>
                    <a href="/" on:click=move |ev| {
                        ev.prevent_default();
                        router.navigate(Route::Home);
                    }>"Back to rates"</a>
                </div>
            }.into_any(),
        }}
        <ToastHost />
    }
}

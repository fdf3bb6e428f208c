//! Admin Shell
//!
//! Sidebar navigation around every admin page.

use leptos::prelude::*;

use crate::api;
use crate::query::use_query_client;
use crate::routes::{use_router, Route};

const NAV: [(Route, &str); 3] = [
    (Route::Inventory, "Inventory"),
    (Route::WhatsApp, "WhatsApp Groups"),
    (Route::Broadcast, "Broadcast"),
];

#[component]
pub fn AdminShell(children: Children) -> impl IntoView {
    let router = use_router();
    let query = use_query_client();

    let logout = move |_| {
        api::logout();
        query.clear();
        router.navigate(Route::Login);
    };

    view! {
        <div class="admin-layout">
            <nav class="admin-sidebar">
                <div class="admin-brand">"Yarn Rates Admin"</div>
                {NAV
                    .into_iter()
                    .map(|(route, label)| {
                        view! {
                            <a
                                href=route.path()
                                class=move || if router.route() == route { "nav-link active" } else { "nav-link" }
                                on:click=move |ev| {
                                    ev.prevent_default();
                                    router.navigate(route);
                                }
                            >
                                {label}
                            </a>
                        }
                    })
                    .collect_view()}
                <button class="nav-link logout-btn" on:click=logout>"Logout"</button>
            </nav>
            <main class="admin-content">{children()}</main>
        </div>
    }
}

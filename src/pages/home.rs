//! Public homepage with live rates

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::use_api;
use crate::components::{RateTable, SearchBar};
use crate::config::use_config;
use crate::format::{filter_tables, format_date};
use crate::models::HomepageData;
use crate::query::{report_read_error, use_query_client, QueryKey};

#[derive(Clone, PartialEq)]
enum Load {
    Loading,
    Ready(HomepageData),
    Failed,
}

#[component]
pub fn HomePage() -> impl IntoView {
    let api = use_api();
    let query = use_query_client();
    let config = use_config();

    let state = RwSignal::new(Load::Loading);
    let search = RwSignal::new(String::new());

    Effect::new(move |_| {
        let version = query.version(QueryKey::Homepage);
        let api = api.clone();
        spawn_local(async move {
            let result = query
                .fetch(QueryKey::Homepage, || {
                    let api = api.clone();
                    async move { api.homepage().await }
                })
                .await;
            if !query.is_current(QueryKey::Homepage, version) {
                return;
            }
            let next = match result {
                Ok(data) => Load::Ready(data),
                Err(e) => {
                    report_read_error("homepage", &e);
                    Load::Failed
                }
            };
            state.try_set(next);
        });
    });

    let retry = move |_| {
        state.set(Load::Loading);
        query.invalidate(QueryKey::Homepage);
    };

    view! {
        <div class="homepage">
            <header class="homepage-header">
                <h1>"Polyester Yarn - Live Rates"</h1>
                {move || match state.get() {
                    Load::Ready(data) => {
                        let updated = data.last_updated.as_deref().map(format_date).unwrap_or_else(|| "N/A".into());
                        view! { <p class="last-updated">"Updated: " {updated}</p> }.into_any()
                    }
                    _ => ().into_any(),
                }}
                <SearchBar query=search />
            </header>

            {move || match state.get() {
                Load::Loading => view! { <div class="loading">"Loading rates..."</div> }.into_any(),
                Load::Failed => view! {
                    <div class="error-screen">
                        <p>"Failed to load inventory. Please try again later."</p>
                        <button class="primary" on:click=retry>"Try Again"</button>
                    </div>
                }.into_any(),
                Load::Ready(data) => {
                    let tables = search.with(|q| filter_tables(&data.tables, q));
                    if tables.is_empty() {
                        let message = if search.with(|q| q.trim().is_empty()) {
                            "No rates published yet"
                        } else {
                            "No items match your search"
                        };
                        view! { <p class="empty-message">{message}</p> }.into_any()
                    } else {
                        tables.into_iter().map(|table| view! { <RateTable table=table /> }).collect_view().into_any()
                    }
                }
            }}

            {config.whatsapp_link().map(|link| view! {
                <a class="whatsapp-float" href=link target="_blank" rel="noopener noreferrer">
                    "Chat on WhatsApp"
                </a>
            })}
        </div>
    }
}

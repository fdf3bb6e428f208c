//! Search Bar Component

use leptos::prelude::*;

#[component]
pub fn SearchBar(query: RwSignal<String>) -> impl IntoView {
    view! {
        <div class="search-bar">
            <input
                type="search"
                placeholder="Search by count or quality..."
                prop:value=move || query.get()
                on:input=move |ev| query.set(event_target_value(&ev))
            />
            <Show when=move || !query.with(|q| q.is_empty())>
                <button class="search-clear" on:click=move |_| query.set(String::new())>"×"</button>
            </Show>
        </div>
    }
}

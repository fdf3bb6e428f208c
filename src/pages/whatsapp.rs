//! WhatsApp Groups Page

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::use_api;
use crate::components::{alert, WhatsAppGroupCard};
use crate::error::ApiError;
use crate::models::{WhatsAppGroup, WhatsAppGroupCreate};
use crate::query::{report_read_error, use_query_client, Mutation, QueryKey};
use crate::routes::{use_router, Route};
use crate::session;

#[component]
pub fn WhatsAppPage() -> impl IntoView {
    let api = use_api();
    let query = use_query_client();
    let router = use_router();

    let groups = RwSignal::new(None::<Vec<WhatsAppGroup>>);
    let load_error = RwSignal::new(None::<String>);
    let show_form = RwSignal::new(false);
    let (name, set_name) = signal(String::new());
    let (link, set_link) = signal(String::new());
    let (active, set_active) = signal(true);
    let creating = RwSignal::new(false);

    let on_error = Callback::new(move |e: ApiError| {
        if e.is_auth() {
            session::clear_session();
            router.navigate(Route::Login);
        } else {
            alert(&e.to_string());
        }
    });

    let load_api = api.clone();
    Effect::new(move |_| {
        let version = query.version(QueryKey::WhatsAppGroups);
        let api = load_api.clone();
        spawn_local(async move {
            let result = query
                .fetch(QueryKey::WhatsAppGroups, || {
                    let api = api.clone();
                    async move { api.list_whatsapp_groups().await }
                })
                .await;
            if !query.is_current(QueryKey::WhatsAppGroups, version) {
                return;
            }
            match result {
                Ok(list) => {
                    groups.try_set(Some(list));
                    load_error.try_set(None);
                }
                Err(e) if e.is_auth() => on_error.run(e),
                Err(e) => {
                    load_error.try_set(Some(report_read_error("whatsapp groups", &e)));
                }
            }
        });
    });

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let group = match WhatsAppGroupCreate::validated(&name.get_untracked(), &link.get_untracked(), active.get_untracked()) {
            Ok(group) => group,
            Err(e) => {
                alert(&e.to_string());
                return;
            }
        };
        let api = api.clone();
        creating.set(true);
        spawn_local(async move {
            let result = api.create_whatsapp_group(&group).await;
            creating.try_set(false);
            match result {
                Ok(created) => {
                    log::info!("[WHATSAPP] added group #{}", created.id);
                    set_name.try_set(String::new());
                    set_link.try_set(String::new());
                    set_active.try_set(true);
                    show_form.try_set(false);
                    query.invalidate_after(Mutation::CreateWhatsAppGroup);
                }
                Err(e) => on_error.run(e),
            }
        });
    };

    view! {
        <div class="whatsapp-page">
            <header class="page-header">
                <h2>"WhatsApp Groups"</h2>
                <button class="primary" on:click=move |_| show_form.update(|s| *s = !*s)>
                    {move || if show_form.get() { "Cancel" } else { "+ Add WhatsApp Group" }}
                </button>
            </header>

            <Show when=move || show_form.get()>
                <form class="group-form" on:submit=submit.clone()>
                    <label>
                        "Group name"
                        <input
                            type="text"
                            prop:value=move || name.get()
                            on:input=move |ev| set_name.set(event_target_value(&ev))
                        />
                    </label>
                    <label>
                        "Invite link"
                        <input
                            type="url"
                            placeholder="https://chat.whatsapp.com/..."
                            prop:value=move || link.get()
                            on:input=move |ev| set_link.set(event_target_value(&ev))
                        />
                    </label>
                    <label class="checkbox">
                        <input
                            type="checkbox"
                            prop:checked=move || active.get()
                            on:change=move |ev| set_active.set(event_target_checked(&ev))
                        />
                        "Active"
                    </label>
                    <button type="submit" class="primary" disabled=move || creating.get()>
                        {move || if creating.get() { "Adding..." } else { "Add Group" }}
                    </button>
                </form>
            </Show>

            {move || load_error.get().map(|msg| view! { <p class="form-error">{msg}</p> })}
            {move || match groups.get() {
                None => view! { <div class="loading">"Loading..."</div> }.into_any(),
                Some(list) if list.is_empty() => view! {
                    <p class="empty-message">"No WhatsApp groups yet."</p>
                }.into_any(),
                Some(list) => view! {
                    <div class="group-grid">
                        <For
                            each=move || list.clone()
                            key=|g| (g.id, g.group_name.clone(), g.is_active)
                            children=move |g| view! { <WhatsAppGroupCard group=g on_error=on_error /> }
                        />
                    </div>
                }.into_any(),
            }}
        </div>
    }
}

//! WhatsApp Group Card
//!
//! One group with inline edit (name, active flag) and delete. Writes are
//! sent immediately.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::use_api;
use crate::error::ApiError;
use crate::format::require;
use crate::models::{WhatsAppGroup, WhatsAppGroupUpdate};
use crate::query::{use_query_client, Mutation};

use super::{alert, DeleteConfirmButton};

#[component]
pub fn WhatsAppGroupCard(
    group: WhatsAppGroup,
    #[prop(into)] on_error: Callback<ApiError>,
) -> impl IntoView {
    let api = use_api();
    let query = use_query_client();
    let id = group.id;

    let (editing, set_editing) = signal(false);
    let (name, set_name) = signal(group.group_name.clone());
    let (active, set_active) = signal(group.is_active);
    let busy = RwSignal::new(false);

    let original = StoredValue::new((group.group_name.clone(), group.is_active));

    let save_api = api.clone();
    let save = move |_| {
        let group_name = match require("Group name", &name.get_untracked()) {
            Ok(n) => n,
            Err(e) => {
                alert(&e.to_string());
                return;
            }
        };
        let update = WhatsAppGroupUpdate { group_name: Some(group_name), is_active: Some(active.get_untracked()) };
        let api = save_api.clone();
        busy.set(true);
        spawn_local(async move {
            let result = api.update_whatsapp_group(id, &update).await;
            busy.try_set(false);
            match result {
                Ok(_) => {
                    set_editing.try_set(false);
                    query.invalidate_after(Mutation::UpdateWhatsAppGroup);
                }
                Err(e) => on_error.run(e),
            }
        });
    };

    let cancel = move |_| {
        let (n, a) = original.get_value();
        set_name.set(n);
        set_active.set(a);
        set_editing.set(false);
    };

    let delete = move |_| {
        let api = api.clone();
        busy.set(true);
        spawn_local(async move {
            let result = api.delete_whatsapp_group(id).await;
            busy.try_set(false);
            match result {
                Ok(()) => query.invalidate_after(Mutation::DeleteWhatsAppGroup),
                Err(e) => on_error.run(e),
            }
        });
    };

    view! {
        <div class="group-card">
            {move || if editing.get() {
                view! {
                    <div class="group-card-edit">
                        <input
                            type="text"
                            prop:value=move || name.get()
                            on:input=move |ev| set_name.set(event_target_value(&ev))
                        />
                        <label class="checkbox">
                            <input
                                type="checkbox"
                                prop:checked=move || active.get()
                                on:change=move |ev| set_active.set(event_target_checked(&ev))
                            />
                            "Active"
                        </label>
                        <div class="group-card-actions">
                            <button class="primary" on:click=save.clone() disabled=move || busy.get()>
                                {move || if busy.get() { "Saving..." } else { "Save" }}
                            </button>
                            <button on:click=cancel disabled=move || busy.get()>"Cancel"</button>
                        </div>
                    </div>
                }.into_any()
            } else {
                view! {
                    <div class="group-card-view">
                        <div class="group-card-title">
                            <span class="group-name">{move || name.get()}</span>
                            <span class=move || if active.get() { "badge badge-active" } else { "badge" }>
                                {move || if active.get() { "Active" } else { "Inactive" }}
                            </span>
                        </div>
                        <p class="invite-id">"Invite ID: " {group.group_invite_id.clone()}</p>
                        <div class="group-card-actions">
                            <button on:click=move |_| set_editing.set(true)>"Edit"</button>
                            <DeleteConfirmButton button_class="delete-btn" busy=busy on_confirm=Callback::new(delete.clone()) />
                        </div>
                    </div>
                }.into_any()
            }}
        </div>
    }
}

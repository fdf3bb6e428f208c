//! Broadcast Dialog
//!
//! Offered after a successful save: send the selected table's fresh rates to
//! chosen WhatsApp groups.

use std::collections::BTreeSet;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::use_api;
use crate::context::use_inventory;
use crate::models::{BroadcastRequest, WhatsAppGroup};
use crate::query::{use_query_client, Mutation, QueryKey};
use crate::store::InventoryStateStoreFields;

use super::{alert, use_toaster};

#[component]
pub fn BroadcastDialog() -> impl IntoView {
    let ctx = use_inventory();
    let api = use_api();
    let query = use_query_client();
    let toaster = use_toaster();

    let groups = RwSignal::new(Vec::<WhatsAppGroup>::new());
    let selected = RwSignal::new(BTreeSet::<u32>::new());
    let sending = RwSignal::new(false);
    let open = move || ctx.store.broadcast_open().get();

    let load_api = api.clone();
    Effect::new(move |_| {
        if !open() {
            return;
        }
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
                Ok(list) => groups.set(list),
                Err(e) => ctx.report(&e),
            }
        });
    });

    let close = move || {
        ctx.store.broadcast_open().set(false);
        selected.set(BTreeSet::new());
    };

    let send = move |_| {
        let group_ids: Vec<u32> = selected.get_untracked().into_iter().collect();
        if group_ids.is_empty() {
            alert("Please select at least one group");
            return;
        }
        let Some(table_id) = ctx.store.selected_table().get_untracked() else { return };
        let api = api.clone();
        sending.set(true);
        spawn_local(async move {
            let request = BroadcastRequest::auto_generate(group_ids, vec![table_id]);
            let result = api.send_broadcast(&request).await;
            sending.try_set(false);
            match result {
                Ok(resp) => {
                    log::info!("[BROADCAST] {}", resp.message);
                    query.invalidate_after(Mutation::SendBroadcast);
                    toaster.notify("Broadcast sent successfully!");
                    close();
                }
                Err(e) => ctx.report(&e),
            }
        });
    };

    view! {
        <Show when=open>
            <div class="dialog-backdrop" on:click=move |_| close()>
                <div class="dialog" on:click=|ev| ev.stop_propagation()>
                    <h3>"Changes saved"</h3>
                    <p>"Broadcast the updated rates to your WhatsApp groups?"</p>
                    {move || {
                        let active: Vec<WhatsAppGroup> =
                            groups.get().into_iter().filter(|g| g.is_active).collect();
                        if active.is_empty() {
                            view! { <p class="empty-message">"No active WhatsApp groups. Add groups first."</p> }.into_any()
                        } else {
                            view! {
                                <div class="group-picker">
                                    <span class="label">"Select Groups:"</span>
                                    {active.into_iter().map(|g| {
                                        let id = g.id;
                                        view! {
                                            <label class="checkbox">
                                                <input
                                                    type="checkbox"
                                                    prop:checked=move || selected.with(|s| s.contains(&id))
                                                    on:change=move |_| selected.update(|s| {
                                                        if !s.remove(&id) {
                                                            s.insert(id);
                                                        }
                                                    })
                                                />
                                                {g.group_name}
                                            </label>
                                        }
                                    }).collect_view()}
                                </div>
                            }.into_any()
                        }
                    }}
                    <div class="dialog-actions">
                        <button on:click=move |_| close() disabled=move || sending.get()>"Skip"</button>
                        <button
                            class="primary"
                            on:click=send.clone()
                            disabled=move || sending.get() || selected.with(|s| s.is_empty())
                        >
                            {move || if sending.get() { "Sending..." } else { "Send" }}
                        </button>
                    </div>
                </div>
            </div>
        </Show>
    }
}

//! Inventory Page
//!
//! Table groups on the left, the selected table's items on the right. All
//! edits are buffered until Save.

use leptos::prelude::*;

use crate::api::use_api;
use crate::components::{use_toaster, BroadcastDialog, EditableItemsTable, TableEditDialog, TableGroupSidebar};
use crate::context::InventoryContext;
use crate::query::use_query_client;
use crate::routes::use_router;
use crate::store::{self, InventoryStateStoreFields};

#[component]
pub fn InventoryPage() -> impl IntoView {
    let ctx = InventoryContext::new(use_api(), use_query_client(), use_router(), use_toaster());
    provide_context(ctx);
    ctx.watch_tables();
    ctx.watch_items();

    let unsaved = move || ctx.pending.with(|p| p.has_unsaved());
    let saving = move || ctx.store.saving().get();

    let title = move || {
        ctx.store
            .selected_table()
            .get()
            .and_then(|id| store::table_name(&ctx.store, id))
            .unwrap_or_else(|| "Inventory".into())
    };

    view! {
        <div class="inventory-page">
            <TableGroupSidebar />
            <section class="inventory-main">
                <header class="inventory-header">
                    <h2>{title}</h2>
                    <Show when=unsaved>
                        <button class="primary save-btn" on:click=move |_| ctx.save() disabled=saving>
                            {move || if saving() {
                                "Saving...".to_string()
                            } else {
                                format!("Save Changes ({})", ctx.pending.with(|p| p.change_count()))
                            }}
                        </button>
                    </Show>
                </header>
                {move || ctx.store.load_error().get().map(|msg| view! { <p class="form-error">{msg}</p> })}
                {move || match (ctx.store.tables_loaded().get(), ctx.store.selected_table().get()) {
                    (false, _) => view! { <div class="loading">"Loading..."</div> }.into_any(),
                    (true, None) => view! {
                        <p class="empty-message">"Create a table group to get started."</p>
                    }.into_any(),
                    (true, Some(_)) => view! { <EditableItemsTable /> }.into_any(),
                }}
            </section>
            <TableEditDialog />
            <BroadcastDialog />
        </div>
    }
}

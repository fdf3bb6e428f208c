//! Table Edit Dialog
//!
//! Rename a table group or toggle its homepage visibility (queued into the
//! buffer), or delete it outright.

use leptos::prelude::*;

use crate::context::use_inventory;
use crate::format::require;
use crate::pending::TablePatch;
use crate::store::InventoryStateStoreFields;

use super::alert;

#[component]
pub fn TableEditDialog() -> impl IntoView {
    let ctx = use_inventory();

    // The table as currently shown, pending edits included
    let editing = Memo::new(move |_| {
        let id = ctx.store.editing_table().get()?;
        let baseline = ctx.store.tables().get();
        ctx.pending
            .with(|p| p.effective_tables(&baseline))
            .into_iter()
            .find(|t| t.id == id)
    });

    view! {
        {move || editing.get().map(|table| {
            let id = table.id;
            let (name, set_name) = signal(table.table_name.clone());
            let (visible, set_visible) = signal(table.show_on_homepage);
            let close = move |_| ctx.store.editing_table().set(None);

            let save = move |ev: web_sys::SubmitEvent| {
                ev.prevent_default();
                let new_name = match require("Table name", &name.get_untracked()) {
                    Ok(n) => n,
                    Err(e) => {
                        alert(&e.to_string());
                        return;
                    }
                };
                ctx.edit_table(id, TablePatch {
                    table_name: Some(new_name),
                    show_on_homepage: Some(visible.get_untracked()),
                    ..Default::default()
                });
            };

            view! {
                <div class="dialog-backdrop" on:click=close>
                    <form class="dialog" on:click=|ev| ev.stop_propagation() on:submit=save>
                        <h3>"Edit Table Group"</h3>
                        <label>
                            "Table name"
                            <input
                                type="text"
                                prop:value=move || name.get()
                                on:input=move |ev| set_name.set(event_target_value(&ev))
                            />
                        </label>
                        <label class="checkbox">
                            <input
                                type="checkbox"
                                prop:checked=move || visible.get()
                                on:change=move |ev| set_visible.set(event_target_checked(&ev))
                            />
                            "Show on homepage"
                        </label>
                        <div class="dialog-actions">
                            <button type="button" class="danger" on:click=move |_| ctx.delete_table(id)>
                                "Delete Table"
                            </button>
                            <button type="button" on:click=close>"Cancel"</button>
                            <button type="submit" class="primary">"Save"</button>
                        </div>
                    </form>
                </div>
            }
        })}
    }
}

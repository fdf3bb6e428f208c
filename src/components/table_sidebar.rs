//! Table Group Sidebar
//!
//! Table list with create, select, edit and drag reorder. Reorders and
//! edits are buffered; creation is immediate.

use leptos::prelude::*;
use leptos_dragdrop::{self as dnd, DropTarget};

use crate::context::use_inventory;
use crate::store::InventoryStateStoreFields;

#[component]
pub fn TableGroupSidebar() -> impl IntoView {
    let ctx = use_inventory();
    let (new_name, set_new_name) = signal(String::new());

    let tables = Memo::new(move |_| {
        let baseline = ctx.store.tables().get();
        ctx.pending.with(|p| p.effective_tables(&baseline))
    });

    let signals = dnd::create_dnd_signals();
    dnd::bind_global_mouseup(signals, move |dragged, target| {
        let ids: Vec<u32> = tables.get_untracked().iter().map(|t| t.id).collect();
        if let Some(order) = dnd::reorder(&ids, dragged, target) {
            ctx.reorder_tables(order);
        }
    });

    let create = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let name = new_name.get().trim().to_string();
        if name.is_empty() {
            return;
        }
        set_new_name.set(String::new());
        ctx.create_table(name);
    };

    view! {
        <aside class="table-sidebar">
            <div class="table-sidebar-header">"Table Groups"</div>

            <form class="table-add-form" on:submit=create>
                <input
                    type="text"
                    placeholder="New table name..."
                    prop:value=move || new_name.get()
                    on:input=move |ev| set_new_name.set(event_target_value(&ev))
                />
                <button type="submit">"+"</button>
            </form>

            <ul class="table-list">
                <For
                    each=move || tables.get()
                    key=|t| (t.id, t.table_name.clone(), t.show_on_homepage, t.item_count)
                    children=move |table| {
                        let id = table.id;
                        let target = DropTarget::Before(id);
                        view! {
                            <li
                                class=move || {
                                    let mut c = "table-row".to_string();
                                    if ctx.store.selected_table().get() == Some(id) {
                                        c.push_str(" selected");
                                    }
                                    if signals.is_dragging(id) {
                                        c.push_str(" dragging");
                                    }
                                    if signals.is_target(target) {
                                        c.push_str(" drop-before");
                                    }
                                    c
                                }
                                on:mousedown=dnd::make_on_mousedown(signals, id)
                                on:mouseenter=dnd::make_on_mouseenter(signals, target)
                                on:mouseleave=dnd::make_on_mouseleave(signals)
                                on:click=move |_| {
                                    if !signals.drag_just_ended.get_untracked() {
                                        ctx.select_table(id);
                                    }
                                }
                            >
                                <span class="drag-handle">"⋮⋮"</span>
                                <span class="table-name">{table.table_name.clone()}</span>
                                <span class="table-count">{table.item_count}</span>
                                {(!table.show_on_homepage).then(|| view! { <span class="badge">"hidden"</span> })}
                                <button
                                    class="table-edit-btn"
                                    on:click=move |ev| {
                                        ev.stop_propagation();
                                        ctx.store.editing_table().set(Some(id));
                                    }
                                >
                                    "Edit"
                                </button>
                            </li>
                        }
                    }
                />
                <li
                    class=move || if signals.is_target(DropTarget::End) { "drop-end active" } else { "drop-end" }
                    on:mouseenter=dnd::make_on_mouseenter(signals, DropTarget::End)
                    on:mouseleave=dnd::make_on_mouseleave(signals)
                />
            </ul>

            <Show when=move || ctx.store.tables_loaded().get() && tables.with(|t| t.is_empty())>
                <div class="empty-message">"No table groups yet"</div>
            </Show>
        </aside>
    }
}

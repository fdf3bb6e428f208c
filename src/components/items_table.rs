//! Editable Items Table
//!
//! Spreadsheet-style item grid. Click a cell to edit it, drag rows to
//! reorder, and stage new rows below the table before queuing them.
//! Everything lands in the pending buffer; nothing is sent from here.

use leptos::prelude::*;
use leptos_dragdrop::{self as dnd, DropTarget};

use crate::context::use_inventory;
use crate::error::ApiError;
use crate::format::{format_currency, parse_rate};
use crate::models::YarnItemCreate;
use crate::pending::{ItemPatch, RowKey, RowView};
use crate::store::InventoryStateStoreFields;

use super::alert;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Count,
    Quality,
    Rate,
}

impl Field {
    fn text(&self, row: &RowView) -> String {
        match self {
            Field::Count => row.count.clone(),
            Field::Quality => row.quality.clone(),
            Field::Rate => format!("{:.2}", row.rate),
        }
    }

    fn patch(&self, input: &str) -> Result<ItemPatch, ApiError> {
        match self {
            Field::Count => Ok(ItemPatch::count(input.trim())),
            Field::Quality => Ok(ItemPatch::quality(input.trim())),
            Field::Rate => parse_rate(input).map(ItemPatch::rate),
        }
    }
}

/// A staged row typed below the table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewRow {
    pub key: u32,
    pub count: String,
    pub quality: String,
    pub rate: String,
    pub show_on_homepage: bool,
}

/// Turn staged rows into creates ordered after `start_order`.
///
/// Rows missing count or quality are skipped; an empty rate means zero.
/// Fails when no row is complete or a rate does not parse.
pub fn staged_to_creates(rows: &[NewRow], start_order: i32) -> Result<Vec<YarnItemCreate>, ApiError> {
    let complete: Vec<&NewRow> = rows
        .iter()
        .filter(|r| !r.count.trim().is_empty() && !r.quality.trim().is_empty())
        .collect();
    if complete.is_empty() {
        return Err(ApiError::Validation(
            "Please fill in count and quality for at least one row".into(),
        ));
    }
    complete
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let rate = if row.rate.trim().is_empty() { 0.0 } else { parse_rate(&row.rate)? };
            Ok(YarnItemCreate {
                count: row.count.trim().to_string(),
                quality: row.quality.trim().to_string(),
                rate,
                display_order: start_order + idx as i32,
                show_on_homepage: row.show_on_homepage,
            })
        })
        .collect()
}

/// Click-to-edit cell; Enter or blur commits, Escape cancels
#[component]
fn EditableCell(row: RowView, field: Field) -> impl IntoView {
    let ctx = use_inventory();
    let key = row.key;
    let (editing, set_editing) = signal(false);
    let (value, set_value) = signal(field.text(&row));
    let display = match field {
        Field::Rate => format_currency(row.rate),
        _ => {
            let text = field.text(&row);
            if text.is_empty() { "—".to_string() } else { text }
        }
    };
    let original = field.text(&row);

    let commit = move || {
        if !editing.get_untracked() {
            return;
        }
        set_editing.set(false);
        let input = value.get_untracked();
        if input == original {
            return;
        }
        match field.patch(&input) {
            Ok(patch) => ctx.update_row(key, patch),
            Err(e) => alert(&e.to_string()),
        }
    };
    let commit_on_key = commit.clone();
    let reset_to = field.text(&row);
    let input_type = if field == Field::Rate { "number" } else { "text" };

    view! {
        <td class="cell">
            {move || if editing.get() {
                let commit = commit.clone();
                let commit_on_key = commit_on_key.clone();
                let reset_to = reset_to.clone();
                view! {
                    <input
                        class="cell-input"
                        type=input_type
                        step="0.01"
                        autofocus=true
                        prop:value=move || value.get()
                        on:input=move |ev| set_value.set(event_target_value(&ev))
                        on:blur=move |_| commit()
                        on:keydown=move |ev: web_sys::KeyboardEvent| match ev.key().as_str() {
                            "Enter" => commit_on_key(),
                            "Escape" => {
                                set_value.set(reset_to.clone());
                                set_editing.set(false);
                            }
                            _ => {}
                        }
                    />
                }.into_any()
            } else {
                view! {
                    <div class="cell-text" on:click=move |_| set_editing.set(true)>
                        {display.clone()}
                    </div>
                }.into_any()
            }}
        </td>
    }
}

#[component]
fn ItemRow(row: RowView, position: usize, signals: dnd::DndSignals) -> impl IntoView {
    let ctx = use_inventory();
    let key = row.key;
    let show = row.show_on_homepage;
    // Drafts have no server id yet and do not take part in reordering
    let drag_id = match key {
        RowKey::Saved(id) => Some(id),
        RowKey::Draft(_) => None,
    };
    let target = drag_id.map(DropTarget::Before);

    let class = {
        let dirty = row.dirty;
        let is_draft = drag_id.is_none();
        move || {
            let mut c = "item-row".to_string();
            if dirty {
                c.push_str(" dirty");
            }
            if is_draft {
                c.push_str(" draft");
            }
            if let Some(id) = drag_id {
                if signals.is_dragging(id) {
                    c.push_str(" dragging");
                }
            }
            if let Some(t) = target {
                if signals.is_target(t) {
                    c.push_str(" drop-before");
                }
            }
            c
        }
    };

    view! {
        <tr
            class=class
            on:mousedown=move |ev| if let Some(id) = drag_id { dnd::make_on_mousedown(signals, id)(ev) }
            on:mouseenter=move |ev| if let Some(t) = target { dnd::make_on_mouseenter(signals, t)(ev) }
            on:mouseleave=dnd::make_on_mouseleave(signals)
        >
            <td class="drag-handle">{if drag_id.is_some() { "⋮⋮" } else { "+" }}</td>
            <td class="serial">{row.serial_number.map(|n| n.to_string()).unwrap_or_else(|| (position + 1).to_string())}</td>
            <EditableCell row=row.clone() field=Field::Count />
            <EditableCell row=row.clone() field=Field::Quality />
            <EditableCell row=row.clone() field=Field::Rate />
            <td class="center">
                <input
                    type="checkbox"
                    prop:checked=show
                    on:change=move |ev| ctx.update_row(key, ItemPatch::show_on_homepage(event_target_checked(&ev)))
                />
            </td>
            <td class="center">
                <button class="delete-btn" on:click=move |_| ctx.delete_row(key)>"Delete"</button>
            </td>
        </tr>
    }
}

/// Inputs for one staged row
#[component]
fn StagedRow(row: NewRow, rows: RwSignal<Vec<NewRow>>) -> impl IntoView {
    let k = row.key;
    let edit = move |f: fn(&mut NewRow, String), value: String| {
        rows.update(|rs| {
            if let Some(r) = rs.iter_mut().find(|r| r.key == k) {
                f(r, value);
            }
        });
    };

    view! {
        <tr class="item-row staged">
            <td></td>
            <td></td>
            <td><input placeholder="e.g., 75/36" prop:value=row.count
                on:input=move |ev| edit(|r, v| r.count = v, event_target_value(&ev)) /></td>
            <td><input placeholder="e.g., SD, FD" prop:value=row.quality
                on:input=move |ev| edit(|r, v| r.quality = v, event_target_value(&ev)) /></td>
            <td><input type="number" step="0.01" placeholder="0.00" prop:value=row.rate
                on:input=move |ev| edit(|r, v| r.rate = v, event_target_value(&ev)) /></td>
            <td class="center">
                <input type="checkbox" prop:checked=row.show_on_homepage
                    on:change=move |ev| rows.update(|rs| {
                        if let Some(r) = rs.iter_mut().find(|r| r.key == k) {
                            r.show_on_homepage = event_target_checked(&ev);
                        }
                    }) />
            </td>
            <td class="center">
                <button class="cancel-btn" on:click=move |_| rows.update(|rs| rs.retain(|r| r.key != k))>"×"</button>
            </td>
        </tr>
    }
}

#[component]
pub fn EditableItemsTable() -> impl IntoView {
    let ctx = use_inventory();
    let staged = RwSignal::new(Vec::<NewRow>::new());
    let next_key = StoredValue::new(0u32);

    let rows = Memo::new(move |_| {
        let baseline = ctx.store.items().get();
        ctx.pending.with(|p| p.effective_items(&baseline))
    });

    let signals = dnd::create_dnd_signals();
    dnd::bind_global_mouseup(signals, move |dragged, target| {
        let ids: Vec<u32> = rows
            .get_untracked()
            .iter()
            .filter_map(|r| match r.key {
                RowKey::Saved(id) => Some(id),
                RowKey::Draft(_) => None,
            })
            .collect();
        if let Some(order) = dnd::reorder(&ids, dragged, target) {
            ctx.reorder_items(order);
        }
    });

    let add_row = move |_| {
        let key = next_key.get_value();
        next_key.set_value(key + 1);
        staged.update(|s| s.push(NewRow { key, show_on_homepage: true, ..Default::default() }));
    };

    let queue_staged = move |_| {
        let start = rows.with_untracked(|r| r.len() as i32);
        match staged_to_creates(&staged.get_untracked(), start) {
            Ok(items) => {
                ctx.add_items(items);
                staged.set(Vec::new());
            }
            Err(e) => alert(&e.to_string()),
        }
    };

    view! {
        <div class="items-table">
            <div class="items-toolbar">
                <p class="hint">"Drag rows to reorder. Click cells to edit."</p>
                <button class="add-row-btn" on:click=add_row>"Add Row"</button>
            </div>

            <table>
                <thead>
                    <tr>
                        <th></th>
                        <th>"S.No"</th>
                        <th>"Count"</th>
                        <th>"Quality"</th>
                        <th>"Rate"</th>
                        <th>"Homepage"</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    <For
                        each=move || rows.get().into_iter().enumerate()
                        key=|(idx, row)| {
                            (*idx, row.key, row.count.clone(), row.quality.clone(), row.rate.to_bits(), row.show_on_homepage, row.dirty)
                        }
                        children=move |(idx, row)| view! { <ItemRow row=row position=idx signals=signals /> }
                    />
                    <tr
                        class=move || if signals.is_target(DropTarget::End) { "drop-end active" } else { "drop-end" }
                        on:mouseenter=dnd::make_on_mouseenter(signals, DropTarget::End)
                        on:mouseleave=dnd::make_on_mouseleave(signals)
                    >
                        <td colspan="7"></td>
                    </tr>
                    <For
                        each=move || staged.get()
                        key=|r| r.key
                        children=move |row| view! { <StagedRow row=row rows=staged /> }
                    />
                    <Show when=move || rows.with(|r| r.is_empty()) && staged.with(|s| s.is_empty())>
                        <tr>
                            <td colspan="7" class="empty-message">"No items yet. Click \"Add Row\" to get started."</td>
                        </tr>
                    </Show>
                </tbody>
            </table>

            <Show when=move || !staged.with(|s| s.is_empty())>
                <div class="staged-bar">
                    <span>{move || {
                        let n = staged.with(|s| s.len());
                        format!("{n} new row{} pending", if n > 1 { "s" } else { "" })
                    }}</span>
                    <button class="primary" on:click=queue_staged>"Save All"</button>
                    <button on:click=move |_| staged.set(Vec::new())>"Cancel All"</button>
                </div>
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged(count: &str, quality: &str, rate: &str) -> NewRow {
        NewRow {
            key: 0,
            count: count.into(),
            quality: quality.into(),
            rate: rate.into(),
            show_on_homepage: true,
        }
    }

    #[test]
    fn test_incomplete_rows_skipped() {
        let rows = vec![staged("40/1", "Combed", "120"), staged("", "Carded", "5"), staged(" 30/1 ", "SD", "")];
        let creates = staged_to_creates(&rows, 4).unwrap();
        assert_eq!(creates.len(), 2);
        assert_eq!(creates[0].display_order, 4);
        assert_eq!(creates[1].count, "30/1");
        assert_eq!(creates[1].rate, 0.0);
        assert_eq!(creates[1].display_order, 5);
    }

    #[test]
    fn test_nothing_complete() {
        assert!(matches!(
            staged_to_creates(&[staged("", "", "")], 0),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_rate_rejected() {
        assert!(staged_to_creates(&[staged("40/1", "Combed", "-3")], 0).is_err());
    }

    #[test]
    fn test_cell_patches() {
        assert_eq!(Field::Rate.patch("99.5").unwrap(), ItemPatch::rate(99.5));
        assert_eq!(Field::Count.patch(" 2/40 ").unwrap(), ItemPatch::count("2/40"));
        assert!(Field::Rate.patch("abc").is_err());
    }
}

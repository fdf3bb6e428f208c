//! Inventory Screen State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity. Holds the server
//! baseline the pending buffer is rendered against.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::models::{TableGroup, YarnItem};

/// Inventory screen state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct InventoryState {
    /// Table groups as last read from the server
    pub tables: Vec<TableGroup>,
    /// Items of the selected table as last read from the server
    pub items: Vec<YarnItem>,
    pub selected_table: Option<u32>,
    /// The user picked a table themselves
    pub user_selected: bool,
    pub tables_loaded: bool,
    pub items_loading: bool,
    /// A commit is in flight
    pub saving: bool,
    /// Inline read error for the current view
    pub load_error: Option<String>,
    /// Table whose edit dialog is open
    pub editing_table: Option<u32>,
    /// Broadcast dialog shown after a successful save
    pub broadcast_open: bool,
}

/// Type alias for the store
pub type InventoryStore = Store<InventoryState>;

/// Selection after fresh table data arrives.
///
/// A still-existing selection is kept. Otherwise the first table is chosen,
/// unless the user has picked a table of their own.
pub fn resolve_selection(current: Option<u32>, user_selected: bool, tables: &[TableGroup]) -> Option<u32> {
    if let Some(id) = current {
        if tables.iter().any(|t| t.id == id) {
            return Some(id);
        }
    }
    if user_selected {
        return None;
    }
    tables.first().map(|t| t.id)
}

// ========================
// Store Helper Functions
// ========================

/// Replace the table baseline and settle the selection; returns the new
/// selection when it changed
pub fn store_set_tables(store: &InventoryStore, tables: Vec<TableGroup>) -> Option<Option<u32>> {
    let current = store.selected_table().get_untracked();
    let next = resolve_selection(current, store.user_selected().get_untracked(), &tables);
    store.tables().set(tables);
    store.tables_loaded().set(true);
    (next != current).then(|| {
        store.selected_table().set(next);
        next
    })
}

/// Drop a deleted table; a deleted selection falls back to automatic choice
pub fn store_remove_table(store: &InventoryStore, table_id: u32) {
    store.tables().write().retain(|t| t.id != table_id);
    if store.selected_table().get_untracked() == Some(table_id) {
        store.user_selected().set(false);
        store.selected_table().set(None);
        store.items().write().clear();
    }
}

pub fn store_add_table(store: &InventoryStore, table: TableGroup) {
    store.tables().write().push(table);
}

/// Name of a table in the baseline
pub fn table_name(store: &InventoryStore, table_id: u32) -> Option<String> {
    store
        .tables()
        .read()
        .iter()
        .find(|t| t.id == table_id)
        .map(|t| t.table_name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: u32) -> TableGroup {
        TableGroup {
            id,
            table_name: format!("Table {id}"),
            display_order: id as i32,
            show_on_homepage: true,
            item_count: 0,
            created_at: "2026-10-01T09:00:00".into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_first_table_selected_on_arrival() {
        assert_eq!(resolve_selection(None, false, &[table(4), table(2)]), Some(4));
        assert_eq!(resolve_selection(None, false, &[]), None);
    }

    #[test]
    fn test_existing_selection_kept() {
        assert_eq!(resolve_selection(Some(2), false, &[table(4), table(2)]), Some(2));
        assert_eq!(resolve_selection(Some(2), true, &[table(4), table(2)]), Some(2));
    }

    #[test]
    fn test_vanished_selection() {
        assert_eq!(resolve_selection(Some(9), false, &[table(4)]), Some(4));
        assert_eq!(resolve_selection(Some(9), true, &[table(4)]), None);
    }
}

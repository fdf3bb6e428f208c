//! Inventory Context
//!
//! Shared state of the inventory screen provided via Leptos Context API,
//! and the actions its components call. Edits go into the pending buffer;
//! table creation and deletion hit the backend immediately.

use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;

use crate::api::ApiClient;
use crate::commit::commit_plan;
use crate::components::{alert, confirm, Toaster};
use crate::error::ApiError;
use crate::models::{OrderEntry, TableGroupCreate, YarnItemCreate};
use crate::pending::{BufferError, ItemPatch, PendingChanges, RowKey, TablePatch};
use crate::query::{report_read_error, Mutation, QueryClient, QueryKey};
use crate::routes::{Route, Router};
use crate::session;
use crate::store::{self, InventoryState, InventoryStore, InventoryStateStoreFields};

/// Inventory screen handles; all fields are `Copy`
#[derive(Clone, Copy)]
pub struct InventoryContext {
    pub store: InventoryStore,
    pub pending: RwSignal<PendingChanges>,
    api: StoredValue<ApiClient>,
    query: QueryClient,
    router: Router,
    toaster: Toaster,
}

impl InventoryContext {
    pub fn new(api: ApiClient, query: QueryClient, router: Router, toaster: Toaster) -> Self {
        Self {
            store: Store::new(InventoryState::default()),
            pending: RwSignal::new(PendingChanges::new(None)),
            api: StoredValue::new(api),
            query,
            router,
            toaster,
        }
    }

    fn api(&self) -> ApiClient {
        self.api.get_value()
    }

    /// Alert, or send to login when the session is gone
    pub fn report(&self, err: &ApiError) {
        if err.is_auth() {
            session::clear_session();
            self.router.navigate(Route::Login);
        } else {
            alert(&err.to_string());
        }
    }

    fn report_buffer(&self, result: Result<(), BufferError>) {
        if let Err(e) = result {
            alert(&e.to_string());
        }
    }

    // ========================
    // Reads
    // ========================

    /// Refetch table groups whenever they are invalidated
    pub fn watch_tables(&self) {
        let ctx = *self;
        Effect::new(move |_| {
            let version = ctx.query.version(QueryKey::TableGroups);
            spawn_local(async move {
                let api = ctx.api();
                let result = ctx
                    .query
                    .fetch(QueryKey::TableGroups, || {
                        let api = api.clone();
                        async move { api.list_table_groups().await }
                    })
                    .await;
                // Superseded by a later invalidation
                if !ctx.query.is_current(QueryKey::TableGroups, version) {
                    return;
                }
                match result {
                    Ok(tables) => {
                        log::debug!("[INVENTORY] loaded {} table group(s)", tables.len());
                        match store::store_set_tables(&ctx.store, tables) {
                            Some(next) => ctx.pending.update(|p| p.reset(next)),
                            None => ctx.pending.update(|p| p.tables_reloaded()),
                        }
                        ctx.store.load_error().set(None);
                    }
                    Err(e) if e.is_auth() => ctx.report(&e),
                    Err(e) => ctx.store.load_error().set(Some(report_read_error("table groups", &e))),
                }
            });
        });
    }

    /// Refetch the selected table's items on selection change or invalidation
    pub fn watch_items(&self) {
        let ctx = *self;
        Effect::new(move |_| {
            let Some(table_id) = ctx.store.selected_table().get() else {
                ctx.store.items().set(Vec::new());
                return;
            };
            let version = ctx.query.version(QueryKey::YarnItems(table_id));
            ctx.store.items_loading().set(true);
            spawn_local(async move {
                let api = ctx.api();
                let result = ctx
                    .query
                    .fetch(QueryKey::YarnItems(table_id), || {
                        let api = api.clone();
                        async move { api.list_yarn_items(table_id).await }
                    })
                    .await;
                // The user may have moved on while this was loading
                if ctx.store.selected_table().try_get_untracked().flatten() != Some(table_id)
                    || !ctx.query.is_current(QueryKey::YarnItems(table_id), version)
                {
                    return;
                }
                ctx.store.items_loading().set(false);
                match result {
                    Ok(items) => {
                        ctx.store.items().set(items);
                        ctx.pending.update(|p| p.items_reloaded());
                        ctx.store.load_error().set(None);
                    }
                    Err(e) if e.is_auth() => ctx.report(&e),
                    Err(e) => ctx.store.load_error().set(Some(report_read_error("yarn items", &e))),
                }
            });
        });
    }

    // ========================
    // Selection
    // ========================

    /// Switch tables; unsaved edits are discarded after confirmation.
    /// Not possible while a save is running.
    pub fn select_table(&self, table_id: u32) {
        if self.store.selected_table().get_untracked() == Some(table_id) {
            return;
        }
        if self.pending.with_untracked(|p| p.is_committing()) {
            alert("Please wait for the save to finish");
            return;
        }
        if self.pending.with_untracked(|p| p.has_unsaved())
            && !confirm("You have unsaved changes. Discard them?")
        {
            return;
        }
        self.store.user_selected().set(true);
        self.store.selected_table().set(Some(table_id));
        self.store.items().set(Vec::new());
        self.pending.update(|p| p.reset(Some(table_id)));
    }

    // ========================
    // Buffered edits
    // ========================

    pub fn update_row(&self, row: RowKey, patch: ItemPatch) {
        match row {
            RowKey::Saved(id) => {
                let result = self.pending.try_update(|p| p.queue_update(id, patch));
                self.report_buffer(result.unwrap_or(Ok(())));
            }
            RowKey::Draft(id) => self.pending.update(|p| p.update_draft(id, patch)),
        }
    }

    pub fn delete_row(&self, row: RowKey) {
        if !confirm("Delete this item?") {
            return;
        }
        let result = self.pending.try_update(|p| p.queue_delete(row));
        self.report_buffer(result.unwrap_or(Ok(())));
    }

    pub fn add_items(&self, items: Vec<YarnItemCreate>) {
        let result = self.pending.try_update(|p| p.queue_batch_create(items).map(|_| ()));
        self.report_buffer(result.unwrap_or(Ok(())));
    }

    /// Queue an item order given as saved ids in display sequence
    pub fn reorder_items(&self, ids: Vec<u32>) {
        let result = self.pending.try_update(|p| p.queue_item_reorder(OrderEntry::dense(ids)));
        self.report_buffer(result.unwrap_or(Ok(())));
    }

    pub fn reorder_tables(&self, ids: Vec<u32>) {
        self.pending.update(|p| p.queue_table_reorder(OrderEntry::dense(ids)));
    }

    pub fn edit_table(&self, table_id: u32, patch: TablePatch) {
        self.pending.update(|p| p.queue_table_update(table_id, patch));
        self.store.editing_table().set(None);
    }

    // ========================
    // Immediate writes
    // ========================

    pub fn create_table(&self, name: String) {
        let ctx = *self;
        let display_order = self.store.tables().with_untracked(|t| t.len() as i32);
        spawn_local(async move {
            let request = TableGroupCreate { table_name: name, display_order, show_on_homepage: true };
            match ctx.api().create_table_group(&request).await {
                Ok(table) => {
                    log::info!("[INVENTORY] created table group #{}", table.id);
                    store::store_add_table(&ctx.store, table);
                    ctx.query.invalidate_after(Mutation::CreateTable);
                }
                Err(e) => ctx.report(&e),
            }
        });
    }

    pub fn delete_table(&self, table_id: u32) {
        if !confirm("Delete this table group? All items will be deleted.") {
            return;
        }
        let ctx = *self;
        spawn_local(async move {
            match ctx.api().delete_table_group(table_id).await {
                Ok(()) => {
                    log::info!("[INVENTORY] deleted table group #{table_id}");
                    let was_selected = ctx.store.selected_table().get_untracked() == Some(table_id);
                    store::store_remove_table(&ctx.store, table_id);
                    ctx.pending.update(|p| {
                        if was_selected {
                            p.reset(None);
                        } else {
                            p.forget_table(table_id);
                        }
                    });
                    ctx.store.editing_table().set(None);
                    ctx.query.invalidate_after(Mutation::DeleteTable { table_id });
                }
                Err(e) => ctx.report(&e),
            }
        });
    }

    // ========================
    // Commit
    // ========================

    /// Flush the buffer; on success the broadcast dialog opens
    pub fn save(&self) {
        let Some(plan) = self.pending.try_update(|p| p.begin_commit()).flatten() else {
            return;
        };
        let ctx = *self;
        self.store.saving().set(true);

        spawn_local(async move {
            let api = ctx.api();
            let result = commit_plan(&api, &plan).await;
            ctx.pending.try_update(|p| p.finish_commit(plan, result.is_ok()));
            ctx.store.saving().set(false);

            match result {
                Ok(summary) => {
                    summary.touched.into_iter().for_each(|key| ctx.query.invalidate(key));
                    ctx.toaster.notify(format!("Saved {} change(s)", summary.requests));
                    if ctx.store.selected_table().try_get_untracked().flatten().is_some() {
                        ctx.store.broadcast_open().set(true);
                    }
                }
                Err(err) => {
                    err.touched.iter().for_each(|key| ctx.query.invalidate(*key));
                    if err.unauthenticated {
                        ctx.report(&ApiError::Unauthenticated);
                    } else {
                        alert(&err.to_string());
                    }
                }
            }
        });
    }
}

/// Get the inventory context
pub fn use_inventory() -> InventoryContext {
    expect_context::<InventoryContext>()
}

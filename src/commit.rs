//! Batch Commit
//!
//! Sends a [`CommitPlan`] to the backend. All requests of a plan are issued
//! concurrently; failures are gathered into one [`CommitError`] after every
//! request has settled. A delete answered with 404 counts as applied, so a
//! restored batch can be sent again after a partial failure.

use async_trait::async_trait;
use futures::future::join_all;

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{OrderEntry, YarnItemCreate};
use crate::pending::{CommitPlan, CommitRequest, ItemPatch, TablePatch};
use crate::query::{Mutation, QueryKey};

/// Writes a commit needs from the backend
#[async_trait(?Send)]
pub trait InventoryBackend {
    async fn update_table_group(&self, table_id: u32, patch: &TablePatch) -> ApiResult<()>;
    async fn delete_yarn_item(&self, item_id: u32) -> ApiResult<()>;
    async fn update_yarn_item(&self, item_id: u32, patch: &ItemPatch) -> ApiResult<()>;
    async fn batch_create_yarn_items(&self, table_id: u32, items: &[YarnItemCreate]) -> ApiResult<()>;
    async fn reorder_yarn_items(&self, table_id: u32, order: &[OrderEntry]) -> ApiResult<()>;
    async fn reorder_table_groups(&self, order: &[OrderEntry]) -> ApiResult<()>;
}

#[async_trait(?Send)]
impl InventoryBackend for ApiClient {
    async fn update_table_group(&self, table_id: u32, patch: &TablePatch) -> ApiResult<()> {
        ApiClient::update_table_group(self, table_id, patch).await.map(|_| ())
    }

    async fn delete_yarn_item(&self, item_id: u32) -> ApiResult<()> {
        ApiClient::delete_yarn_item(self, item_id).await
    }

    async fn update_yarn_item(&self, item_id: u32, patch: &ItemPatch) -> ApiResult<()> {
        ApiClient::update_yarn_item(self, item_id, patch).await.map(|_| ())
    }

    async fn batch_create_yarn_items(&self, table_id: u32, items: &[YarnItemCreate]) -> ApiResult<()> {
        ApiClient::batch_create_yarn_items(self, table_id, items).await.map(|_| ())
    }

    async fn reorder_yarn_items(&self, table_id: u32, order: &[OrderEntry]) -> ApiResult<()> {
        ApiClient::reorder_yarn_items(self, table_id, order).await
    }

    async fn reorder_table_groups(&self, order: &[OrderEntry]) -> ApiResult<()> {
        ApiClient::reorder_table_groups(self, order).await
    }
}

/// A fully applied commit
#[derive(Debug, Clone, PartialEq)]
pub struct CommitSummary {
    pub requests: usize,
    /// Reads to refresh
    pub touched: Vec<QueryKey>,
}

/// A commit where at least one request failed. Requests that succeeded
/// stay applied on the server.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Failed to save {failed} of {total} change(s): {first}")]
pub struct CommitError {
    pub failed: usize,
    pub total: usize,
    first: String,
    pub failures: Vec<(String, ApiError)>,
    /// Reads to refresh; partial success may have changed any of them
    pub touched: Vec<QueryKey>,
    pub unauthenticated: bool,
}

impl CommitRequest {
    pub fn mutation(&self) -> Mutation {
        match *self {
            CommitRequest::UpdateTable { table_id, .. } => Mutation::UpdateTable { table_id },
            CommitRequest::DeleteItem { table_id, .. } => Mutation::DeleteItem { table_id },
            CommitRequest::UpdateItem { table_id, .. } => Mutation::UpdateItem { table_id },
            CommitRequest::CreateItems { table_id, .. } => Mutation::CreateItems { table_id },
            CommitRequest::ReorderItems { table_id, .. } => Mutation::ReorderItems { table_id },
            CommitRequest::ReorderTables { .. } => Mutation::ReorderTables,
        }
    }
}

/// Union of the keys invalidated by `requests`, first-seen order
fn touched_keys(requests: &[CommitRequest]) -> Vec<QueryKey> {
    let mut keys = Vec::new();
    for key in requests.iter().flat_map(|r| r.mutation().invalidates()) {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

async fn send<B: InventoryBackend + ?Sized>(backend: &B, request: &CommitRequest) -> ApiResult<()> {
    match request {
        CommitRequest::UpdateTable { table_id, patch } => backend.update_table_group(*table_id, patch).await,
        CommitRequest::DeleteItem { item_id, .. } => match backend.delete_yarn_item(*item_id).await {
            // Already gone, e.g. deleted by an earlier attempt of this batch
            Err(ApiError::Status { status: 404, .. }) => {
                log::debug!("[COMMIT] item #{item_id} already deleted");
                Ok(())
            }
            other => other,
        },
        CommitRequest::UpdateItem { item_id, patch, .. } => backend.update_yarn_item(*item_id, patch).await,
        CommitRequest::CreateItems { table_id, items } => backend.batch_create_yarn_items(*table_id, items).await,
        CommitRequest::ReorderItems { table_id, order } => backend.reorder_yarn_items(*table_id, order).await,
        CommitRequest::ReorderTables { order } => backend.reorder_table_groups(order).await,
    }
}

/// Send every request of `plan` and wait for all of them
pub async fn commit_plan<B: InventoryBackend + ?Sized>(
    backend: &B,
    plan: &CommitPlan,
) -> Result<CommitSummary, CommitError> {
    let requests = plan.requests();
    let touched = touched_keys(&requests);
    log::info!("[COMMIT] sending {} request(s)", requests.len());

    let results = join_all(requests.iter().map(|req| send(backend, req))).await;

    let failures: Vec<(String, ApiError)> = requests
        .iter()
        .zip(results)
        .filter_map(|(req, result)| result.err().map(|e| (req.describe(), e)))
        .collect();

    if failures.is_empty() {
        return Ok(CommitSummary { requests: requests.len(), touched });
    }

    for (what, err) in &failures {
        log::error!("[COMMIT] {what} failed: {err}");
    }
    let first = failures.first().map(|(_, e)| e.to_string()).unwrap_or_default();
    Err(CommitError {
        failed: failures.len(),
        total: requests.len(),
        first,
        unauthenticated: failures.iter().any(|(_, e)| e.is_auth()),
        failures,
        touched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeSet;

    use futures::executor::block_on;

    use crate::models::YarnItem;
    use crate::pending::{PendingChanges, RowKey};

    /// Records calls; fails any call whose label starts with `fail_prefix`.
    /// Deleting an item twice answers 404 like the real backend.
    #[derive(Default)]
    struct FakeBackend {
        calls: RefCell<Vec<String>>,
        fail_prefix: Cell<Option<&'static str>>,
        deleted: RefCell<BTreeSet<u32>>,
    }

    impl FakeBackend {
        fn failing(prefix: &'static str) -> Self {
            Self { fail_prefix: Cell::new(Some(prefix)), ..Default::default() }
        }

        fn heal(&self) {
            self.fail_prefix.set(None);
        }

        fn record(&self, call: String) -> ApiResult<()> {
            let fail = self.fail_prefix.get().is_some_and(|p| call.starts_with(p));
            self.calls.borrow_mut().push(call);
            if fail {
                Err(ApiError::Status { status: 500, message: "boom".into() })
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<String> {
            let mut calls = self.calls.borrow().clone();
            calls.sort();
            calls
        }
    }

    #[async_trait(?Send)]
    impl InventoryBackend for FakeBackend {
        async fn update_table_group(&self, table_id: u32, patch: &TablePatch) -> ApiResult<()> {
            self.record(format!("update_table {table_id} {:?}", patch.table_name))
        }
        async fn delete_yarn_item(&self, item_id: u32) -> ApiResult<()> {
            self.record(format!("delete_item {item_id}"))?;
            if !self.deleted.borrow_mut().insert(item_id) {
                return Err(ApiError::Status { status: 404, message: "Yarn item not found".into() });
            }
            Ok(())
        }
        async fn update_yarn_item(&self, item_id: u32, patch: &ItemPatch) -> ApiResult<()> {
            self.record(format!("update_item {item_id} {}", serde_json::to_string(patch).unwrap()))
        }
        async fn batch_create_yarn_items(&self, table_id: u32, items: &[YarnItemCreate]) -> ApiResult<()> {
            self.record(format!("create_items {table_id} n={}", items.len()))
        }
        async fn reorder_yarn_items(&self, table_id: u32, order: &[OrderEntry]) -> ApiResult<()> {
            let ids: Vec<u32> = order.iter().map(|e| e.id).collect();
            self.record(format!("reorder_items {table_id} {ids:?}"))
        }
        async fn reorder_table_groups(&self, order: &[OrderEntry]) -> ApiResult<()> {
            self.record(format!("reorder_tables n={}", order.len()))
        }
    }

    fn new_item(count: &str) -> YarnItemCreate {
        YarnItemCreate {
            count: count.into(),
            quality: "Combed".into(),
            rate: 95.0,
            display_order: 0,
            show_on_homepage: true,
        }
    }

    fn saved(id: u32) -> YarnItem {
        YarnItem {
            id,
            serial_number: Some(id),
            count: "30/1".into(),
            quality: "Combed".into(),
            rate: 100.0,
            display_order: id as i32,
            show_on_homepage: true,
            created_at: "2026-10-01T09:00:00".into(),
            updated_at: None,
        }
    }

    /// Take a plan, send it, settle the buffer; mirrors the save button
    fn save(backend: &FakeBackend, buffer: &mut PendingChanges) -> Option<Result<CommitSummary, CommitError>> {
        let plan = buffer.begin_commit()?;
        let result = block_on(commit_plan(backend, &plan));
        buffer.finish_commit(plan, result.is_ok());
        Some(result)
    }

    #[test]
    fn test_clean_buffer_sends_nothing() {
        let backend = FakeBackend::default();
        let mut buffer = PendingChanges::new(Some(1));
        assert!(save(&backend, &mut buffer).is_none());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_save_scenario() {
        let backend = FakeBackend::default();
        let mut buffer = PendingChanges::new(Some(3));
        buffer.queue_update(7, ItemPatch::rate(120.0)).unwrap();
        buffer.queue_delete(RowKey::Saved(9)).unwrap();
        buffer.queue_create(new_item("40/1")).unwrap();

        let summary = save(&backend, &mut buffer).unwrap().unwrap();

        assert_eq!(summary.requests, 3);
        assert_eq!(
            backend.calls(),
            vec![
                "create_items 3 n=1".to_string(),
                "delete_item 9".to_string(),
                r#"update_item 7 {"rate":120.0}"#.to_string(),
            ]
        );
        assert!(!buffer.is_dirty());
        assert!(!buffer.is_committing());
        assert!(summary.touched.contains(&QueryKey::YarnItems(3)));
        assert!(summary.touched.contains(&QueryKey::TableGroups));
        assert!(summary.touched.contains(&QueryKey::Homepage));
    }

    #[test]
    fn test_failure_restores_buffer() {
        let backend = FakeBackend::failing("delete_item");
        let mut buffer = PendingChanges::new(Some(3));
        buffer.queue_update(7, ItemPatch::rate(120.0)).unwrap();
        buffer.queue_delete(RowKey::Saved(9)).unwrap();

        let err = save(&backend, &mut buffer).unwrap().unwrap_err();

        assert_eq!(err.failed, 1);
        assert_eq!(err.total, 2);
        assert_eq!(err.to_string(), "Failed to save 1 of 2 change(s): boom");
        assert!(!err.unauthenticated);
        // Both requests were attempted despite the failure
        assert_eq!(backend.calls().len(), 2);

        assert!(buffer.is_dirty());
        assert_eq!(buffer.pending_update(7), Some(&ItemPatch::rate(120.0)));
        assert!(buffer.pending_deletes().contains(&9));

        let rows = buffer.effective_items(&[saved(7), saved(9)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rate, 120.0);
    }

    #[test]
    fn test_retry_after_partial_failure() {
        let backend = FakeBackend::failing("update_item");
        let mut buffer = PendingChanges::new(Some(3));
        buffer.queue_update(7, ItemPatch::quality("Carded")).unwrap();
        buffer.queue_delete(RowKey::Saved(9)).unwrap();
        assert!(save(&backend, &mut buffer).unwrap().is_err());
        assert!(buffer.pending_deletes().contains(&9));

        // The delete landed the first time; resending it must not fail the batch
        backend.heal();
        let summary = save(&backend, &mut buffer).unwrap().unwrap();
        assert_eq!(summary.requests, 2);
        let deletes = backend.calls().iter().filter(|c| *c == "delete_item 9").count();
        assert_eq!(deletes, 2);
        assert!(!buffer.has_unsaved());
    }

    #[test]
    fn test_other_delete_errors_still_fail() {
        let backend = FakeBackend::failing("delete_item");
        let mut buffer = PendingChanges::new(Some(3));
        buffer.queue_delete(RowKey::Saved(4)).unwrap();
        let err = save(&backend, &mut buffer).unwrap().unwrap_err();
        assert_eq!(err.failed, 1);
    }

    #[test]
    fn test_reorder_skips_deleted_ids() {
        let backend = FakeBackend::default();
        let mut buffer = PendingChanges::new(Some(2));
        buffer.queue_item_reorder(OrderEntry::dense([5, 9, 4])).unwrap();
        buffer.queue_delete(RowKey::Saved(9)).unwrap();

        save(&backend, &mut buffer).unwrap().unwrap();

        assert_eq!(backend.calls(), vec!["delete_item 9".to_string(), "reorder_items 2 [5, 4]".to_string()]);
    }

    #[test]
    fn test_auth_failure_flagged() {
        struct Expired;

        #[async_trait(?Send)]
        impl InventoryBackend for Expired {
            async fn update_table_group(&self, _: u32, _: &TablePatch) -> ApiResult<()> {
                Err(ApiError::Unauthenticated)
            }
            async fn delete_yarn_item(&self, _: u32) -> ApiResult<()> {
                Err(ApiError::Unauthenticated)
            }
            async fn update_yarn_item(&self, _: u32, _: &ItemPatch) -> ApiResult<()> {
                Err(ApiError::Unauthenticated)
            }
            async fn batch_create_yarn_items(&self, _: u32, _: &[YarnItemCreate]) -> ApiResult<()> {
                Err(ApiError::Unauthenticated)
            }
            async fn reorder_yarn_items(&self, _: u32, _: &[OrderEntry]) -> ApiResult<()> {
                Err(ApiError::Unauthenticated)
            }
            async fn reorder_table_groups(&self, _: &[OrderEntry]) -> ApiResult<()> {
                Err(ApiError::Unauthenticated)
            }
        }

        let mut buffer = PendingChanges::new(None);
        buffer.queue_table_reorder(OrderEntry::dense([1, 2]));
        let plan = buffer.begin_commit().unwrap();
        let err = block_on(commit_plan(&Expired, &plan)).unwrap_err();
        assert!(err.unauthenticated);
        assert_eq!(err.touched, vec![QueryKey::TableGroups, QueryKey::Homepage]);
    }

    #[test]
    fn test_touched_keys_deduplicated() {
        let requests = vec![
            CommitRequest::DeleteItem { table_id: 1, item_id: 4 },
            CommitRequest::DeleteItem { table_id: 1, item_id: 5 },
            CommitRequest::ReorderTables { order: vec![] },
        ];
        assert_eq!(
            touched_keys(&requests),
            vec![QueryKey::YarnItems(1), QueryKey::TableGroups, QueryKey::Homepage]
        );
    }
}

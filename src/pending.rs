//! Pending Changes Buffer
//!
//! Staging area for inventory edits. Item and table edits accumulate here
//! and are flushed to the backend by [`crate::commit`] as one batch.
//!
//! A commit takes the current contents as a [`CommitPlan`] and leaves an
//! empty live buffer behind, so edits made while requests are in flight
//! start a new generation instead of mutating the batch being sent. When the
//! batch fails the plan is merged back underneath the newer edits.
//!
//! The effective views stack three layers on the server baseline: the
//! settled plan (accepted, reads not yet refreshed), the in-flight plan and
//! the live edits. Rows keep showing their edited values from the moment
//! Save is pressed until the refreshed baseline replaces them.
//!
//! Application of a batch is at-least-once and non-atomic: requests that
//! succeeded before a sibling failed are not rolled back, and a retry sends
//! the whole restored batch again.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::{OrderEntry, TableGroup, YarnItem, YarnItemCreate};

/// Partial field update for a yarn item
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_on_homepage: Option<bool>,
}

impl ItemPatch {
    pub fn count(value: impl Into<String>) -> Self {
        Self { count: Some(value.into()), ..Default::default() }
    }

    pub fn quality(value: impl Into<String>) -> Self {
        Self { quality: Some(value.into()), ..Default::default() }
    }

    pub fn rate(value: f64) -> Self {
        Self { rate: Some(value), ..Default::default() }
    }

    pub fn show_on_homepage(value: bool) -> Self {
        Self { show_on_homepage: Some(value), ..Default::default() }
    }

    /// Overlay `newer` on top of `self`; fields set in `newer` win
    pub fn merge(&mut self, newer: ItemPatch) {
        if newer.count.is_some() {
            self.count = newer.count;
        }
        if newer.quality.is_some() {
            self.quality = newer.quality;
        }
        if newer.rate.is_some() {
            self.rate = newer.rate;
        }
        if newer.display_order.is_some() {
            self.display_order = newer.display_order;
        }
        if newer.show_on_homepage.is_some() {
            self.show_on_homepage = newer.show_on_homepage;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ItemPatch::default()
    }

    fn apply(&self, item: &mut YarnItem) {
        if let Some(c) = &self.count {
            item.count = c.clone();
        }
        if let Some(q) = &self.quality {
            item.quality = q.clone();
        }
        if let Some(r) = self.rate {
            item.rate = r;
        }
        if let Some(o) = self.display_order {
            item.display_order = o;
        }
        if let Some(s) = self.show_on_homepage {
            item.show_on_homepage = s;
        }
    }
}

/// Partial field update for a table group
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TablePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_on_homepage: Option<bool>,
}

impl TablePatch {
    pub fn merge(&mut self, newer: TablePatch) {
        if newer.table_name.is_some() {
            self.table_name = newer.table_name;
        }
        if newer.display_order.is_some() {
            self.display_order = newer.display_order;
        }
        if newer.show_on_homepage.is_some() {
            self.show_on_homepage = newer.show_on_homepage;
        }
    }

    fn apply(&self, table: &mut TableGroup) {
        if let Some(n) = &self.table_name {
            table.table_name = n.clone();
        }
        if let Some(o) = self.display_order {
            table.display_order = o;
        }
        if let Some(s) = self.show_on_homepage {
            table.show_on_homepage = s;
        }
    }
}

/// A queued create; `draft_id` exists only client-side for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct DraftItem {
    pub draft_id: u32,
    pub payload: YarnItemCreate,
}

/// Identity of a row shown in the items table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    /// Persisted item id
    Saved(u32),
    /// Queued create not yet sent
    Draft(u32),
}

/// One rendered row: server baseline with pending edits applied
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub key: RowKey,
    pub serial_number: Option<u32>,
    pub count: String,
    pub quality: String,
    pub rate: f64,
    pub show_on_homepage: bool,
    /// Has unsaved changes
    pub dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("Select a table first")]
    NoTableSelected,
}

/// One generation of queued edits
#[derive(Debug, Clone, Default, PartialEq)]
struct Edits {
    item_updates: BTreeMap<u32, ItemPatch>,
    item_creates: Vec<DraftItem>,
    item_deletes: BTreeSet<u32>,
    item_reorder: Option<Vec<OrderEntry>>,
    table_updates: BTreeMap<u32, TablePatch>,
    table_reorder: Option<Vec<OrderEntry>>,
}

impl Edits {
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn len(&self) -> usize {
        self.item_updates.len()
            + self.item_creates.len()
            + self.item_deletes.len()
            + self.item_reorder.is_some() as usize
            + self.table_updates.len()
            + self.table_reorder.is_some() as usize
    }

    /// Layer `newer` on top: its fields and orders win, deletes accumulate
    /// and drop updates to the deleted items.
    fn overlay(mut self, newer: Edits) -> Edits {
        for (id, patch) in newer.item_updates {
            self.item_updates.entry(id).or_default().merge(patch);
        }
        self.item_creates.extend(newer.item_creates);
        self.item_deletes.extend(newer.item_deletes);
        let deletes = &self.item_deletes;
        self.item_updates.retain(|id, _| !deletes.contains(id));
        if newer.item_reorder.is_some() {
            self.item_reorder = newer.item_reorder;
        }

        for (id, patch) in newer.table_updates {
            self.table_updates.entry(id).or_default().merge(patch);
        }
        if newer.table_reorder.is_some() {
            self.table_reorder = newer.table_reorder;
        }
        self
    }

    fn clear_items(&mut self) {
        self.item_updates.clear();
        self.item_creates.clear();
        self.item_deletes.clear();
        self.item_reorder = None;
    }

    fn clear_tables(&mut self) {
        self.table_updates.clear();
        self.table_reorder = None;
    }
}

/// The pending-changes buffer for the inventory screen
#[derive(Debug, Clone, Default)]
pub struct PendingChanges {
    table_id: Option<u32>,
    live: Edits,
    /// Generation being sent
    in_flight: Option<CommitPlan>,
    /// Generations the server accepted whose reads have not come back yet
    settled: Option<CommitPlan>,
    next_draft_id: u32,
    /// Bumped on every scope reset; plans from older scopes are not restored
    scope: u64,
}

impl PendingChanges {
    pub fn new(table_id: Option<u32>) -> Self {
        Self { table_id, ..Default::default() }
    }

    pub fn table_id(&self) -> Option<u32> {
        self.table_id
    }

    /// Drop everything and start over for another table
    pub fn reset(&mut self, table_id: Option<u32>) {
        let scope = self.scope + 1;
        let next_draft_id = self.next_draft_id;
        *self = Self { table_id, scope, next_draft_id, ..Default::default() };
    }

    fn require_table(&self) -> Result<u32, BufferError> {
        self.table_id.ok_or(BufferError::NoTableSelected)
    }

    /// Merge `fields` into the item's queued update; empty patches are ignored
    pub fn queue_update(&mut self, item_id: u32, fields: ItemPatch) -> Result<(), BufferError> {
        self.require_table()?;
        if fields.is_empty() || self.live.item_deletes.contains(&item_id) {
            return Ok(());
        }
        self.live.item_updates.entry(item_id).or_default().merge(fields);
        Ok(())
    }

    /// Queue a new item and return its draft id
    pub fn queue_create(&mut self, item: YarnItemCreate) -> Result<u32, BufferError> {
        self.require_table()?;
        let draft_id = self.next_draft_id;
        self.next_draft_id += 1;
        self.live.item_creates.push(DraftItem { draft_id, payload: item });
        Ok(draft_id)
    }

    pub fn queue_batch_create(&mut self, items: Vec<YarnItemCreate>) -> Result<Vec<u32>, BufferError> {
        self.require_table()?;
        items.into_iter().map(|item| self.queue_create(item)).collect()
    }

    /// Update a queued create in place
    pub fn update_draft(&mut self, draft_id: u32, fields: ItemPatch) {
        let Some(draft) = self.live.item_creates.iter_mut().find(|d| d.draft_id == draft_id) else {
            return;
        };
        let p = &mut draft.payload;
        if let Some(c) = fields.count {
            p.count = c;
        }
        if let Some(q) = fields.quality {
            p.quality = q;
        }
        if let Some(r) = fields.rate {
            p.rate = r;
        }
        if let Some(o) = fields.display_order {
            p.display_order = o;
        }
        if let Some(s) = fields.show_on_homepage {
            p.show_on_homepage = s;
        }
    }

    /// Mark a row for deletion. A draft row cancels its own create locally.
    pub fn queue_delete(&mut self, row: RowKey) -> Result<(), BufferError> {
        self.require_table()?;
        match row {
            RowKey::Draft(draft_id) => {
                self.live.item_creates.retain(|d| d.draft_id != draft_id);
            }
            RowKey::Saved(item_id) => {
                self.live.item_updates.remove(&item_id);
                self.live.item_deletes.insert(item_id);
            }
        }
        Ok(())
    }

    /// Replace any pending item order with `order`
    pub fn queue_item_reorder(&mut self, order: Vec<OrderEntry>) -> Result<(), BufferError> {
        self.require_table()?;
        self.live.item_reorder = Some(order);
        Ok(())
    }

    /// Replace any pending table-group order with `order`
    pub fn queue_table_reorder(&mut self, order: Vec<OrderEntry>) {
        self.live.table_reorder = Some(order);
    }

    pub fn queue_table_update(&mut self, table_id: u32, fields: TablePatch) {
        self.live.table_updates.entry(table_id).or_default().merge(fields);
    }

    /// Drop queued edits aimed at a table group that no longer exists.
    /// A pending table order loses the id and is renumbered densely.
    pub fn forget_table(&mut self, table_id: u32) {
        self.live.table_updates.remove(&table_id);
        if let Some(order) = self.live.table_reorder.take() {
            let mut kept: Vec<OrderEntry> = order.into_iter().filter(|e| e.id != table_id).collect();
            kept.sort_by_key(|e| e.display_order);
            if !kept.is_empty() {
                self.live.table_reorder = Some(OrderEntry::dense(kept.into_iter().map(|e| e.id)));
            }
        }
    }

    /// Edits queued since the last commit started
    pub fn is_dirty(&self) -> bool {
        !self.live.is_empty()
    }

    /// Edits not yet confirmed by the server, in flight ones included
    pub fn has_unsaved(&self) -> bool {
        self.is_dirty() || self.in_flight.is_some()
    }

    pub fn is_committing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of unconfirmed edits, for the save button badge
    pub fn change_count(&self) -> usize {
        self.live.len() + self.in_flight.as_ref().map_or(0, |p| p.edits.len())
    }

    pub fn pending_update(&self, item_id: u32) -> Option<&ItemPatch> {
        self.live.item_updates.get(&item_id)
    }

    pub fn pending_creates(&self) -> &[DraftItem] {
        &self.live.item_creates
    }

    pub fn pending_deletes(&self) -> &BTreeSet<u32> {
        &self.live.item_deletes
    }

    pub fn pending_item_reorder(&self) -> Option<&[OrderEntry]> {
        self.live.item_reorder.as_deref()
    }

    pub fn pending_table_update(&self, table_id: u32) -> Option<&TablePatch> {
        self.live.table_updates.get(&table_id)
    }

    pub fn pending_table_reorder(&self) -> Option<&[OrderEntry]> {
        self.live.table_reorder.as_deref()
    }

    /// Move the live edits into a plan, leaving a fresh generation. The plan
    /// stays visible in the effective views until it settles.
    ///
    /// Returns `None` when nothing is queued or a commit is already running.
    pub fn begin_commit(&mut self) -> Option<CommitPlan> {
        if self.in_flight.is_some() || !self.is_dirty() {
            return None;
        }
        let plan = CommitPlan {
            table_id: self.table_id,
            scope: self.scope,
            edits: std::mem::take(&mut self.live),
        };
        self.in_flight = Some(plan.clone());
        Some(plan)
    }

    /// Settle a commit started with [`begin_commit`](Self::begin_commit).
    ///
    /// On success the plan is kept as the settled layer until
    /// [`items_reloaded`](Self::items_reloaded) and
    /// [`tables_reloaded`](Self::tables_reloaded) report fresh server data.
    /// On failure it is merged back beneath any edits queued since, so the
    /// buffer reads as it did before the commit plus those newer edits.
    pub fn finish_commit(&mut self, plan: CommitPlan, succeeded: bool) {
        if self.in_flight.take().is_none() || plan.scope != self.scope {
            return;
        }
        let CommitPlan { table_id, scope, edits } = plan;
        if succeeded {
            let edits = match self.settled.take() {
                Some(older) => older.edits.overlay(edits),
                None => edits,
            };
            self.settled = Some(CommitPlan { table_id, scope, edits });
        } else {
            let newer = std::mem::take(&mut self.live);
            self.live = edits.overlay(newer);
        }
    }

    /// The item baseline was replaced with fresh server data
    pub fn items_reloaded(&mut self) {
        self.trim_settled(Edits::clear_items);
    }

    /// The table baseline was replaced with fresh server data
    pub fn tables_reloaded(&mut self) {
        self.trim_settled(Edits::clear_tables);
    }

    fn trim_settled(&mut self, clear: fn(&mut Edits)) {
        if let Some(plan) = self.settled.as_mut() {
            clear(&mut plan.edits);
            if plan.edits.is_empty() {
                self.settled = None;
            }
        }
    }

    /// In-flight edits beneath the live ones
    fn unsaved(&self) -> Edits {
        match &self.in_flight {
            Some(plan) => plan.edits.clone().overlay(self.live.clone()),
            None => self.live.clone(),
        }
    }

    /// Everything the screen shows on top of the server baseline
    fn shown(&self) -> Edits {
        match &self.settled {
            Some(plan) => plan.edits.clone().overlay(self.unsaved()),
            None => self.unsaved(),
        }
    }

    /// Items as they will look after commit, in display order.
    /// Deleted rows are hidden and drafts follow the saved rows.
    pub fn effective_items(&self, baseline: &[YarnItem]) -> Vec<RowView> {
        let shown = self.shown();
        let unsaved = self.unsaved();
        let unsaved_drafts: BTreeSet<u32> = unsaved.item_creates.iter().map(|d| d.draft_id).collect();

        let mut saved: Vec<YarnItem> = baseline
            .iter()
            .filter(|item| !shown.item_deletes.contains(&item.id))
            .cloned()
            .collect();
        for item in saved.iter_mut() {
            if let Some(patch) = shown.item_updates.get(&item.id) {
                patch.apply(item);
            }
        }
        sort_by_order(&mut saved, shown.item_reorder.as_deref(), |i| i.id, |i| i.display_order);

        let mut rows: Vec<RowView> = saved
            .into_iter()
            .map(|item| RowView {
                key: RowKey::Saved(item.id),
                serial_number: item.serial_number,
                dirty: unsaved.item_updates.contains_key(&item.id),
                count: item.count,
                quality: item.quality,
                rate: item.rate,
                show_on_homepage: item.show_on_homepage,
            })
            .collect();

        rows.extend(shown.item_creates.into_iter().map(|d| RowView {
            key: RowKey::Draft(d.draft_id),
            serial_number: None,
            dirty: unsaved_drafts.contains(&d.draft_id),
            count: d.payload.count,
            quality: d.payload.quality,
            rate: d.payload.rate,
            show_on_homepage: d.payload.show_on_homepage,
        }));
        rows
    }

    /// Table groups with pending renames and order applied
    pub fn effective_tables(&self, baseline: &[TableGroup]) -> Vec<TableGroup> {
        let shown = self.shown();
        let mut tables: Vec<TableGroup> = baseline.to_vec();
        for table in tables.iter_mut() {
            if let Some(patch) = shown.table_updates.get(&table.id) {
                patch.apply(table);
            }
        }
        sort_by_order(&mut tables, shown.table_reorder.as_deref(), |t| t.id, |t| t.display_order);
        tables
    }
}

/// Sort by a pending order when one exists, else by the server ordering key.
/// Ids missing from the pending order keep their relative position at the end.
fn sort_by_order<T>(
    rows: &mut [T],
    order: Option<&[OrderEntry]>,
    id: impl Fn(&T) -> u32,
    display_order: impl Fn(&T) -> i32,
) {
    match order {
        Some(order) => {
            let rank: BTreeMap<u32, i32> = order.iter().map(|e| (e.id, e.display_order)).collect();
            rows.sort_by_key(|row| (rank.get(&id(row)).copied().unwrap_or(i32::MAX), display_order(row)));
        }
        None => rows.sort_by_key(|row| display_order(row)),
    }
}

/// A captured generation of the buffer, ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct CommitPlan {
    table_id: Option<u32>,
    scope: u64,
    edits: Edits,
}

/// One network request of a commit
#[derive(Debug, Clone, PartialEq)]
pub enum CommitRequest {
    UpdateTable { table_id: u32, patch: TablePatch },
    DeleteItem { table_id: u32, item_id: u32 },
    UpdateItem { table_id: u32, item_id: u32, patch: ItemPatch },
    CreateItems { table_id: u32, items: Vec<YarnItemCreate> },
    ReorderItems { table_id: u32, order: Vec<OrderEntry> },
    ReorderTables { order: Vec<OrderEntry> },
}

impl CommitRequest {
    /// Short label used in aggregate error messages
    pub fn describe(&self) -> String {
        match self {
            CommitRequest::UpdateTable { table_id, .. } => format!("update table #{table_id}"),
            CommitRequest::DeleteItem { item_id, .. } => format!("delete item #{item_id}"),
            CommitRequest::UpdateItem { item_id, .. } => format!("update item #{item_id}"),
            CommitRequest::CreateItems { items, .. } => format!("create {} item(s)", items.len()),
            CommitRequest::ReorderItems { .. } => "reorder items".to_string(),
            CommitRequest::ReorderTables { .. } => "reorder tables".to_string(),
        }
    }
}

impl CommitPlan {
    pub fn table_id(&self) -> Option<u32> {
        self.table_id
    }

    /// Expand the plan into the requests a commit sends.
    ///
    /// The item order excludes ids being deleted and is renumbered densely,
    /// so no reorder refers to an item removed by the same batch.
    pub fn requests(&self) -> Vec<CommitRequest> {
        let edits = &self.edits;
        let mut out = Vec::new();

        for (table_id, patch) in &edits.table_updates {
            out.push(CommitRequest::UpdateTable { table_id: *table_id, patch: patch.clone() });
        }

        if let Some(table_id) = self.table_id {
            for item_id in &edits.item_deletes {
                out.push(CommitRequest::DeleteItem { table_id, item_id: *item_id });
            }
            for (item_id, patch) in &edits.item_updates {
                if edits.item_deletes.contains(item_id) || patch.is_empty() {
                    continue;
                }
                out.push(CommitRequest::UpdateItem { table_id, item_id: *item_id, patch: patch.clone() });
            }
            if !edits.item_creates.is_empty() {
                out.push(CommitRequest::CreateItems {
                    table_id,
                    items: edits.item_creates.iter().map(|d| d.payload.clone()).collect(),
                });
            }
            if let Some(order) = &edits.item_reorder {
                let mut kept: Vec<&OrderEntry> =
                    order.iter().filter(|e| !edits.item_deletes.contains(&e.id)).collect();
                kept.sort_by_key(|e| e.display_order);
                let order = OrderEntry::dense(kept.into_iter().map(|e| e.id));
                if !order.is_empty() {
                    out.push(CommitRequest::ReorderItems { table_id, order });
                }
            }
        }

        if let Some(order) = &edits.table_reorder {
            out.push(CommitRequest::ReorderTables { order: order.clone() });
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(id: u32, display_order: i32) -> YarnItem {
        YarnItem {
            id,
            serial_number: Some(display_order as u32 + 1),
            count: format!("{}s", id * 10),
            quality: "Combed".to_string(),
            rate: 100.0 + id as f64,
            display_order,
            show_on_homepage: true,
            created_at: "2026-10-01T09:00:00".to_string(),
            updated_at: None,
        }
    }

    fn make_create(count: &str) -> YarnItemCreate {
        YarnItemCreate {
            count: count.to_string(),
            quality: "Carded".to_string(),
            rate: 95.0,
            display_order: 10,
            show_on_homepage: true,
        }
    }

    #[test]
    fn test_update_merges_disjoint_fields() {
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_update(7, ItemPatch::rate(120.0)).unwrap();
        buf.queue_update(7, ItemPatch::quality("Combed")).unwrap();

        let patch = buf.pending_update(7).unwrap();
        assert_eq!(patch.rate, Some(120.0));
        assert_eq!(patch.quality.as_deref(), Some("Combed"));
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_update_later_value_wins() {
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_update(7, ItemPatch { rate: Some(120.0), count: Some("30s".into()), ..Default::default() }).unwrap();
        buf.queue_update(7, ItemPatch::rate(130.0)).unwrap();

        let patch = buf.pending_update(7).unwrap();
        assert_eq!(patch.rate, Some(130.0));
        assert_eq!(patch.count.as_deref(), Some("30s"));
    }

    #[test]
    fn test_item_ops_require_table() {
        let mut buf = PendingChanges::new(None);
        assert_eq!(buf.queue_update(1, ItemPatch::rate(1.0)), Err(BufferError::NoTableSelected));
        assert_eq!(buf.queue_create(make_create("20s")), Err(BufferError::NoTableSelected));
        // Table edits need no selection
        buf.queue_table_reorder(OrderEntry::dense([2, 1]));
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_reorder_replaces_previous() {
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_item_reorder(OrderEntry::dense([1, 2, 3])).unwrap();
        let second = OrderEntry::dense([3, 1]);
        buf.queue_item_reorder(second.clone()).unwrap();
        assert_eq!(buf.pending_item_reorder(), Some(second.as_slice()));

        buf.queue_table_reorder(OrderEntry::dense([5, 6]));
        buf.queue_table_reorder(OrderEntry::dense([6, 5]));
        assert_eq!(buf.pending_table_reorder(), Some(OrderEntry::dense([6, 5]).as_slice()));
    }

    #[test]
    fn test_table_update_merges() {
        let mut buf = PendingChanges::new(None);
        buf.queue_table_update(3, TablePatch { table_name: Some("Viscose".into()), ..Default::default() });
        buf.queue_table_update(3, TablePatch { show_on_homepage: Some(false), ..Default::default() });
        let patch = buf.pending_table_update(3).unwrap();
        assert_eq!(patch.table_name.as_deref(), Some("Viscose"));
        assert_eq!(patch.show_on_homepage, Some(false));
    }

    #[test]
    fn test_forget_table() {
        let mut buf = PendingChanges::new(None);
        buf.queue_table_update(3, TablePatch { table_name: Some("Old".into()), ..Default::default() });
        buf.queue_table_reorder(OrderEntry::dense([4, 3, 8]));
        buf.forget_table(3);

        assert!(buf.pending_table_update(3).is_none());
        assert_eq!(buf.pending_table_reorder(), Some(OrderEntry::dense([4, 8]).as_slice()));

        buf.queue_table_reorder(OrderEntry::dense([4]));
        buf.forget_table(4);
        assert!(!buf.is_dirty());
    }

    #[test]
    fn test_delete_of_draft_cancels_create() {
        let mut buf = PendingChanges::new(Some(1));
        let draft = buf.queue_create(make_create("40s")).unwrap();
        buf.queue_delete(RowKey::Draft(draft)).unwrap();

        assert!(buf.pending_creates().is_empty());
        assert!(buf.pending_deletes().is_empty());
        assert!(!buf.is_dirty());
    }

    #[test]
    fn test_delete_drops_pending_update() {
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_update(9, ItemPatch::rate(50.0)).unwrap();
        buf.queue_delete(RowKey::Saved(9)).unwrap();
        buf.queue_update(9, ItemPatch::rate(60.0)).unwrap();

        assert!(buf.pending_update(9).is_none());
        assert!(buf.pending_deletes().contains(&9));
    }

    #[test]
    fn test_batch_create_assigns_distinct_drafts() {
        let mut buf = PendingChanges::new(Some(1));
        let ids = buf.queue_batch_create(vec![make_create("20s"), make_create("30s")]).unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(buf.change_count(), 2);
    }

    #[test]
    fn test_begin_commit_on_empty_buffer() {
        let mut buf = PendingChanges::new(Some(1));
        assert!(buf.begin_commit().is_none());
        assert!(!buf.is_dirty());
        assert!(!buf.is_committing());
    }

    #[test]
    fn test_begin_commit_starts_fresh_generation() {
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_update(7, ItemPatch::rate(120.0)).unwrap();
        let plan = buf.begin_commit().unwrap();

        assert!(!buf.is_dirty());
        assert!(buf.is_committing());
        assert!(buf.begin_commit().is_none());

        // Edit during the in-flight commit goes to the new generation
        buf.queue_update(8, ItemPatch::rate(10.0)).unwrap();
        buf.finish_commit(plan, true);

        assert!(!buf.is_committing());
        assert!(buf.pending_update(7).is_none());
        assert_eq!(buf.pending_update(8).unwrap().rate, Some(10.0));
    }

    #[test]
    fn test_failed_commit_restores_beneath_newer_edits() {
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_update(7, ItemPatch { rate: Some(120.0), quality: Some("Combed".into()), ..Default::default() }).unwrap();
        buf.queue_create(make_create("40s")).unwrap();
        buf.queue_delete(RowKey::Saved(9)).unwrap();
        buf.queue_item_reorder(OrderEntry::dense([7, 8])).unwrap();
        buf.queue_table_reorder(OrderEntry::dense([1, 2]));
        let before = buf.clone();

        let plan = buf.begin_commit().unwrap();
        buf.finish_commit(plan, false);
        assert_eq!(buf.pending_update(7), before.pending_update(7));
        assert_eq!(buf.pending_creates(), before.pending_creates());
        assert_eq!(buf.pending_deletes(), before.pending_deletes());
        assert_eq!(buf.pending_item_reorder(), before.pending_item_reorder());
        assert_eq!(buf.pending_table_reorder(), before.pending_table_reorder());
        assert!(buf.is_dirty());

        // Newer edits made during a failing commit win per field
        let plan = buf.begin_commit().unwrap();
        buf.queue_update(7, ItemPatch::rate(125.0)).unwrap();
        buf.queue_item_reorder(OrderEntry::dense([8, 7])).unwrap();
        buf.finish_commit(plan, false);

        let patch = buf.pending_update(7).unwrap();
        assert_eq!(patch.rate, Some(125.0));
        assert_eq!(patch.quality.as_deref(), Some("Combed"));
        assert_eq!(buf.pending_item_reorder(), Some(OrderEntry::dense([8, 7]).as_slice()));
    }

    #[test]
    fn test_plan_from_old_scope_not_restored() {
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_update(7, ItemPatch::rate(120.0)).unwrap();
        let plan = buf.begin_commit().unwrap();
        buf.reset(Some(2));
        buf.finish_commit(plan, false);

        assert!(!buf.is_dirty());
        assert_eq!(buf.table_id(), Some(2));
    }

    #[test]
    fn test_requests_exclude_deleted_from_reorder() {
        let mut buf = PendingChanges::new(Some(4));
        buf.queue_item_reorder(vec![
            OrderEntry { id: 3, display_order: 0 },
            OrderEntry { id: 9, display_order: 1 },
            OrderEntry { id: 1, display_order: 2 },
        ]).unwrap();
        buf.queue_delete(RowKey::Saved(9)).unwrap();

        let plan = buf.begin_commit().unwrap();
        let requests = plan.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.contains(&CommitRequest::DeleteItem { table_id: 4, item_id: 9 }));
        assert!(requests.contains(&CommitRequest::ReorderItems {
            table_id: 4,
            order: OrderEntry::dense([3, 1]),
        }));
    }

    #[test]
    fn test_requests_one_per_class() {
        let mut buf = PendingChanges::new(Some(4));
        buf.queue_table_update(4, TablePatch { table_name: Some("PC".into()), ..Default::default() });
        buf.queue_table_update(5, TablePatch { show_on_homepage: Some(false), ..Default::default() });
        buf.queue_update(1, ItemPatch::rate(1.0)).unwrap();
        buf.queue_update(2, ItemPatch::rate(2.0)).unwrap();
        buf.queue_batch_create(vec![make_create("a"), make_create("b")]).unwrap();
        buf.queue_table_reorder(OrderEntry::dense([5, 4]));

        let requests = buf.begin_commit().unwrap().requests();
        let creates = requests.iter().filter(|r| matches!(r, CommitRequest::CreateItems { .. })).count();
        let updates = requests.iter().filter(|r| matches!(r, CommitRequest::UpdateItem { .. })).count();
        let tables = requests.iter().filter(|r| matches!(r, CommitRequest::UpdateTable { .. })).count();
        assert_eq!(creates, 1);
        assert_eq!(updates, 2);
        assert_eq!(tables, 2);
        assert_eq!(requests.len(), 6);
    }

    #[test]
    fn test_effective_items_view() {
        let baseline = vec![make_item(1, 0), make_item(2, 1), make_item(3, 2)];
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_update(2, ItemPatch::rate(150.0)).unwrap();
        buf.queue_delete(RowKey::Saved(1)).unwrap();
        buf.queue_item_reorder(OrderEntry::dense([3, 2])).unwrap();
        let draft = buf.queue_create(make_create("60s")).unwrap();

        let rows = buf.effective_items(&baseline);
        let keys: Vec<RowKey> = rows.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![RowKey::Saved(3), RowKey::Saved(2), RowKey::Draft(draft)]);
        assert_eq!(rows[1].rate, 150.0);
        assert!(rows[1].dirty);
        assert!(!rows[0].dirty);
    }

    #[test]
    fn test_effective_tables_view() {
        let table = |id: u32, order: i32| TableGroup {
            id,
            table_name: format!("T{id}"),
            display_order: order,
            show_on_homepage: true,
            item_count: 0,
            created_at: String::new(),
            updated_at: None,
        };
        let baseline = vec![table(1, 0), table(2, 1)];
        let mut buf = PendingChanges::new(None);
        buf.queue_table_update(1, TablePatch { table_name: Some("Renamed".into()), ..Default::default() });
        buf.queue_table_reorder(OrderEntry::dense([2, 1]));

        let tables = buf.effective_tables(&baseline);
        assert_eq!(tables[0].id, 2);
        assert_eq!(tables[1].table_name, "Renamed");
    }

    #[test]
    fn test_empty_patch_ignored() {
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_update(7, ItemPatch::default()).unwrap();
        assert!(!buf.is_dirty());
        assert!(buf.begin_commit().is_none());
    }

    #[test]
    fn test_in_flight_edits_stay_visible() {
        let baseline = vec![make_item(7, 0), make_item(9, 1)];
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_update(7, ItemPatch::rate(120.0)).unwrap();
        buf.queue_delete(RowKey::Saved(9)).unwrap();
        let draft = buf.queue_create(make_create("40s")).unwrap();

        let plan = buf.begin_commit().unwrap();
        assert!(!buf.is_dirty());
        assert!(buf.has_unsaved());
        assert_eq!(buf.change_count(), 3);

        let rows = buf.effective_items(&baseline);
        let keys: Vec<RowKey> = rows.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![RowKey::Saved(7), RowKey::Draft(draft)]);
        assert_eq!(rows[0].rate, 120.0);
        assert!(rows[0].dirty);

        // Accepted but not yet reloaded: values still shown, nothing unsaved
        buf.finish_commit(plan, true);
        assert!(!buf.has_unsaved());
        let rows = buf.effective_items(&baseline);
        assert_eq!(rows[0].rate, 120.0);
        assert!(!rows[0].dirty);
        assert_eq!(rows.len(), 2);

        let mut refreshed = make_item(7, 0);
        refreshed.rate = 120.0;
        let mut created = make_item(11, 1);
        created.count = "40s".into();
        buf.items_reloaded();
        let rows = buf.effective_items(&[refreshed, created]);
        let keys: Vec<RowKey> = rows.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![RowKey::Saved(7), RowKey::Saved(11)]);
    }

    #[test]
    fn test_newer_edit_over_in_flight_value() {
        let baseline = vec![make_item(7, 0)];
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_update(7, ItemPatch { rate: Some(120.0), quality: Some("Carded".into()), ..Default::default() }).unwrap();
        let _plan = buf.begin_commit().unwrap();
        buf.queue_update(7, ItemPatch::rate(130.0)).unwrap();

        let rows = buf.effective_items(&baseline);
        assert_eq!(rows[0].rate, 130.0);
        assert_eq!(rows[0].quality, "Carded");
    }

    #[test]
    fn test_settled_tables_kept_until_reload() {
        let table = |id: u32, order: i32| TableGroup {
            id,
            table_name: format!("T{id}"),
            display_order: order,
            show_on_homepage: true,
            item_count: 0,
            created_at: String::new(),
            updated_at: None,
        };
        let mut buf = PendingChanges::new(Some(1));
        buf.queue_table_update(1, TablePatch { table_name: Some("Renamed".into()), ..Default::default() });
        buf.queue_update(7, ItemPatch::rate(1.0)).unwrap();
        let plan = buf.begin_commit().unwrap();
        buf.finish_commit(plan, true);

        // Item reload alone leaves the table rename in place
        buf.items_reloaded();
        assert_eq!(buf.effective_tables(&[table(1, 0)])[0].table_name, "Renamed");

        buf.tables_reloaded();
        assert_eq!(buf.effective_tables(&[table(1, 0)])[0].table_name, "T1");
    }

    #[test]
    fn test_update_draft_in_place() {
        let mut buf = PendingChanges::new(Some(1));
        let draft = buf.queue_create(make_create("20s")).unwrap();
        buf.update_draft(draft, ItemPatch::rate(99.5));
        assert_eq!(buf.pending_creates()[0].payload.rate, 99.5);
    }
}

//! Table group and yarn item endpoints

use serde::Serialize;

use super::{ApiClient, Method};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    OrderEntry, TableGroup, TableGroupCreate, YarnItem, YarnItemCreate, YarnItemsEnvelope,
};
use crate::pending::{ItemPatch, TablePatch};

#[derive(Serialize)]
struct TableOrderBody<'a> {
    tables: &'a [OrderEntry],
}

#[derive(Serialize)]
struct ItemOrderBody<'a> {
    items: &'a [OrderEntry],
}

#[derive(Serialize)]
struct BatchCreateBody<'a> {
    items: &'a [YarnItemCreate],
}

fn item_path(table_id: u32) -> String {
    format!("/admin/table-groups/{table_id}/items")
}

impl ApiClient {
    // ========================
    // Table groups
    // ========================

    pub async fn list_table_groups(&self) -> ApiResult<Vec<TableGroup>> {
        self.get("/admin/table-groups").await.map_err(|e: ApiError| e.context("fetch table groups"))
    }

    pub async fn create_table_group(&self, table: &TableGroupCreate) -> ApiResult<TableGroup> {
        self.post("/admin/table-groups", table)
            .await
            .map_err(|e: ApiError| e.context("create table group"))
    }

    pub async fn update_table_group(&self, table_id: u32, patch: &TablePatch) -> ApiResult<TableGroup> {
        self.put(&format!("/admin/table-groups/{table_id}"), patch)
            .await
            .map_err(|e: ApiError| e.context("update table group"))
    }

    pub async fn delete_table_group(&self, table_id: u32) -> ApiResult<()> {
        self.delete(&format!("/admin/table-groups/{table_id}"))
            .await
            .map_err(|e| e.context("delete table group"))
    }

    pub async fn reorder_table_groups(&self, order: &[OrderEntry]) -> ApiResult<()> {
        self.send(Method::Put, "/admin/table-groups/reorder", &TableOrderBody { tables: order })
            .await
            .map_err(|e| e.context("reorder table groups"))
    }

    // ========================
    // Yarn items
    // ========================

    pub async fn list_yarn_items(&self, table_id: u32) -> ApiResult<Vec<YarnItem>> {
        self.get::<YarnItemsEnvelope>(&item_path(table_id))
            .await
            .map(|env| env.items)
            .map_err(|e| e.context("fetch yarn items"))
    }

    pub async fn batch_create_yarn_items(
        &self,
        table_id: u32,
        items: &[YarnItemCreate],
    ) -> ApiResult<Vec<YarnItem>> {
        self.post(&format!("{}/batch", item_path(table_id)), &BatchCreateBody { items })
            .await
            .map_err(|e: ApiError| e.context("create yarn items"))
    }

    pub async fn update_yarn_item(&self, item_id: u32, patch: &ItemPatch) -> ApiResult<YarnItem> {
        self.put(&format!("/admin/yarn-items/{item_id}"), patch)
            .await
            .map_err(|e: ApiError| e.context("update yarn item"))
    }

    pub async fn delete_yarn_item(&self, item_id: u32) -> ApiResult<()> {
        self.delete(&format!("/admin/yarn-items/{item_id}"))
            .await
            .map_err(|e| e.context("delete yarn item"))
    }

    pub async fn reorder_yarn_items(&self, table_id: u32, order: &[OrderEntry]) -> ApiResult<()> {
        self.send(Method::Put, &format!("{}/reorder", item_path(table_id)), &ItemOrderBody { items: order })
            .await
            .map_err(|e| e.context("reorder yarn items"))
    }
}

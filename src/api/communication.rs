//! WhatsApp group and broadcast endpoints

use super::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    BroadcastHistoryPage, BroadcastRequest, BroadcastResponse, WhatsAppGroup, WhatsAppGroupCreate,
    WhatsAppGroupUpdate,
};

/// History entries shown on the broadcast page
pub const HISTORY_LIMIT: u32 = 10;

impl ApiClient {
    pub async fn list_whatsapp_groups(&self) -> ApiResult<Vec<WhatsAppGroup>> {
        self.get("/admin/whatsapp/groups")
            .await
            .map_err(|e: ApiError| e.context("fetch WhatsApp groups"))
    }

    pub async fn create_whatsapp_group(&self, group: &WhatsAppGroupCreate) -> ApiResult<WhatsAppGroup> {
        self.post("/admin/whatsapp/groups", group)
            .await
            .map_err(|e: ApiError| e.context("create WhatsApp group"))
    }

    pub async fn update_whatsapp_group(&self, group_id: u32, update: &WhatsAppGroupUpdate) -> ApiResult<WhatsAppGroup> {
        self.put(&format!("/admin/whatsapp/groups/{group_id}"), update)
            .await
            .map_err(|e: ApiError| e.context("update WhatsApp group"))
    }

    pub async fn delete_whatsapp_group(&self, group_id: u32) -> ApiResult<()> {
        self.delete(&format!("/admin/whatsapp/groups/{group_id}"))
            .await
            .map_err(|e| e.context("delete WhatsApp group"))
    }

    pub async fn send_broadcast(&self, request: &BroadcastRequest) -> ApiResult<BroadcastResponse> {
        if request.group_ids.is_empty() {
            return Err(ApiError::Validation("Select at least one group".into()));
        }
        self.post("/admin/broadcast", request)
            .await
            .map_err(|e: ApiError| e.context("send broadcast"))
    }

    pub async fn broadcast_history(&self, limit: u32) -> ApiResult<BroadcastHistoryPage> {
        self.get(&format!("/admin/broadcast/history?limit={limit}"))
            .await
            .map_err(|e: ApiError| e.context("fetch broadcast history"))
    }
}

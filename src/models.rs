//! Frontend Models
//!
//! Data structures matching backend entities.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;
use crate::format::extract_invite_id;

/// Rates come back as JSON numbers from the public endpoint and as decimal
/// strings from the admin endpoints.
fn de_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRate {
        Number(f64),
        Text(String),
    }

    match RawRate::deserialize(deserializer)? {
        RawRate::Number(n) => Ok(n),
        RawRate::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

// ========================
// Inventory
// ========================

/// Table group (matches backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGroup {
    pub id: u32,
    pub table_name: String,
    pub display_order: i32,
    pub show_on_homepage: bool,
    #[serde(default)]
    pub item_count: u32,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Yarn item row (matches backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YarnItem {
    pub id: u32,
    /// Assigned by the server; admin listings may omit it
    #[serde(default)]
    pub serial_number: Option<u32>,
    pub count: String,
    pub quality: String,
    #[serde(deserialize_with = "de_rate")]
    pub rate: f64,
    pub display_order: i32,
    pub show_on_homepage: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableGroupCreate {
    pub table_name: String,
    pub display_order: i32,
    pub show_on_homepage: bool,
}

/// Payload for a new yarn item, used both for single and batch creates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YarnItemCreate {
    pub count: String,
    pub quality: String,
    pub rate: f64,
    pub display_order: i32,
    pub show_on_homepage: bool,
}

/// One `{id, display_order}` pair of a reorder request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: u32,
    pub display_order: i32,
}

impl OrderEntry {
    /// Dense zero-based ordering for ids in display sequence
    pub fn dense(ids: impl IntoIterator<Item = u32>) -> Vec<OrderEntry> {
        ids.into_iter()
            .enumerate()
            .map(|(idx, id)| OrderEntry { id, display_order: idx as i32 })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct YarnItemsEnvelope {
    #[serde(default)]
    pub items: Vec<YarnItem>,
}

// ========================
// Public homepage
// ========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YarnItemPublic {
    pub id: u32,
    pub serial_number: u32,
    pub count: String,
    pub quality: String,
    #[serde(deserialize_with = "de_rate")]
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGroupWithItems {
    pub id: u32,
    pub table_name: String,
    pub display_order: i32,
    #[serde(default)]
    pub items: Vec<YarnItemPublic>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomepageData {
    #[serde(default, deserialize_with = "de_null_as_empty")]
    pub tables: Vec<TableGroupWithItems>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

fn de_null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ========================
// WhatsApp groups
// ========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatsAppGroup {
    pub id: u32,
    pub group_name: String,
    pub group_invite_id: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatsAppGroupCreate {
    pub group_name: String,
    pub group_invite_link: String,
    pub is_active: bool,
}

impl WhatsAppGroupCreate {
    /// Check the form fields; the link must carry a WhatsApp invite code
    pub fn validated(group_name: &str, invite_link: &str, is_active: bool) -> Result<Self, ApiError> {
        let group_name = group_name.trim();
        let invite_link = invite_link.trim();
        if group_name.is_empty() || invite_link.is_empty() {
            return Err(ApiError::Validation("Please fill in all fields".into()));
        }
        if extract_invite_id(invite_link).is_none() {
            return Err(ApiError::Validation(
                "Invalid WhatsApp group invite link. Please use a valid link like: https://chat.whatsapp.com/ABC123".into(),
            ));
        }
        Ok(Self { group_name: group_name.to_string(), group_invite_link: invite_link.to_string(), is_active })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WhatsAppGroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ========================
// Broadcasts
// ========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    AutoGenerate,
    Custom,
}

impl MessageType {
    pub fn label(&self) -> &'static str {
        match self {
            MessageType::AutoGenerate => "Auto-generated",
            MessageType::Custom => "Custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastStatus {
    Pending,
    Scheduled,
    Sent,
    Failed,
}

impl BroadcastStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastStatus::Pending => "pending",
            BroadcastStatus::Scheduled => "scheduled",
            BroadcastStatus::Sent => "sent",
            BroadcastStatus::Failed => "failed",
        }
    }

    /// CSS modifier for the status badge
    pub fn badge_class(&self) -> &'static str {
        match self {
            BroadcastStatus::Sent => "badge badge-sent",
            BroadcastStatus::Scheduled => "badge badge-scheduled",
            BroadcastStatus::Failed => "badge badge-failed",
            BroadcastStatus::Pending => "badge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastRequest {
    pub group_ids: Vec<u32>,
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_group_ids: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
    pub send_immediately: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_hour: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_minute: Option<u8>,
}

impl BroadcastRequest {
    /// Immediate auto-generated broadcast of the given tables
    pub fn auto_generate(group_ids: Vec<u32>, table_group_ids: Vec<u32>) -> Self {
        Self {
            group_ids,
            message_type: MessageType::AutoGenerate,
            table_group_ids: Some(table_group_ids),
            custom_message: None,
            send_immediately: true,
            scheduled_hour: None,
            scheduled_minute: None,
        }
    }

    /// Immediate custom-text broadcast
    pub fn custom(group_ids: Vec<u32>, message: String) -> Self {
        Self {
            group_ids,
            message_type: MessageType::Custom,
            table_group_ids: None,
            custom_message: Some(message),
            send_immediately: true,
            scheduled_hour: None,
            scheduled_minute: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BroadcastResult {
    #[serde(default)]
    pub history_id: Option<u32>,
    pub group_id: u32,
    pub group_name: String,
    pub status: String,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BroadcastResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub message: String,
    #[serde(default)]
    pub results: Vec<BroadcastResult>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BroadcastHistory {
    pub id: u32,
    pub group_id: u32,
    pub group_name: String,
    pub message_preview: String,
    pub message_type: MessageType,
    #[serde(default)]
    pub table_groups: Option<Vec<String>>,
    pub scheduled_for: String,
    #[serde(default)]
    pub sent_at: Option<String>,
    pub status: BroadcastStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BroadcastHistoryPage {
    #[serde(default)]
    pub history: Vec<BroadcastHistory>,
    #[serde(default)]
    pub total: u32,
}

// ========================
// Auth
// ========================

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifyResponse {
    pub email: String,
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_accepts_decimal_string() {
        let json = r#"{
            "id": 7, "count": "30/1", "quality": "Combed", "rate": "120.50",
            "display_order": 0, "show_on_homepage": true,
            "created_at": "2026-10-01T09:00:00", "table_group_id": 2
        }"#;
        let item: YarnItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.rate, 120.5);
        assert_eq!(item.serial_number, None);
        assert_eq!(item.updated_at, None);
    }

    #[test]
    fn test_homepage_null_tables() {
        let data: HomepageData = serde_json::from_str(r#"{"tables": null, "last_updated": null}"#).unwrap();
        assert!(data.tables.is_empty());
        assert!(data.last_updated.is_none());

        let data: HomepageData = serde_json::from_str("{}").unwrap();
        assert!(data.tables.is_empty());
    }

    #[test]
    fn test_broadcast_request_shape() {
        let req = BroadcastRequest::auto_generate(vec![1, 2], vec![5]);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["message_type"], "auto_generate");
        assert_eq!(value["table_group_ids"], serde_json::json!([5]));
        assert!(value.get("custom_message").is_none());
        assert!(value.get("scheduled_hour").is_none());
    }

    #[test]
    fn test_history_status_parsing() {
        let json = r#"{
            "id": 1, "group_id": 3, "group_name": "Buyers", "message_preview": "Rates...",
            "message_type": "custom", "scheduled_for": "2026-10-01T09:00:00",
            "status": "failed", "error_message": "timeout", "created_at": "2026-10-01T09:00:00"
        }"#;
        let entry: BroadcastHistory = serde_json::from_str(json).unwrap();
        assert_eq!(entry.status, BroadcastStatus::Failed);
        assert_eq!(entry.message_type, MessageType::Custom);
        assert_eq!(entry.table_groups, None);
    }

    #[test]
    fn test_group_form_validation() {
        let ok = WhatsAppGroupCreate::validated(" Buyers ", "https://chat.whatsapp.com/AbC123", true).unwrap();
        assert_eq!(ok.group_name, "Buyers");
        assert!(ok.is_active);

        assert!(matches!(
            WhatsAppGroupCreate::validated("", "https://chat.whatsapp.com/AbC123", true),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            WhatsAppGroupCreate::validated("Buyers", "https://example.com/join", false),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_dense_order() {
        let entries = OrderEntry::dense([9, 4, 6]);
        assert_eq!(entries[0], OrderEntry { id: 9, display_order: 0 });
        assert_eq!(entries[2], OrderEntry { id: 6, display_order: 2 });
    }
}

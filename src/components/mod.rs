//! UI Components
//!
//! Reusable Leptos components.

mod notice;
mod delete_confirm_button;
mod admin_sidebar;
mod table_sidebar;
mod items_table;
mod table_edit_dialog;
mod broadcast_dialog;
mod rate_table;
mod search_bar;
mod whatsapp_group_card;

pub use notice::{alert, confirm, use_toaster, ToastHost, Toaster};
pub use delete_confirm_button::DeleteConfirmButton;
pub use admin_sidebar::AdminShell;
pub use table_sidebar::TableGroupSidebar;
pub use items_table::EditableItemsTable;
pub use table_edit_dialog::TableEditDialog;
pub use broadcast_dialog::BroadcastDialog;
pub use rate_table::RateTable;
pub use search_bar::SearchBar;
pub use whatsapp_group_card::WhatsAppGroupCard;

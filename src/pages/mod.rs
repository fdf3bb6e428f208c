//! Pages
//!
//! One component per route.

mod home;
mod login;
mod inventory;
mod whatsapp;
mod broadcast;

pub use home::HomePage;
pub use login::LoginPage;
pub use inventory::InventoryPage;
pub use whatsapp::WhatsAppPage;
pub use broadcast::BroadcastPage;

//! Backend API
//!
//! REST bindings, organized by domain. Every call goes through [`ApiClient`].

mod client;
mod inventory;
mod communication;
mod homepage;
mod auth;

pub use client::*;
pub use inventory::*;
pub use communication::*;
pub use homepage::*;
pub use auth::*;

use leptos::prelude::*;

/// Get the API client from context
pub fn use_api() -> ApiClient {
    expect_context::<ApiClient>()
}

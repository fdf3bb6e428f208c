//! Yarn Rates Frontend Entry Point

mod models;
mod error;
mod format;
mod config;
mod logging;
mod session;
mod routes;
mod query;
mod pending;
mod commit;
mod api;
mod store;
mod context;
mod components;
mod pages;
mod app;

use app::App;
use leptos::prelude::*;

fn main() {
    console_error_panic_hook::set_once();
    logging::init(config::AppConfig::from_env().log_level);
    mount_to_body(App);
}

//! Routing
//!
//! Path parsing, navigation through the History API and the admin route
//! guard that runs before any page renders.

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::session::{self, StoredSession};

pub const LOGIN_PATH: &str = "/admin/login";
const ADMIN_PREFIX: &str = "/admin";

/// Pages of the app
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Inventory,
    WhatsApp,
    Broadcast,
    NotFound,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let path = path.trim_end_matches('/');
        match path {
            "" => Route::Home,
            LOGIN_PATH => Route::Login,
            "/admin" | "/admin/inventory" => Route::Inventory,
            "/admin/whatsapp" => Route::WhatsApp,
            "/admin/broadcast" => Route::Broadcast,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home | Route::NotFound => "/",
            Route::Login => LOGIN_PATH,
            Route::Inventory => "/admin/inventory",
            Route::WhatsApp => "/admin/whatsapp",
            Route::Broadcast => "/admin/broadcast",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Route::Inventory | Route::WhatsApp | Route::Broadcast)
    }
}

/// Outcome of the route guard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    /// Send to the login page; `clear_stale` when an expired token was found
    RedirectToLogin { clear_stale: bool },
}

/// Decide whether `path` may render given the cookie-held session
pub fn guard(path: &str, session: Option<&StoredSession>, now_ms: f64) -> GuardDecision {
    if !path.starts_with(ADMIN_PREFIX) {
        return GuardDecision::Pass;
    }
    if path.trim_end_matches('/') == LOGIN_PATH {
        return GuardDecision::Pass;
    }
    match session {
        None => GuardDecision::RedirectToLogin { clear_stale: false },
        Some(s) if !s.is_valid_at(now_ms) => GuardDecision::RedirectToLogin { clear_stale: true },
        Some(_) => GuardDecision::Pass,
    }
}

fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// Resolve `path` through the guard, applying its side effects
fn resolve(path: &str) -> Route {
    let session = session::session_from_cookies(&session::cookie_header());
    match guard(path, session.as_ref(), session::now_ms()) {
        GuardDecision::Pass => Route::from_path(path),
        GuardDecision::RedirectToLogin { clear_stale } => {
            if clear_stale {
                session::clear_session_cookies();
            }
            log::info!("[ROUTER] {path} requires login");
            replace_history(LOGIN_PATH);
            Route::Login
        }
    }
}

fn push_history(path: &str) {
    if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
        let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
    }
}

fn replace_history(path: &str) {
    if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
        let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
    }
}

/// Current route, provided via context
#[derive(Clone, Copy)]
pub struct Router {
    route: RwSignal<Route>,
}

impl Router {
    /// Resolve the initial location and follow back/forward navigation
    pub fn install() -> Self {
        let route = RwSignal::new(resolve(&current_path()));

        let on_popstate = Closure::<dyn FnMut(web_sys::PopStateEvent)>::new(move |_ev| {
            route.set(resolve(&current_path()));
        });
        if let Some(win) = web_sys::window() {
            let _ = win.add_event_listener_with_callback("popstate", on_popstate.as_ref().unchecked_ref());
        }
        on_popstate.forget();

        Self { route }
    }

    pub fn route(&self) -> Route {
        self.route.get()
    }

    pub fn navigate(&self, to: Route) {
        push_history(to.path());
        self.route.set(resolve(to.path()));
    }
}

pub fn use_router() -> Router {
    expect_context::<Router>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at_ms: f64) -> StoredSession {
        StoredSession { token: "tok".into(), expires_at_ms }
    }

    #[test]
    fn test_public_paths_pass() {
        assert_eq!(guard("/", None, 0.0), GuardDecision::Pass);
        assert_eq!(guard("/rates", None, 0.0), GuardDecision::Pass);
    }

    #[test]
    fn test_login_passes_without_token() {
        assert_eq!(guard("/admin/login", None, 0.0), GuardDecision::Pass);
        assert_eq!(guard("/admin/login/", None, 0.0), GuardDecision::Pass);
    }

    #[test]
    fn test_admin_requires_token() {
        assert_eq!(
            guard("/admin/inventory", None, 0.0),
            GuardDecision::RedirectToLogin { clear_stale: false }
        );
        assert_eq!(guard("/admin/inventory", Some(&session(100.0)), 99.0), GuardDecision::Pass);
    }

    #[test]
    fn test_expired_token_redirects_and_clears() {
        assert_eq!(
            guard("/admin/whatsapp", Some(&session(100.0)), 100.0),
            GuardDecision::RedirectToLogin { clear_stale: true }
        );
    }

    #[test]
    fn test_route_parsing() {
        assert_eq!(Route::from_path("/"), Route::Home);
        assert_eq!(Route::from_path("/admin"), Route::Inventory);
        assert_eq!(Route::from_path("/admin/broadcast/"), Route::Broadcast);
        assert_eq!(Route::from_path("/admin/unknown"), Route::NotFound);
        assert!(Route::WhatsApp.is_admin());
        assert!(!Route::Login.is_admin());
    }
}

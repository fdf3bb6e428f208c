//! Admin Session
//!
//! Bearer token persistence. The token and its absolute expiry are kept in
//! `localStorage` for the app and mirrored into cookies so the route guard
//! can decide on navigation without reading app state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use wasm_bindgen::JsCast;

pub const TOKEN_KEY: &str = "admin_token";
pub const TOKEN_EXPIRY_KEY: &str = "admin_token_expiry";

const COOKIE_EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Token plus absolute expiry in epoch millis
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub token: String,
    pub expires_at_ms: f64,
}

impl StoredSession {
    /// Session expiring `expires_in_secs` after `now_ms`
    pub fn starting_at(token: String, expires_in_secs: i64, now_ms: f64) -> Self {
        Self { token, expires_at_ms: now_ms + expires_in_secs as f64 * 1000.0 }
    }

    /// Rebuild from the two stored strings; both must be present and parse
    pub fn from_parts(token: Option<String>, expiry: Option<String>) -> Option<Self> {
        let token = token.filter(|t| !t.is_empty())?;
        let expires_at_ms = expiry?.trim().parse::<f64>().ok()?;
        Some(Self { token, expires_at_ms })
    }

    /// Valid only while `now_ms` is strictly before the expiry
    pub fn is_valid_at(&self, now_ms: f64) -> bool {
        now_ms < self.expires_at_ms
    }

    /// `Set-Cookie`-style strings for `document.cookie`
    pub fn cookies(&self) -> [String; 2] {
        let expires = cookie_expiry(self.expires_at_ms);
        let token = utf8_percent_encode(&self.token, NON_ALPHANUMERIC);
        [
            format!("{TOKEN_KEY}={token}; path=/; expires={expires}; SameSite=Lax"),
            format!("{TOKEN_EXPIRY_KEY}={}; path=/; expires={expires}; SameSite=Lax", self.expires_at_ms as i64),
        ]
    }
}

fn cookie_expiry(epoch_ms: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms as i64)
        .map(|dt| dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
        .unwrap_or_else(|| COOKIE_EPOCH.to_string())
}

/// Cookie strings that delete both session cookies
pub fn clearing_cookies() -> [String; 2] {
    [
        format!("{TOKEN_KEY}=; path=/; expires={COOKIE_EPOCH}"),
        format!("{TOKEN_EXPIRY_KEY}=; path=/; expires={COOKIE_EPOCH}"),
    ]
}

/// Parse a `document.cookie` string into name/value pairs
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let value = percent_decode_str(value.trim()).decode_utf8_lossy().into_owned();
            Some((name.trim().to_string(), value))
        })
        .collect()
}

/// Session as seen through cookies only
pub fn session_from_cookies(header: &str) -> Option<StoredSession> {
    let mut cookies = parse_cookies(header);
    StoredSession::from_parts(cookies.remove(TOKEN_KEY), cookies.remove(TOKEN_EXPIRY_KEY))
}

// ========================
// Browser storage
// ========================

pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

fn html_document() -> Option<web_sys::HtmlDocument> {
    web_sys::window()?.document()?.dyn_into::<web_sys::HtmlDocument>().ok()
}

/// Current `document.cookie`, empty when unavailable
pub fn cookie_header() -> String {
    html_document().and_then(|doc| doc.cookie().ok()).unwrap_or_default()
}

fn write_cookies(cookies: [String; 2]) {
    if let Some(doc) = html_document() {
        for cookie in cookies {
            if doc.set_cookie(&cookie).is_err() {
                log::warn!("[SESSION] could not write cookie");
            }
        }
    }
}

/// Persist a fresh login in both stores
pub fn save_session(token: String, expires_in_secs: i64) {
    let session = StoredSession::starting_at(token, expires_in_secs, now_ms());
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(TOKEN_KEY, &session.token);
        let _ = storage.set_item(TOKEN_EXPIRY_KEY, &(session.expires_at_ms as i64).to_string());
    }
    write_cookies(session.cookies());
    log::info!("[SESSION] signed in, expires in {expires_in_secs}s");
}

/// Remove the session from both stores
pub fn clear_session() {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(TOKEN_KEY);
        let _ = storage.remove_item(TOKEN_EXPIRY_KEY);
    }
    write_cookies(clearing_cookies());
}

/// Clear stale cookies only, leaving local storage alone
pub fn clear_session_cookies() {
    write_cookies(clearing_cookies());
}

/// The stored token if present and unexpired; an expired one is cleared
pub fn get_token() -> Option<String> {
    let storage = local_storage()?;
    let session = StoredSession::from_parts(
        storage.get_item(TOKEN_KEY).ok().flatten(),
        storage.get_item(TOKEN_EXPIRY_KEY).ok().flatten(),
    )?;
    if session.is_valid_at(now_ms()) {
        Some(session.token)
    } else {
        log::info!("[SESSION] token expired");
        clear_session();
        None
    }
}

pub fn is_authenticated() -> bool {
    get_token().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_boundary() {
        let session = StoredSession { token: "abc".into(), expires_at_ms: 1_000_000.0 };
        assert!(session.is_valid_at(999_999.0));
        assert!(!session.is_valid_at(1_000_000.0));
        assert!(!session.is_valid_at(1_000_001.0));
    }

    #[test]
    fn test_starting_at() {
        let session = StoredSession::starting_at("t".into(), 3600, 5_000.0);
        assert_eq!(session.expires_at_ms, 3_605_000.0);
    }

    #[test]
    fn test_from_parts_requires_both() {
        assert!(StoredSession::from_parts(Some("t".into()), None).is_none());
        assert!(StoredSession::from_parts(None, Some("10".into())).is_none());
        assert!(StoredSession::from_parts(Some("".into()), Some("10".into())).is_none());
        assert!(StoredSession::from_parts(Some("t".into()), Some("soon".into())).is_none());
        assert_eq!(
            StoredSession::from_parts(Some("t".into()), Some("10".into())),
            Some(StoredSession { token: "t".into(), expires_at_ms: 10.0 })
        );
    }

    #[test]
    fn test_cookie_strings() {
        let session = StoredSession { token: "a.b-c".into(), expires_at_ms: 1_767_225_600_000.0 };
        let [token, expiry] = session.cookies();
        assert_eq!(
            token,
            "admin_token=a%2Eb%2Dc; path=/; expires=Thu, 01 Jan 2026 00:00:00 GMT; SameSite=Lax"
        );
        assert_eq!(
            expiry,
            "admin_token_expiry=1767225600000; path=/; expires=Thu, 01 Jan 2026 00:00:00 GMT; SameSite=Lax"
        );
        assert!(clearing_cookies()[0].contains("expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn test_cookie_round_trip_through_header() {
        let session = StoredSession { token: "eyJ.x_y".into(), expires_at_ms: 42.0 };
        let header = session
            .cookies()
            .iter()
            .map(|c| c.split(';').next().unwrap().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        let header = format!("theme=dark; {header}");
        assert_eq!(session_from_cookies(&header), Some(session));
    }

    #[test]
    fn test_parse_cookies_ignores_junk() {
        let cookies = parse_cookies("a=1; junk; b = two ");
        assert_eq!(cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(cookies.get("b").map(String::as_str), Some("two"));
        assert_eq!(cookies.len(), 2);
    }
}

//! HTTP Gateway
//!
//! Thin wrapper over the browser `fetch` API. Attaches the bearer token,
//! serializes bodies and turns non-success responses into [`ApiError`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Request body
#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(String),
}

impl Body {
    pub fn json<B: Serialize + ?Sized>(value: &B) -> ApiResult<Body> {
        Ok(Body::Json(serde_json::to_string(value)?))
    }
}

/// How a call treats the stored token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Auth {
    /// Fail with `Unauthenticated` when no valid token is stored
    Required,
    /// Attach the token when there is one
    Optional,
    Public,
}

/// Backend client; cheap to clone
#[derive(Clone, Debug, PartialEq)]
pub struct ApiClient {
    base: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self { base: config.api_base.clone() }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        }
    }

    /// Authenticated GET decoding a JSON body
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::Get, path, Body::Empty, Auth::Required).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::Post, path, Body::json(body)?, Auth::Required).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::Put, path, Body::json(body)?, Auth::Required).await
    }

    /// Authenticated write whose response body is ignored
    pub async fn send<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> ApiResult<()> {
        self.execute(method, path, Body::json(body)?, Auth::Required).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.execute(Method::Delete, path, Body::Empty, Auth::Required).await.map(|_| ())
    }

    /// Send a request and decode its JSON response
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Body,
        auth: Auth,
    ) -> ApiResult<T> {
        match self.execute(method, path, body, auth).await? {
            Some(value) => Ok(serde_wasm_bindgen::from_value(value)?),
            None => Err(ApiError::Decode(format!("{} {path} returned no content", method.as_str()))),
        }
    }

    /// Send a request; `Ok(None)` is an empty success
    async fn execute(&self, method: Method, path: &str, body: Body, auth: Auth) -> ApiResult<Option<JsValue>> {
        let token = match auth {
            Auth::Public => None,
            Auth::Optional => session::get_token(),
            Auth::Required => Some(session::get_token().ok_or(ApiError::Unauthenticated)?),
        };
        let url = self.url(path);

        log::debug!(
            "[API] {} {} token={} body={}",
            method.as_str(),
            url,
            token.as_deref().map(redact_token).unwrap_or_else(|| "none".into()),
            !matches!(body, Body::Empty),
        );

        let headers = Headers::new().map_err(network_error)?;
        if let Some(token) = &token {
            headers.set("Authorization", &format!("Bearer {token}")).map_err(network_error)?;
        }

        let opts = RequestInit::new();
        opts.set_method(method.as_str());
        opts.set_mode(RequestMode::Cors);
        match &body {
            Body::Empty => {}
            Body::Json(json) => {
                headers.set("Content-Type", "application/json").map_err(network_error)?;
                opts.set_body(&JsValue::from_str(json));
            }
        }
        opts.set_headers(&headers);

        let request = Request::new_with_str_and_init(&url, &opts).map_err(network_error)?;
        let window = web_sys::window().ok_or_else(|| ApiError::Network("no window".into()))?;
        let resp: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(network_error)?
            .dyn_into()
            .map_err(network_error)?;

        let status = resp.status();
        let content_type = resp.headers().get("content-type").ok().flatten();
        let content_length = resp.headers().get("content-length").ok().flatten();
        let text = read_text(&resp).await?;

        if !resp.ok() {
            let message = extract_error_message(status, &resp.status_text(), content_type.as_deref(), &text);
            log::warn!("[API] {} {} -> {status}: {message}", method.as_str(), url);
            return Err(ApiError::Status { status, message });
        }

        if is_empty_success(status, content_length.as_deref(), &text) {
            return Ok(None);
        }
        js_sys::JSON::parse(&text)
            .map(Some)
            .map_err(|e| ApiError::Decode(js_message(&e)))
    }
}

async fn read_text(resp: &Response) -> ApiResult<String> {
    let promise = resp.text().map_err(network_error)?;
    let value = JsFuture::from(promise).await.map_err(network_error)?;
    Ok(value.as_string().unwrap_or_default())
}

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{value:?}"))
}

fn network_error(value: JsValue) -> ApiError {
    ApiError::Network(js_message(&value))
}

/// First characters of a token, safe for logs
pub fn redact_token(token: &str) -> String {
    let head: String = token.chars().take(10).collect();
    format!("{head}...")
}

/// 204, a zero content length or a blank body count as empty success
pub fn is_empty_success(status: u16, content_length: Option<&str>, body: &str) -> bool {
    status == 204 || content_length.map(str::trim) == Some("0") || body.trim().is_empty()
}

/// Human-readable message for a failed response.
///
/// JSON bodies contribute `detail` (a string, or a list of validation
/// entries with `msg`) and then `message`; other bodies are used verbatim
/// when non-empty; otherwise `API Error: <status> <status text>`.
pub fn extract_error_message(status: u16, status_text: &str, content_type: Option<&str>, body: &str) -> String {
    let fallback = format!("API Error: {status} {status_text}").trim_end().to_string();

    if content_type.is_some_and(|ct| ct.contains("application/json")) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return fallback;
        };
        return json_error_message(&value).unwrap_or(fallback);
    }

    let text = body.trim();
    if text.is_empty() { fallback } else { text.to_string() }
}

fn json_error_message(value: &serde_json::Value) -> Option<String> {
    match value.get("detail") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(serde_json::Value::Array(entries)) => {
            let msgs: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(|m| m.as_str()))
                .collect();
            if !msgs.is_empty() {
                return Some(msgs.join("; "));
            }
        }
        _ => {}
    }
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: Option<&str> = Some("application/json; charset=utf-8");

    #[test]
    fn test_detail_wins() {
        let body = r#"{"detail": "Table group not found", "message": "ignored"}"#;
        assert_eq!(extract_error_message(404, "Not Found", JSON, body), "Table group not found");
    }

    #[test]
    fn test_validation_detail_list() {
        let body = r#"{"detail": [{"loc": ["body", "rate"], "msg": "must be >= 0"}, {"msg": "count required"}]}"#;
        assert_eq!(
            extract_error_message(422, "Unprocessable Entity", JSON, body),
            "must be >= 0; count required"
        );
    }

    #[test]
    fn test_message_fallback_and_defaults() {
        assert_eq!(extract_error_message(400, "Bad Request", JSON, r#"{"message": "bad"}"#), "bad");
        assert_eq!(extract_error_message(400, "Bad Request", JSON, r#"{"other": 1}"#), "API Error: 400 Bad Request");
        assert_eq!(extract_error_message(500, "Internal Server Error", JSON, "<html>"), "API Error: 500 Internal Server Error");
    }

    #[test]
    fn test_text_bodies() {
        assert_eq!(extract_error_message(502, "Bad Gateway", Some("text/plain"), "upstream down\n"), "upstream down");
        assert_eq!(extract_error_message(503, "Service Unavailable", None, "   "), "API Error: 503 Service Unavailable");
        assert_eq!(extract_error_message(503, "", None, ""), "API Error: 503");
    }

    #[test]
    fn test_empty_success() {
        assert!(is_empty_success(204, None, ""));
        assert!(is_empty_success(200, Some("0"), ""));
        assert!(is_empty_success(200, None, "  "));
        assert!(!is_empty_success(200, Some("2"), "{}"));
    }

    #[test]
    fn test_redact_token() {
        assert_eq!(redact_token("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJhbGciOi...");
        assert_eq!(redact_token("abc"), "abc...");
    }
}

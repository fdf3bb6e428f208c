//! Admin login, token verification and account creation

use super::{ApiClient, Auth, Body, Method};
use crate::error::{ApiError, ApiResult};
use crate::models::{Credentials, LoginResponse, VerifyResponse};
use crate::session;

impl ApiClient {
    /// Exchange credentials for a token and persist the session
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(ApiError::Validation("Email and password are required".into()));
        }
        let resp: LoginResponse = self
            .request(Method::Post, "/admin/login", Body::json(credentials)?, Auth::Public)
            .await?;
        session::save_session(resp.access_token.clone(), resp.expires_in);
        Ok(resp)
    }

    /// Ask the backend whether the stored token is still good.
    /// Any failure or an invalid answer clears the session.
    pub async fn verify_token(&self) -> ApiResult<VerifyResponse> {
        let result: ApiResult<VerifyResponse> =
            self.request(Method::Post, "/admin/verify", Body::Empty, Auth::Required).await;
        match result {
            Ok(resp) if resp.valid => Ok(resp),
            Ok(_) => {
                session::clear_session();
                Err(ApiError::Unauthenticated)
            }
            Err(e) => {
                session::clear_session();
                Err(e)
            }
        }
    }

    /// Create another admin; the current token is sent when there is one
    pub async fn create_admin(&self, credentials: &Credentials) -> ApiResult<VerifyResponse> {
        self.request(Method::Post, "/admin/create", Body::json(credentials)?, Auth::Optional)
            .await
            .map_err(|e| e.context("create admin"))
    }
}

/// End the session locally
pub fn logout() {
    session::clear_session();
    log::info!("[SESSION] signed out");
}

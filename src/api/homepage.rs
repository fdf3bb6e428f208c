//! Public rate listing

use super::{ApiClient, Auth, Body, Method};
use crate::error::{ApiError, ApiResult};
use crate::models::HomepageData;

impl ApiClient {
    /// Tables marked for the homepage with their visible items; no token needed
    pub async fn homepage(&self) -> ApiResult<HomepageData> {
        self.request(Method::Get, "/homepage/tables", Body::Empty, Auth::Public)
            .await
            .map_err(|e: ApiError| e.context("load rates"))
    }
}

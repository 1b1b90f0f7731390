//! `/auth` bindings.

use crate::client::{ApiClient, Query, RequestBody};
use crate::error::ApiResult;
use medconnect_api_shared::{AuthResponse, LoginRequest, RegisterRequest, UserRecord};
use reqwest::Method;

impl ApiClient {
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.send(Method::POST, "/auth/register", RequestBody::json(request)?)
            .await
    }

    pub async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        self.send(Method::POST, "/auth/login", RequestBody::json(request)?)
            .await
    }

    /// The user the installed token belongs to.
    pub async fn me(&self) -> ApiResult<UserRecord> {
        self.get("/auth/me", &Query::new()).await
    }
}

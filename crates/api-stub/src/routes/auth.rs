use crate::error::{ok, StubError, StubResult};
use crate::extract::CurrentUser;
use crate::StubState;
use axum::extract::State;
use axum::Json;
use medconnect_api_shared::{AuthResponse, LoginRequest, RegisterRequest, UserRecord};

#[axum::debug_handler]
pub async fn register(
    State(state): State<StubState>,
    Json(request): Json<RegisterRequest>,
) -> StubResult<AuthResponse> {
    let mut store = state.store.write().await;
    let user = store.register(request)?;
    let id = user.id.clone().unwrap_or_default();
    let token = store.issue_token(&id);
    tracing::info!("registered user {id}");
    ok(AuthResponse { token, user })
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<StubState>,
    Json(request): Json<LoginRequest>,
) -> StubResult<AuthResponse> {
    let mut store = state.store.write().await;
    let email = request.email.trim().to_lowercase();
    let user = store
        .find_by_email(&email)
        .filter(|u| u.password == request.password)
        .map(|u| u.record.clone())
        .ok_or_else(|| StubError::unauthorised("Invalid credentials"))?;
    let token = store.issue_token(user.id.as_deref().unwrap_or_default());
    ok(AuthResponse { token, user })
}

#[axum::debug_handler]
pub async fn me(State(state): State<StubState>, user: CurrentUser) -> StubResult<UserRecord> {
    let store = state.store.read().await;
    let record = store
        .user_record(&user.0)
        .ok_or_else(|| StubError::not_found("User not found"))?;
    ok(record)
}

//! Route table for the stub API.

mod admin;
mod answers;
mod auth;
mod cases;
mod conversations;
mod hospitals;
mod users;

use crate::StubState;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use medconnect_api_shared::{HealthRes, HealthService};

pub fn api() -> Router<StubState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/cases", get(cases::list).post(cases::create))
        .route(
            "/cases/:id",
            get(cases::show).put(cases::update).delete(cases::remove),
        )
        .route("/cases/:id/vote", post(cases::vote))
        .route("/cases/:id/close", patch(cases::close))
        .route("/answers/:case_id", post(answers::create))
        .route(
            "/answers/:case_id/:answer_id",
            put(answers::update).delete(answers::remove),
        )
        .route("/answers/:case_id/:answer_id/vote", post(answers::vote))
        .route("/leaderboard", get(users::leaderboard))
        .route("/users", get(users::list))
        .route("/users/me", put(users::update_me))
        .route("/users/:id", get(users::show))
        .route("/hospitals", get(hospitals::list).post(hospitals::create))
        .route(
            "/hospitals/:id",
            get(hospitals::show)
                .put(hospitals::update)
                .delete(hospitals::remove),
        )
        .route(
            "/conversations",
            get(conversations::list).post(conversations::create),
        )
        .route("/conversations/:id", get(conversations::show))
        .route("/conversations/:id/messages", post(conversations::post_message))
        .route("/conversations/:id/title", put(conversations::rename))
        .route("/admin/broadcast", post(admin::broadcast))
}

/// Bare (unenveloped) health payload.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

/// Value of a query parameter that may repeat, e.g. `tags=a&tags=b`.
pub(crate) fn all_values(query: &[(String, String)], key: &str) -> Vec<String> {
    query
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

pub(crate) fn first_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// Case-insensitive containment over any of `fields`.
pub(crate) fn matches_search(needle: Option<&str>, fields: &[Option<&str>]) -> bool {
    let Some(needle) = needle else {
        return true;
    };
    let needle = needle.to_lowercase();
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

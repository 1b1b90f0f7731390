use super::{all_values, first_value, matches_search};
use crate::error::{ok, StubError, StubResult};
use crate::extract::CurrentUser;
use crate::StubState;
use axum::extract::{Path, Query, State};
use axum::Json;
use medconnect_api_shared::{LeaderEntry, ProfileUpdate, UserRecord};

const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

#[axum::debug_handler]
pub async fn leaderboard(
    State(state): State<StubState>,
    Query(query): Query<Vec<(String, String)>>,
) -> StubResult<Vec<LeaderEntry>> {
    let limit = first_value(&query, "limit")
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let store = state.store.read().await;
    ok(store.leaderboard(limit))
}

/// Doctor directory. Repeated `hospitals`/`specialties` values are alternatives.
#[axum::debug_handler]
pub async fn list(
    State(state): State<StubState>,
    Query(query): Query<Vec<(String, String)>>,
) -> StubResult<Vec<UserRecord>> {
    let search = first_value(&query, "search");
    let hospitals = all_values(&query, "hospitals");
    let specialties = all_values(&query, "specialties");
    let one_of = |wanted: &[String], value: Option<&String>| {
        wanted.is_empty() || value.is_some_and(|v| wanted.iter().any(|w| w.eq_ignore_ascii_case(v)))
    };

    let store = state.store.read().await;
    let users = store
        .users
        .iter()
        .map(|u| &u.record)
        .filter(|r| one_of(&hospitals, r.hospital.as_ref()))
        .filter(|r| one_of(&specialties, r.specialty.as_ref()))
        .filter(|r| {
            matches_search(
                search,
                &[
                    r.first_name.as_deref(),
                    r.last_name.as_deref(),
                    r.hospital.as_deref(),
                    r.specialty.as_deref(),
                ],
            )
        })
        .cloned()
        .collect();
    ok(users)
}

#[axum::debug_handler]
pub async fn show(State(state): State<StubState>, Path(id): Path<String>) -> StubResult<UserRecord> {
    let store = state.store.read().await;
    let record = store
        .user_record(&id)
        .ok_or_else(|| StubError::not_found("User not found"))?;
    ok(record)
}

/// `PUT /users/me`. Role changes are ignored here; they go through the admin routes.
#[axum::debug_handler]
pub async fn update_me(
    State(state): State<StubState>,
    user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> StubResult<UserRecord> {
    let mut store = state.store.write().await;
    let stored = store
        .user_mut(&user.0)
        .ok_or_else(|| StubError::not_found("User not found"))?;
    let record = &mut stored.record;
    let fields = [
        (&mut record.title, update.title),
        (&mut record.first_name, update.first_name),
        (&mut record.last_name, update.last_name),
        (&mut record.phone_number, update.phone_number),
        (&mut record.country, update.country),
        (&mut record.hospital, update.hospital),
        (&mut record.specialty, update.specialty),
        (&mut record.license_number, update.license_number),
        (&mut record.bio, update.bio),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            *field = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        }
    }
    if let Some(email) = update.email.filter(|e| !e.trim().is_empty()) {
        record.email = Some(email.trim().to_lowercase());
    }
    if let Some(credentials) = update.credentials {
        record.credentials = Some(credentials);
    }
    if update.show_phone.is_some() {
        record.show_phone = update.show_phone;
    }
    if update.show_email.is_some() {
        record.show_email = update.show_email;
    }
    if let Some(password) = update.password.filter(|p| !p.is_empty()) {
        stored.password = password;
    }
    ok(stored.record.clone())
}

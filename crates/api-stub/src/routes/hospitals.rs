use super::{first_value, matches_search};
use crate::error::{ok, StubError, StubResult};
use crate::extract::CurrentUser;
use crate::store::{new_id, timestamp, Store};
use crate::StubState;
use axum::extract::{Path, Query, State};
use axum::Json;
use medconnect_api_shared::{Hospital, HospitalLevel};
use serde_json::{json, Value};

fn require_manager(store: &Store, user_id: &str) -> Result<(), StubError> {
    match store.user(user_id) {
        Some(user) if user.manages_hospitals() => Ok(()),
        _ => Err(StubError::forbidden("Hospital admin access required")),
    }
}

fn hospital_index(store: &Store, id: &str) -> Result<usize, StubError> {
    store
        .hospitals
        .iter()
        .position(|h| h.id.as_deref() == Some(id))
        .ok_or_else(|| StubError::not_found("Hospital not found"))
}

fn same(wanted: Option<&str>, value: &str) -> bool {
    wanted.map_or(true, |w| w.eq_ignore_ascii_case(value.trim()))
}

#[axum::debug_handler]
pub async fn list(
    State(state): State<StubState>,
    Query(query): Query<Vec<(String, String)>>,
) -> StubResult<Vec<Hospital>> {
    let search = first_value(&query, "search");
    let level = first_value(&query, "level")
        .map(|raw| {
            raw.parse::<HospitalLevel>()
                .map_err(|_| StubError::bad_request(format!("Unknown level: {raw}")))
        })
        .transpose()?;
    let city = first_value(&query, "city");
    let region = first_value(&query, "region");
    let country = first_value(&query, "country");

    let store = state.store.read().await;
    let hospitals = store
        .hospitals
        .iter()
        .filter(|h| level.map_or(true, |l| h.level == Some(l)))
        .filter(|h| same(city, &h.city) && same(region, &h.region) && same(country, &h.country))
        .filter(|h| matches_search(search, &[Some(h.name.as_str()), Some(h.city.as_str())]))
        .cloned()
        .collect();
    ok(hospitals)
}

#[axum::debug_handler]
pub async fn show(State(state): State<StubState>, Path(id): Path<String>) -> StubResult<Hospital> {
    let store = state.store.read().await;
    let index = hospital_index(&store, &id)?;
    ok(store.hospitals[index].clone())
}

#[axum::debug_handler]
pub async fn create(
    State(state): State<StubState>,
    user: CurrentUser,
    Json(mut hospital): Json<Hospital>,
) -> StubResult<Hospital> {
    let mut store = state.store.write().await;
    require_manager(&store, &user.0)?;
    if hospital.name.trim().is_empty() {
        return Err(StubError::bad_request("Hospital name is required"));
    }
    let now = timestamp();
    hospital.id = Some(new_id("hosp"));
    hospital.created_at = Some(now.clone());
    hospital.updated_at = Some(now);
    store.hospitals.push(hospital.clone());
    ok(hospital)
}

/// Replaces the stored entry, keeping its id and creation time.
#[axum::debug_handler]
pub async fn update(
    State(state): State<StubState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(mut hospital): Json<Hospital>,
) -> StubResult<Hospital> {
    let mut store = state.store.write().await;
    require_manager(&store, &user.0)?;
    let index = hospital_index(&store, &id)?;
    hospital.id = Some(id);
    hospital.created_at = store.hospitals[index].created_at.clone();
    hospital.updated_at = Some(timestamp());
    store.hospitals[index] = hospital.clone();
    ok(hospital)
}

#[axum::debug_handler]
pub async fn remove(
    State(state): State<StubState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> StubResult<Value> {
    let mut store = state.store.write().await;
    require_manager(&store, &user.0)?;
    let index = hospital_index(&store, &id)?;
    store.hospitals.remove(index);
    ok(json!({ "message": "Hospital deleted" }))
}

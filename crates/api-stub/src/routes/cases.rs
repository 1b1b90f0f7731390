use super::{all_values, first_value, matches_search};
use crate::error::{ok, StubError, StubResult};
use crate::extract::CurrentUser;
use crate::store::{new_id, timestamp, Credit};
use crate::StubState;
use axum::extract::{Path, Query, State};
use axum::Json;
use medconnect_api_shared::{CaseList, CaseRecord, CaseUpdate, FieldIssue, NewCase, Urgency};
use serde_json::{json, Value};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

fn number(query: &[(String, String)], key: &str, default: u32) -> Result<u32, StubError> {
    match first_value(query, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| StubError::bad_request(format!("Invalid {key}"))),
    }
}

fn normalise_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// `GET /cases`: newest first, filtered, paged as `{cases, totalPages, currentPage}`.
///
/// A case must carry every requested tag.
#[axum::debug_handler]
pub async fn list(
    State(state): State<StubState>,
    Query(query): Query<Vec<(String, String)>>,
) -> StubResult<CaseList> {
    let search = first_value(&query, "search");
    let urgency = first_value(&query, "urgency")
        .map(|raw| {
            raw.parse::<Urgency>()
                .map_err(|_| StubError::bad_request(format!("Unknown urgency: {raw}")))
        })
        .transpose()?;
    let tags = normalise_tags(&all_values(&query, "tags"));
    let open_only = first_value(&query, "openOnly") == Some("true");
    let page = number(&query, "page", 1)?;
    let limit = number(&query, "limit", DEFAULT_LIMIT)?.min(MAX_LIMIT);

    let store = state.store.read().await;
    let matching: Vec<&CaseRecord> = store
        .cases
        .iter()
        .filter(|c| urgency.map_or(true, |u| c.urgency == Some(u)))
        .filter(|c| !open_only || !c.closed.unwrap_or(false))
        .filter(|c| tags.iter().all(|t| c.tags.contains(t)))
        .filter(|c| matches_search(search, &[Some(c.title.as_str()), Some(c.description.as_str())]))
        .collect();

    let total_pages = (matching.len() as u32).div_ceil(limit).max(1);
    let cases = matching
        .into_iter()
        .skip((page as usize - 1).saturating_mul(limit as usize))
        .take(limit as usize)
        .map(|c| store.hydrate(c))
        .collect();
    ok(CaseList {
        cases,
        total_pages: Some(total_pages),
        current_page: Some(page),
    })
}

#[axum::debug_handler]
pub async fn create(
    State(state): State<StubState>,
    user: CurrentUser,
    Json(new): Json<NewCase>,
) -> StubResult<CaseRecord> {
    let mut issues = Vec::new();
    if new.title.trim().is_empty() {
        issues.push(FieldIssue::new("title", "Title is required"));
    }
    if new.description.trim().is_empty() {
        issues.push(FieldIssue::new("description", "Description is required"));
    }
    if !issues.is_empty() {
        return Err(StubError::validation(issues));
    }

    let mut store = state.store.write().await;
    let record = CaseRecord {
        id: new_id("case"),
        title: new.title.trim().to_string(),
        description: new.description.trim().to_string(),
        author_id: Some(user.0),
        author: None,
        specialty: new.specialty,
        country: new.country,
        urgency: Some(new.urgency),
        tags: normalise_tags(&new.tags),
        media: new.media,
        votes: Some(0),
        closed: Some(false),
        edited: Some(false),
        edited_at: None,
        created_at: Some(timestamp()),
        answers: Vec::new(),
    };
    let hydrated = store.hydrate(&record);
    store.cases.insert(0, record);
    tracing::info!("case {} created", hydrated.id);
    ok(hydrated)
}

#[axum::debug_handler]
pub async fn show(State(state): State<StubState>, Path(id): Path<String>) -> StubResult<CaseRecord> {
    let store = state.store.read().await;
    let index = store.case_index(&id)?;
    ok(store.hydrate(&store.cases[index]))
}

#[axum::debug_handler]
pub async fn update(
    State(state): State<StubState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(update): Json<CaseUpdate>,
) -> StubResult<CaseRecord> {
    let mut store = state.store.write().await;
    let index = store.authored_case_index(&id, &user.0)?;
    let case = &mut store.cases[index];
    if let Some(title) = update.title.filter(|t| !t.trim().is_empty()) {
        case.title = title.trim().to_string();
    }
    if let Some(description) = update.description.filter(|d| !d.trim().is_empty()) {
        case.description = description.trim().to_string();
    }
    if let Some(urgency) = update.urgency {
        case.urgency = Some(urgency);
    }
    if let Some(tags) = update.tags {
        case.tags = normalise_tags(&tags);
    }
    case.edited = Some(true);
    case.edited_at = Some(timestamp());
    ok(store.hydrate(&store.cases[index]))
}

#[axum::debug_handler]
pub async fn remove(
    State(state): State<StubState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> StubResult<Value> {
    let mut store = state.store.write().await;
    let index = store.authored_case_index(&id, &user.0)?;
    store.cases.remove(index);
    store.case_votes.retain(|(_, case_id)| *case_id != id);
    ok(json!({ "message": "Case deleted" }))
}

/// One vote per user. Returns the whole case so the client can reconcile it.
#[axum::debug_handler]
pub async fn vote(
    State(state): State<StubState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> StubResult<CaseRecord> {
    let mut store = state.store.write().await;
    let index = store.case_index(&id)?;
    if store.cases[index].closed.unwrap_or(false) {
        return Err(StubError::bad_request("This case is closed"));
    }
    if !store.case_votes.insert((user.0.clone(), id.clone())) {
        return Err(StubError::bad_request("You have already voted on this case"));
    }
    let case = &mut store.cases[index];
    case.votes = Some(case.votes.unwrap_or(0) + 1);
    if let Some(author_id) = case.author_id.clone() {
        store.credit(&author_id, Credit::Case);
    }
    ok(store.hydrate(&store.cases[index]))
}

#[axum::debug_handler]
pub async fn close(
    State(state): State<StubState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> StubResult<CaseRecord> {
    let mut store = state.store.write().await;
    let index = store.authored_case_index(&id, &user.0)?;
    store.cases[index].closed = Some(true);
    tracing::info!("case {id} closed");
    ok(store.hydrate(&store.cases[index]))
}

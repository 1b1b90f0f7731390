use crate::error::{ok, StubError, StubResult};
use crate::extract::{read_form, CurrentUser};
use crate::store::{new_id, Credit, Store};
use crate::StubState;
use axum::extract::{Multipart, Path, State};
use medconnect_api_shared::{AnswerRecord, CaseRecord, FieldIssue};
use serde_json::{json, Value};

fn open_case_index(store: &Store, case_id: &str) -> Result<usize, StubError> {
    let index = store.case_index(case_id)?;
    if store.cases[index].closed.unwrap_or(false) {
        return Err(StubError::bad_request("This case is closed"));
    }
    Ok(index)
}

fn answer_index(case: &CaseRecord, answer_id: &str) -> Result<usize, StubError> {
    case.answers
        .iter()
        .position(|a| a.id == answer_id)
        .ok_or_else(|| StubError::not_found("Answer not found"))
}

/// Locate an answer written by `user_id`.
fn authored_answer(
    store: &Store,
    case_id: &str,
    answer_id: &str,
    user_id: &str,
) -> Result<(usize, usize), StubError> {
    let case_index = store.case_index(case_id)?;
    let answer_index = answer_index(&store.cases[case_index], answer_id)?;
    let answer = &store.cases[case_index].answers[answer_index];
    if answer.author_id.as_deref() != Some(user_id) {
        return Err(StubError::forbidden("Only the author can change this answer"));
    }
    Ok((case_index, answer_index))
}

/// `POST /answers/:case_id` (multipart: `content`, `specialty`, `attachment`).
#[axum::debug_handler]
pub async fn create(
    State(state): State<StubState>,
    user: CurrentUser,
    Path(case_id): Path<String>,
    multipart: Multipart,
) -> StubResult<AnswerRecord> {
    let form = read_form(multipart).await?;
    let mut store = state.store.write().await;
    let index = open_case_index(&store, &case_id)?;

    let content = form.trimmed("content");
    if content.is_none() && form.file.is_none() {
        return Err(StubError::validation(vec![FieldIssue::new(
            "content",
            "Answer content or attachment is required",
        )]));
    }
    let specialty = form
        .trimmed("specialty")
        .or_else(|| store.user(&user.0).and_then(|u| u.record.specialty.clone()));
    let file = form.file.as_ref();
    let answer = AnswerRecord {
        id: new_id("ans"),
        author_id: Some(user.0),
        author: None,
        content,
        specialty,
        votes: Some(0),
        attachment_url: file.map(|f| f.url()),
        attachment_name: file.map(|f| f.name.clone()),
        attachment_mime_type: file.map(|f| f.mime_type.clone()),
        attachment_size: file.map(|f| f.size),
    };
    let hydrated = store.hydrate_answer(&answer);
    store.cases[index].answers.push(answer);
    ok(hydrated)
}

#[axum::debug_handler]
pub async fn update(
    State(state): State<StubState>,
    user: CurrentUser,
    Path((case_id, answer_id)): Path<(String, String)>,
    multipart: Multipart,
) -> StubResult<AnswerRecord> {
    let form = read_form(multipart).await?;
    let mut store = state.store.write().await;
    let (c, a) = authored_answer(&store, &case_id, &answer_id, &user.0)?;
    let answer = &mut store.cases[c].answers[a];
    if let Some(content) = form.trimmed("content") {
        answer.content = Some(content);
    }
    if let Some(specialty) = form.trimmed("specialty") {
        answer.specialty = Some(specialty);
    }
    ok(store.hydrate_answer(&store.cases[c].answers[a]))
}

#[axum::debug_handler]
pub async fn remove(
    State(state): State<StubState>,
    user: CurrentUser,
    Path((case_id, answer_id)): Path<(String, String)>,
) -> StubResult<Value> {
    let mut store = state.store.write().await;
    let (c, a) = authored_answer(&store, &case_id, &answer_id, &user.0)?;
    store.cases[c].answers.remove(a);
    store.answer_votes.retain(|(_, id)| *id != answer_id);
    ok(json!({ "message": "Answer deleted" }))
}

/// One vote per user per answer. Returns the whole parent case.
#[axum::debug_handler]
pub async fn vote(
    State(state): State<StubState>,
    user: CurrentUser,
    Path((case_id, answer_id)): Path<(String, String)>,
) -> StubResult<CaseRecord> {
    let mut store = state.store.write().await;
    let index = open_case_index(&store, &case_id)?;
    let a = answer_index(&store.cases[index], &answer_id)?;
    if !store.answer_votes.insert((user.0.clone(), answer_id.clone())) {
        return Err(StubError::bad_request("You have already voted on this answer"));
    }
    let answer = &mut store.cases[index].answers[a];
    answer.votes = Some(answer.votes.unwrap_or(0) + 1);
    if let Some(author_id) = answer.author_id.clone() {
        store.credit(&author_id, Credit::Answer);
    }
    ok(store.hydrate(&store.cases[index]))
}

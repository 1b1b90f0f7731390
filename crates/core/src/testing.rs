//! In-crate test helpers: record builders and a recording gateway.

use crate::error::{ApiError, ApiResult};
use crate::gateway::CaseGateway;
use crate::resources::{AnswerDraft, CaseFilters};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use medconnect_api_shared::{
    AnswerRecord, AuthorRef, CaseList, CaseRecord, CaseUpdate, LeaderEntry, NewCase,
};
use medconnect_types::Urgency;
use std::collections::VecDeque;
use std::sync::Mutex;

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
}

pub(crate) fn author(id: &str, first: &str, last: &str, score: f64) -> AuthorRef {
    AuthorRef {
        id: Some(id.into()),
        first_name: Some(first.into()),
        last_name: Some(last.into()),
        specialty: None,
        hospital: None,
        score: Some(score),
    }
}

pub(crate) fn case_record(id: &str, urgency: Urgency, created_at: &str) -> CaseRecord {
    CaseRecord {
        id: id.into(),
        title: format!("Case {id}"),
        description: "details".into(),
        author_id: Some("author-1".into()),
        author: Some(author("author-1", "Kofi", "Boateng", 3.0)),
        specialty: None,
        country: None,
        urgency: Some(urgency),
        tags: Vec::new(),
        media: Vec::new(),
        votes: Some(0),
        closed: Some(false),
        edited: None,
        edited_at: None,
        created_at: (!created_at.is_empty()).then(|| created_at.to_string()),
        answers: Vec::new(),
    }
}

pub(crate) fn answer_record(id: &str, author_ref: AuthorRef, votes: u32) -> AnswerRecord {
    AnswerRecord {
        id: id.into(),
        author_id: author_ref.id.clone(),
        author: Some(author_ref),
        content: Some(format!("answer {id}")),
        specialty: None,
        votes: Some(votes),
        attachment_url: None,
        attachment_name: None,
        attachment_mime_type: None,
        attachment_size: None,
    }
}

/// Gateway that keeps cases in memory and records every call as `METHOD /path`.
///
/// Votes add one to the vote count and 1.0 to the author's score, like the real backend.
#[derive(Default)]
pub(crate) struct FakeGateway {
    cases: Mutex<Vec<CaseRecord>>,
    pages: Mutex<VecDeque<CaseList>>,
    list_requests: Mutex<Vec<CaseFilters>>,
    calls: Mutex<Vec<String>>,
    fail_leaderboard: bool,
}

impl FakeGateway {
    pub(crate) fn with_cases(cases: Vec<CaseRecord>) -> Self {
        Self {
            cases: Mutex::new(cases),
            ..Self::default()
        }
    }

    pub(crate) fn failing_leaderboard(mut self) -> Self {
        self.fail_leaderboard = true;
        self
    }

    /// Queue a scripted listing. Without one, listings return every stored case, unpaged.
    pub(crate) fn push_page(&self, page: CaseList) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn list_requests(&self) -> Vec<CaseFilters> {
        self.list_requests.lock().unwrap().clone()
    }

    pub(crate) fn stored(&self, id: &str) -> Option<CaseRecord> {
        self.cases.lock().unwrap().iter().find(|c| c.id == id).cloned()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn with_case<T>(&self, id: &str, f: impl FnOnce(&mut CaseRecord) -> T) -> ApiResult<T> {
        let mut cases = self.cases.lock().unwrap();
        let case = cases
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Case not found"))?;
        Ok(f(case))
    }
}

fn not_found(message: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: message.into(),
        details: Vec::new(),
    }
}

fn bump(author: &mut Option<AuthorRef>) {
    if let Some(a) = author.as_mut() {
        a.score = Some(a.score.unwrap_or(0.0) + 1.0);
    }
}

#[async_trait]
impl CaseGateway for FakeGateway {
    async fn list_cases(&self, filters: &CaseFilters) -> ApiResult<CaseList> {
        self.record("GET /cases".into());
        self.list_requests.lock().unwrap().push(filters.clone());
        if let Some(page) = self.pages.lock().unwrap().pop_front() {
            return Ok(page);
        }
        Ok(CaseList {
            cases: self.cases.lock().unwrap().clone(),
            total_pages: None,
            current_page: None,
        })
    }

    async fn get_case(&self, id: &str) -> ApiResult<CaseRecord> {
        self.record(format!("GET /cases/{id}"));
        self.with_case(id, |c| c.clone())
    }

    async fn create_case(&self, case: &NewCase) -> ApiResult<CaseRecord> {
        self.record("POST /cases".into());
        let mut cases = self.cases.lock().unwrap();
        let mut record = case_record(
            &format!("new-{}", cases.len() + 1),
            case.urgency,
            "2025-03-10T12:00:00Z",
        );
        record.title = case.title.clone();
        record.description = case.description.clone();
        record.tags = case.tags.clone();
        record.author_id = Some("viewer".into());
        record.author = Some(author("viewer", "Ama", "Mensah", 10.0));
        cases.push(record.clone());
        Ok(record)
    }

    async fn update_case(&self, id: &str, update: &CaseUpdate) -> ApiResult<CaseRecord> {
        self.record(format!("PUT /cases/{id}"));
        self.with_case(id, |c| {
            if let Some(title) = &update.title {
                c.title = title.clone();
            }
            if let Some(description) = &update.description {
                c.description = description.clone();
            }
            if let Some(urgency) = update.urgency {
                c.urgency = Some(urgency);
            }
            c.edited = Some(true);
            c.edited_at = Some("2025-03-10T11:59:00Z".into());
            c.clone()
        })
    }

    async fn close_case(&self, id: &str) -> ApiResult<()> {
        self.record(format!("PATCH /cases/{id}/close"));
        self.with_case(id, |c| c.closed = Some(true))
    }

    async fn vote_case(&self, id: &str) -> ApiResult<CaseRecord> {
        self.record(format!("POST /cases/{id}/vote"));
        self.with_case(id, |c| {
            c.votes = Some(c.votes.unwrap_or(0) + 1);
            bump(&mut c.author);
            c.clone()
        })
    }

    async fn vote_answer(&self, case_id: &str, answer_id: &str) -> ApiResult<CaseRecord> {
        self.record(format!("POST /answers/{case_id}/{answer_id}/vote"));
        self.with_case(case_id, |c| {
            if let Some(answer) = c.answers.iter_mut().find(|a| a.id == answer_id) {
                answer.votes = Some(answer.votes.unwrap_or(0) + 1);
                bump(&mut answer.author);
            }
            c.clone()
        })
    }

    async fn create_answer(&self, case_id: &str, draft: AnswerDraft) -> ApiResult<AnswerRecord> {
        self.record(format!("POST /answers/{case_id}"));
        self.with_case(case_id, |c| {
            let mut answer = answer_record(
                &format!("ans-{}", c.answers.len() + 1),
                author("viewer", "Ama", "Mensah", 10.0),
                0,
            );
            answer.content = draft.trimmed_content().map(str::to_owned);
            c.answers.push(answer.clone());
            answer
        })
    }

    async fn leaderboard(&self, limit: u32) -> ApiResult<Option<Vec<LeaderEntry>>> {
        self.record(format!("GET /leaderboard?limit={limit}"));
        if self.fail_leaderboard {
            return Err(ApiError::Status {
                status: 500,
                message: "leaderboard unavailable".into(),
                details: Vec::new(),
            });
        }
        Ok(Some(vec![LeaderEntry {
            id: Some("author-1".into()),
            first_name: Some("Kofi".into()),
            last_name: Some("Boateng".into()),
            score: Some(4.0),
        }]))
    }
}

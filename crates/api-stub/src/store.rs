//! In-memory records behind the stub backend.
//!
//! Cases keep only the author id; author summaries (name, hospital, score) are filled in from
//! the user table whenever a case leaves the store, so scores are always current.

use crate::error::StubError;
use chrono::{SecondsFormat, Utc};
use medconnect_api_shared::{
    AnswerRecord, AuthorRef, CaseRecord, Conversation, FieldIssue, Hospital, LeaderEntry,
    ParticipantUser, RegisterRequest, Role, Urgency, UserRecord,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub(crate) struct StoredUser {
    pub record: UserRecord,
    pub password: String,
}

impl StoredUser {
    pub fn id(&self) -> &str {
        self.record.id.as_deref().unwrap_or_default()
    }

    pub fn is_admin(&self) -> bool {
        self.record.role.map(Role::is_admin).unwrap_or(false)
    }

    pub fn manages_hospitals(&self) -> bool {
        matches!(self.record.role, Some(Role::Admin | Role::HospitalAdmin))
    }
}

/// Which kind of post received a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Credit {
    Case,
    Answer,
}

#[derive(Default)]
pub struct Store {
    pub(crate) users: Vec<StoredUser>,
    pub(crate) tokens: HashMap<String, String>,
    pub(crate) cases: Vec<CaseRecord>,
    /// `(user id, case id)`
    pub(crate) case_votes: HashSet<(String, String)>,
    /// `(user id, answer id)`
    pub(crate) answer_votes: HashSet<(String, String)>,
    pub(crate) hospitals: Vec<Hospital>,
    pub(crate) conversations: Vec<Conversation>,
}

pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

impl Store {
    /// A store with an admin, two doctors, a hospital and a few cases.
    pub fn seeded() -> Self {
        let mut store = Self::default();
        let admin = store.insert_user(seed_user("Admin", "User", "admin@medconnect.test"), Role::Admin);
        let kofi = store.insert_user(seed_user("Kofi", "Boateng", "kofi@medconnect.test"), Role::Doctor);
        let ama = store.insert_user(seed_user("Ama", "Mensah", "ama@medconnect.test"), Role::Doctor);
        tracing::debug!("seeded users {admin}, {kofi}, {ama}");

        store.hospitals.push(Hospital {
            id: Some(new_id("hosp")),
            name: "Korle Bu Teaching Hospital".into(),
            country: "Ghana".into(),
            city: "Accra".into(),
            region: "Greater Accra".into(),
            level: Some(medconnect_api_shared::HospitalLevel::Tertiary),
            bed_capacity: 2000,
            created_at: Some(timestamp()),
            ..Hospital::default()
        });

        let seeds = [
            (&kofi, "Fever and neck stiffness", Urgency::Urgent, &["paediatrics", "infection"][..]),
            (&ama, "Recurrent syncope in a young adult", Urgency::NonUrgent, &["cardiology"][..]),
            (&kofi, "Classic presentation of sickle cell crisis", Urgency::CaseStudy, &["haematology"][..]),
        ];
        for (author, title, urgency, tags) in seeds {
            store.cases.push(CaseRecord {
                id: new_id("case"),
                title: title.into(),
                description: format!("{title}. Looking for second opinions."),
                author_id: Some(author.clone()),
                author: None,
                specialty: None,
                country: Some("Ghana".into()),
                urgency: Some(urgency),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                media: Vec::new(),
                votes: Some(0),
                closed: Some(false),
                edited: Some(false),
                edited_at: None,
                created_at: Some(timestamp()),
                answers: Vec::new(),
            });
        }
        store
    }

    /// Register a user, rejecting missing required fields and duplicate emails.
    pub(crate) fn register(&mut self, request: RegisterRequest) -> Result<UserRecord, StubError> {
        let required = [
            ("firstName", &request.first_name),
            ("lastName", &request.last_name),
            ("email", &request.email),
            ("password", &request.password),
            ("licenseNumber", &request.license_number),
        ];
        let missing: Vec<FieldIssue> = required
            .iter()
            .filter(|(_, value)| blank(value))
            .map(|(param, _)| FieldIssue::new(*param, format!("{param} is required")))
            .collect();
        if !missing.is_empty() {
            return Err(StubError::validation(missing));
        }
        let email = request.email.trim().to_lowercase();
        if self.find_by_email(&email).is_some() {
            return Err(StubError::bad_request("User already exists"));
        }
        let id = self.insert_user(request, Role::Doctor);
        self.user_record(&id)
            .ok_or_else(|| StubError::not_found("User not found"))
    }

    fn insert_user(&mut self, request: RegisterRequest, role: Role) -> String {
        let id = new_id("user");
        let credentials: Vec<String> = request
            .credentials
            .into_iter()
            .filter_map(non_blank)
            .collect();
        let record = UserRecord {
            id: Some(id.clone()),
            title: non_blank(request.title).or_else(|| Some("Dr.".into())),
            first_name: non_blank(request.first_name),
            last_name: non_blank(request.last_name),
            email: Some(request.email.trim().to_lowercase()),
            phone_number: non_blank(request.phone_number),
            country: non_blank(request.country),
            hospital: non_blank(request.hospital),
            specialty: non_blank(request.specialty),
            license_number: non_blank(request.license_number),
            profile_picture: None,
            credentials: Some(credentials),
            bio: non_blank(request.bio),
            score: Some(0.0),
            answer_votes_received: Some(0),
            case_votes_received: Some(0),
            show_phone: Some(true),
            show_email: Some(true),
            role: Some(role),
        };
        self.users.push(StoredUser {
            record,
            password: request.password,
        });
        id
    }

    pub(crate) fn find_by_email(&self, email: &str) -> Option<&StoredUser> {
        self.users
            .iter()
            .find(|u| u.record.email.as_deref() == Some(email))
    }

    pub(crate) fn user(&self, id: &str) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.id() == id)
    }

    pub(crate) fn user_mut(&mut self, id: &str) -> Option<&mut StoredUser> {
        self.users.iter_mut().find(|u| u.id() == id)
    }

    pub(crate) fn user_record(&self, id: &str) -> Option<UserRecord> {
        self.user(id).map(|u| u.record.clone())
    }

    /// Issue an opaque bearer token for a user.
    pub(crate) fn issue_token(&mut self, user_id: &str) -> String {
        let token = format!("tok-{}", Uuid::new_v4());
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }

    pub(crate) fn author_ref(&self, user_id: &str) -> Option<AuthorRef> {
        let user = &self.user(user_id)?.record;
        Some(AuthorRef {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            specialty: user.specialty.clone(),
            hospital: user.hospital.clone(),
            score: user.score,
        })
    }

    pub(crate) fn participant(&self, user_id: &str) -> Option<ParticipantUser> {
        let user = &self.user(user_id)?.record;
        Some(ParticipantUser {
            id: user_id.to_string(),
            first_name: user.first_name.clone().unwrap_or_default(),
            last_name: user.last_name.clone().unwrap_or_default(),
            profile_picture: user.profile_picture.clone(),
            specialty: user.specialty.clone(),
        })
    }

    pub(crate) fn hydrate_answer(&self, answer: &AnswerRecord) -> AnswerRecord {
        let mut answer = answer.clone();
        answer.author = answer.author_id.as_deref().and_then(|id| self.author_ref(id));
        answer
    }

    /// A case with author summaries filled in and answers ordered by votes.
    pub(crate) fn hydrate(&self, case: &CaseRecord) -> CaseRecord {
        let mut case = case.clone();
        case.author = case.author_id.as_deref().and_then(|id| self.author_ref(id));
        case.answers = case.answers.iter().map(|a| self.hydrate_answer(a)).collect();
        case.answers
            .sort_by(|a, b| b.votes.unwrap_or(0).cmp(&a.votes.unwrap_or(0)));
        case
    }

    pub(crate) fn case_index(&self, id: &str) -> Result<usize, StubError> {
        self.cases
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StubError::not_found("Case not found"))
    }

    /// The case if `user_id` wrote it.
    pub(crate) fn authored_case_index(&self, id: &str, user_id: &str) -> Result<usize, StubError> {
        let index = self.case_index(id)?;
        if self.cases[index].author_id.as_deref() != Some(user_id) {
            return Err(StubError::forbidden("Only the author can change this case"));
        }
        Ok(index)
    }

    /// One vote's worth of reputation for `user_id`.
    pub(crate) fn credit(&mut self, user_id: &str, credit: Credit) {
        let Some(user) = self.user_mut(user_id) else {
            return;
        };
        let record = &mut user.record;
        record.score = Some(record.score.unwrap_or(0.0) + 1.0);
        let counter = match credit {
            Credit::Case => &mut record.case_votes_received,
            Credit::Answer => &mut record.answer_votes_received,
        };
        *counter = Some(counter.unwrap_or(0) + 1);
    }

    /// Users by score, highest first.
    pub(crate) fn leaderboard(&self, limit: usize) -> Vec<LeaderEntry> {
        let mut rows: Vec<LeaderEntry> = self
            .users
            .iter()
            .map(|u| LeaderEntry {
                id: u.record.id.clone(),
                first_name: u.record.first_name.clone(),
                last_name: u.record.last_name.clone(),
                score: u.record.score,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .total_cmp(&a.score.unwrap_or(0.0))
        });
        rows.truncate(limit);
        rows
    }
}

fn seed_user(first: &str, last: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        first_name: first.into(),
        last_name: last.into(),
        email: email.into(),
        password: "password".into(),
        phone_number: "+233201234567".into(),
        country: "Ghana".into(),
        hospital: "Korle Bu Teaching Hospital".into(),
        license_number: format!("MDC-{}", first.to_uppercase()),
        ..RegisterRequest::default()
    }
}

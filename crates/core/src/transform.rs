//! Case Transform: backend case and answer records into view models.
//!
//! The transform is pure. The current time is an argument so that the same record and the same
//! instant always give the same view.

use crate::constants::UNKNOWN_AUTHOR;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use medconnect_api_shared::{AnswerRecord, AuthorRef, CaseRecord, MediaItem};
use medconnect_types::Urgency;

const NO_COUNTRY: &str = "—";

/// A file attached to an answer.
#[derive(Clone, Debug, PartialEq)]
pub struct AttachmentView {
    pub url: String,
    pub name: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnswerView {
    pub id: String,
    pub author_id: Option<String>,
    pub author: String,
    pub content: Option<String>,
    pub specialty: String,
    pub author_score: f64,
    pub votes: u32,
    pub attachment: Option<AttachmentView>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaseView {
    pub id: String,
    pub author_id: Option<String>,
    pub title: String,
    pub author: String,
    pub specialty: String,
    /// The author's hospital, then the case's own `country`, then `—`.
    pub country: String,
    pub description: String,
    /// Relative label for `created_at`, e.g. `"5m ago"`. Empty when the timestamp is missing.
    pub time: String,
    pub created_at: Option<String>,
    pub votes: u32,
    /// Sorted by votes, highest first. Ties keep the server order.
    pub answers: Vec<AnswerView>,
    /// `None` for records whose urgency label is missing or unrecognised.
    pub urgency: Option<Urgency>,
    pub tags: Vec<String>,
    pub media: Vec<MediaItem>,
    pub closed: bool,
    pub edited: bool,
    /// Relative label for the last edit.
    pub edited_at: Option<String>,
    pub author_score: f64,
}

impl CaseView {
    /// Highest-voted answer, first one on ties.
    pub fn top_answer(&self) -> Option<&AnswerView> {
        self.answers.first()
    }

    pub fn answer(&self, id: &str) -> Option<&AnswerView> {
        self.answers.iter().find(|a| a.id == id)
    }

    /// Creation time in milliseconds since the epoch. Missing or unparseable timestamps count as 0.
    pub fn created_at_millis(&self) -> i64 {
        self.created_at
            .as_deref()
            .and_then(parse_timestamp)
            .map(|t| t.timestamp_millis())
            .unwrap_or(0)
    }

    /// Insert an answer and restore the vote ordering.
    pub fn push_answer(&mut self, answer: AnswerView) {
        self.answers.push(answer);
        sort_answers(&mut self.answers);
    }
}

/// `first last`, trimmed; `"Unknown"` when both are empty.
pub fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    let name = format!("{} {}", first.unwrap_or(""), last.unwrap_or(""));
    let name = name.trim();
    if name.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        name.to_string()
    }
}

fn author_name(author: Option<&AuthorRef>) -> String {
    display_name(
        author.and_then(|a| a.first_name.as_deref()),
        author.and_then(|a| a.last_name.as_deref()),
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Stable sort, highest votes first.
pub fn sort_answers(answers: &mut [AnswerView]) {
    answers.sort_by(|a, b| b.votes.cmp(&a.votes));
}

pub fn to_answer_view(raw: &AnswerRecord) -> AnswerView {
    let author = raw.author.as_ref();
    AnswerView {
        id: raw.id.clone(),
        author_id: non_empty(author.and_then(|a| a.id.as_deref()))
            .or(raw.author_id.as_deref())
            .map(str::to_owned),
        author: author_name(author),
        content: raw.content.clone(),
        specialty: non_empty(author.and_then(|a| a.specialty.as_deref()))
            .or(non_empty(raw.specialty.as_deref()))
            .unwrap_or(UNKNOWN_AUTHOR)
            .to_string(),
        author_score: author.and_then(|a| a.score).unwrap_or(0.0),
        votes: raw.votes.unwrap_or(0),
        attachment: raw.attachment_url.clone().map(|url| AttachmentView {
            url,
            name: raw.attachment_name.clone(),
            mime_type: raw.attachment_mime_type.clone(),
            size: raw.attachment_size,
        }),
    }
}

pub fn to_case_view(raw: &CaseRecord, now: DateTime<Utc>) -> CaseView {
    let author = raw.author.as_ref();
    let mut answers: Vec<AnswerView> = raw.answers.iter().map(to_answer_view).collect();
    sort_answers(&mut answers);

    CaseView {
        id: raw.id.clone(),
        author_id: non_empty(author.and_then(|a| a.id.as_deref()))
            .or(raw.author_id.as_deref())
            .map(str::to_owned),
        title: raw.title.clone(),
        author: author_name(author),
        specialty: non_empty(author.and_then(|a| a.specialty.as_deref()))
            .or(non_empty(raw.specialty.as_deref()))
            .unwrap_or(UNKNOWN_AUTHOR)
            .to_string(),
        country: non_empty(author.and_then(|a| a.hospital.as_deref()))
            .or(non_empty(raw.country.as_deref()))
            .unwrap_or(NO_COUNTRY)
            .to_string(),
        description: raw.description.clone(),
        time: raw
            .created_at
            .as_deref()
            .map(|ts| relative_label(ts, now))
            .unwrap_or_default(),
        created_at: raw.created_at.clone(),
        votes: raw.votes.unwrap_or(0),
        answers,
        urgency: raw.urgency,
        tags: raw.tags.clone(),
        media: raw.media.clone(),
        closed: raw.closed.unwrap_or(false),
        edited: raw.edited.unwrap_or(false),
        edited_at: raw
            .edited_at
            .as_deref()
            .map(|ts| relative_label(ts, now))
            .filter(|l| !l.is_empty()),
        author_score: author.and_then(|a| a.score).unwrap_or(0.0),
    }
}

/// Parse an API timestamp: RFC 3339, a naive date-time taken as UTC, or a bare date.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(t.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

fn relative_label(value: &str, now: DateTime<Utc>) -> String {
    parse_timestamp(value)
        .map(|then| relative_time(then, now))
        .unwrap_or_default()
}

/// `just now`, `{m}m ago`, `{h}h ago`, `{d}d ago`, then a `M/D/YYYY` date.
///
/// Units are floored. Timestamps in the future read as `just now`.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_milliseconds().div_euclid(60_000);
    let hours = minutes.div_euclid(60);
    let days = hours.div_euclid(24);

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        then.format("%-m/%-d/%Y").to_string()
    }
}

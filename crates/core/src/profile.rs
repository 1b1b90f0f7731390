//! The signed-in user's profile as the client holds it.

use crate::constants::MAX_CREDENTIALS;
use crate::transform::display_name;
use medconnect_api_shared::{ProfileUpdate, UserRecord};
use medconnect_types::Role;

const DEFAULT_TITLE: &str = "Dr.";

/// Which counter a received vote moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteKind {
    Case,
    Answer,
}

/// A view over [`UserRecord`] with defaults filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: String,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub country: String,
    pub hospital: String,
    pub specialty: String,
    pub license_number: String,
    pub profile_picture: Option<String>,
    pub credentials: Vec<String>,
    pub bio: String,
    pub score: f64,
    pub answer_votes_received: i64,
    pub case_votes_received: i64,
    pub show_phone: bool,
    pub show_email: bool,
    pub role: Role,
}

impl Profile {
    /// `None` when the record carries no id.
    pub fn from_record(user: &UserRecord) -> Option<Self> {
        let id = user.id.clone().filter(|id| !id.is_empty())?;
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Some(Self {
            id,
            title: user
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            first_name: text(&user.first_name),
            last_name: text(&user.last_name),
            email: text(&user.email),
            phone_number: text(&user.phone_number),
            country: text(&user.country),
            hospital: text(&user.hospital),
            specialty: text(&user.specialty),
            license_number: text(&user.license_number),
            profile_picture: user.profile_picture.clone(),
            credentials: user.credentials.clone().unwrap_or_default(),
            bio: text(&user.bio),
            score: user.score.unwrap_or(0.0),
            answer_votes_received: user.answer_votes_received.unwrap_or(0),
            case_votes_received: user.case_votes_received.unwrap_or(0),
            show_phone: user.show_phone.unwrap_or(true),
            show_email: user.show_email.unwrap_or(true),
            role: user.role.unwrap_or_default(),
        })
    }

    pub fn display_name(&self) -> String {
        display_name(Some(&self.first_name), Some(&self.last_name))
    }

    /// `Dr. Ama Mensah`
    pub fn full_title(&self) -> String {
        format!("{} {}", self.title, self.display_name())
    }

    pub fn formatted_phone(&self) -> String {
        format_phone_for_display(&self.phone_number)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Apply a score change seen on one of this user's posts. The score is kept to two decimals
    /// and the matching vote counter moves by one in the direction of the change.
    pub fn apply_vote_delta(&mut self, kind: VoteKind, delta: f64) {
        self.score = round2(self.score + delta);
        let step = if delta > 0.0 { 1 } else { -1 };
        match kind {
            VoteKind::Case => self.case_votes_received += step,
            VoteKind::Answer => self.answer_votes_received += step,
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Keep digits only, with one leading `+` if the input started with one.
pub fn normalize_phone_number(input: &str) -> String {
    let trimmed = input.trim();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}

/// Group digits in threes for display: `+233 244 123 456`.
pub fn format_phone_for_display(input: &str) -> String {
    let normalized = normalize_phone_number(input);
    let (prefix, digits) = match normalized.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", normalized.as_str()),
    };
    let groups: Vec<String> = digits
        .as_bytes()
        .chunks(3)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect();
    format!("{prefix}{}", groups.join(" "))
}

/// Tidy a profile update before it is sent: credentials trimmed, blanks dropped and capped,
/// phone normalised.
pub fn prepare_profile_update(mut update: ProfileUpdate) -> ProfileUpdate {
    if let Some(credentials) = update.credentials.take() {
        update.credentials = Some(
            credentials
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .take(MAX_CREDENTIALS)
                .collect(),
        );
    }
    if let Some(phone) = update.phone_number.take() {
        update.phone_number = Some(normalize_phone_number(&phone));
    }
    update
}

//! Validated primitives shared across the MedConnect crates.
//!
//! These types carry their invariants in the type system so the client, the stub backend and
//! the CLI never have to re-check them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors raised when parsing one of the closed enumerations below.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown urgency: {0}")]
    UnknownUrgency(String),
    #[error("unknown hospital level: {0}")]
    UnknownHospitalLevel(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Urgency classification of a posted case.
///
/// The wire form is the human-readable label, e.g. `"Urgent ongoing case"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(rename = "Urgent ongoing case")]
    Urgent,
    #[serde(rename = "Non-urgent ongoing case")]
    NonUrgent,
    #[serde(rename = "Case study")]
    CaseStudy,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Urgent, Urgency::NonUrgent, Urgency::CaseStudy];

    pub fn label(self) -> &'static str {
        match self {
            Urgency::Urgent => "Urgent ongoing case",
            Urgency::NonUrgent => "Non-urgent ongoing case",
            Urgency::CaseStudy => "Case study",
        }
    }

    /// Sort priority for the trending feed. Lower sorts first.
    pub fn priority(self) -> u8 {
        match self {
            Urgency::Urgent => 0,
            Urgency::NonUrgent => 1,
            Urgency::CaseStudy => 2,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Urgency {
    type Err = TypeError;

    /// Accepts the wire label or a short alias (`urgent`, `non-urgent`, `study`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(u) = Urgency::ALL.into_iter().find(|u| u.label() == trimmed) {
            return Ok(u);
        }
        match trimmed.to_lowercase().as_str() {
            "urgent" => Ok(Urgency::Urgent),
            "non-urgent" | "nonurgent" => Ok(Urgency::NonUrgent),
            "study" | "case-study" => Ok(Urgency::CaseStudy),
            _ => Err(TypeError::UnknownUrgency(s.to_owned())),
        }
    }
}

/// Account role. Anything the backend sends that is not recognised is treated as a doctor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Doctor,
    Admin,
    HospitalAdmin,
}

impl Role {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            "hospital_admin" => Role::HospitalAdmin,
            _ => Role::Doctor,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Role::from_wire(&s))
    }
}

/// Kind of media attached to a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Videos are recognised by MIME type prefix; everything else is shown as an image.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("video") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

/// Care level of a hospital in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HospitalLevel {
    Primary,
    Secondary,
    Tertiary,
}

impl HospitalLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            HospitalLevel::Primary => "primary",
            HospitalLevel::Secondary => "secondary",
            HospitalLevel::Tertiary => "tertiary",
        }
    }
}

impl FromStr for HospitalLevel {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(HospitalLevel::Primary),
            "secondary" => Ok(HospitalLevel::Secondary),
            "tertiary" => Ok(HospitalLevel::Tertiary),
            _ => Err(TypeError::UnknownHospitalLevel(s.to_owned())),
        }
    }
}

//! # API Shared
//!
//! Wire models and shared helpers for the MedConnect REST API.
//!
//! Contains:
//! - Serde records for every resource the backend exposes (`cases`, `users`, `directory`,
//!   `messaging`, `admin`)
//! - The `{success, data}` envelope and the `{error, message, details}` error body
//! - Bearer-token helpers and the health payload
//!
//! Used by `medconnect-core` (the client) and `medconnect-api-stub` (the in-memory backend).

pub mod admin;
pub mod auth;
pub mod cases;
pub mod directory;
pub mod envelope;
pub mod health;
pub mod messaging;
pub mod users;

pub use cases::{
    AnswerRecord, AuthorRef, CaseList, CasePage, CaseRecord, CaseUpdate, MediaItem, NewCase,
};
pub use directory::{ClinicSchedule, Hospital, HospitalServices};
pub use envelope::{Envelope, ErrorBody, FieldIssue};
pub use health::{HealthRes, HealthService};
pub use messaging::{Conversation, Message, MessageKind, ParticipantLink, ParticipantUser};
pub use users::{
    AuthResponse, LeaderEntry, LoginRequest, ProfileUpdate, RegisterRequest, UserRecord,
};

pub use medconnect_types::{HospitalLevel, MediaKind, NonEmptyText, Role, Urgency};

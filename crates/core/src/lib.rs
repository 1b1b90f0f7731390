//! # MedConnect Core
//!
//! Client-side logic for the MedConnect case-discussion platform.
//!
//! This crate talks to the MedConnect REST API and keeps the client's view of it consistent:
//! - a single request wrapper handling auth headers, envelopes and error normalisation
//! - typed bindings for every resource (auth, cases, answers, users, hospitals, conversations,
//!   leaderboard, admin)
//! - the case transform, feed pagination and sorting, vote reconciliation and authoring rules
//! - the cached session and profile
//!
//! **No presentation concerns**: rendering and prompting belong in `medconnect-cli`.

pub mod attachment;
pub mod authoring;
pub mod board;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod messaging;
pub mod profile;
pub mod resources;
pub mod session;
pub mod transform;
pub mod votes;

#[cfg(test)]
mod testing;

pub use attachment::Attachment;
pub use board::{CaseBoard, LeaderRow};
pub use client::{ApiClient, RequestBody};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use feed::{FeedController, FeedFilters, FeedStatus, FeedTab};
pub use gateway::CaseGateway;
pub use profile::Profile;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use transform::{AnswerView, CaseView};
pub use votes::{VoteOutcome, VoteTarget};

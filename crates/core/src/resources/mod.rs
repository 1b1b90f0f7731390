//! Typed bindings for each REST resource.
//!
//! Each submodule adds an `impl ApiClient` block. Every binding goes through
//! [`ApiClient::request`](crate::client::ApiClient::request).

pub mod admin;
pub mod answers;
pub mod auth;
pub mod cases;
pub mod conversations;
pub mod hospitals;
pub mod leaderboard;
pub mod users;

pub use admin::AdminUserQuery;
pub use answers::AnswerDraft;
pub use cases::CaseFilters;
pub use conversations::{MessageDraft, NewConversation};
pub use hospitals::HospitalFilters;
pub use users::UserFilters;

use crate::client::Query;

/// Push `key=value` when the trimmed value is non-empty.
pub(crate) fn push_text(query: &mut Query, key: &'static str, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        query.push((key, v.to_string()));
    }
}

/// Push one `key=value` pair per non-empty item.
pub(crate) fn push_repeated(query: &mut Query, key: &'static str, values: &[String]) {
    for v in values {
        push_text(query, key, Some(v));
    }
}

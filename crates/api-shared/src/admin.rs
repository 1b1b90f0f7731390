//! Admin console listings. Each listing wraps its rows in a named field.

use crate::cases::AnswerRecord;
use crate::messaging::Message;
use crate::users::UserRecord;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminUsers {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminMessages {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminAnswers {
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

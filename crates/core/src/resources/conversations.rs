//! `/conversations` bindings.

use crate::attachment::Attachment;
use crate::client::{ApiClient, Query, RequestBody};
use crate::error::ApiResult;
use medconnect_api_shared::{Conversation, Message, MessageKind};
use reqwest::multipart::Form;
use reqwest::Method;
use serde_json::json;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageDraft {
    pub content: Option<String>,
    pub kind: Option<MessageKind>,
    pub attachment: Option<Attachment>,
}

impl MessageDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            kind: Some(MessageKind::Text),
            attachment: None,
        }
    }

    fn append_to(self, mut form: Form) -> ApiResult<Form> {
        if let Some(content) = self.content.filter(|c| !c.is_empty()) {
            form = form.text("content", content);
        }
        if let Some(kind) = self.kind {
            form = form.text("type", kind.as_str());
        }
        if let Some(attachment) = self.attachment {
            form = form.part("attachment", attachment.into_part()?);
        }
        Ok(form)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewConversation {
    pub participant_ids: Vec<String>,
    pub title: Option<String>,
    pub message: Option<MessageDraft>,
}

impl ApiClient {
    pub async fn list_conversations(&self) -> ApiResult<Vec<Conversation>> {
        Ok(self
            .get_list("/conversations", &Query::new())
            .await?
            .unwrap_or_default())
    }

    pub async fn get_conversation(&self, id: &str) -> ApiResult<Conversation> {
        self.get(&format!("/conversations/{id}"), &Query::new())
            .await
    }

    /// Start a conversation. `participantIds` travels as a JSON string inside the form.
    pub async fn create_conversation(&self, new: NewConversation) -> ApiResult<Conversation> {
        let ids = json!(new.participant_ids).to_string();
        let mut form = Form::new().text("participantIds", ids);
        if let Some(title) = new.title.filter(|t| !t.is_empty()) {
            form = form.text("title", title);
        }
        if let Some(message) = new.message {
            form = message.append_to(form)?;
        }
        self.send(Method::POST, "/conversations", RequestBody::Multipart(form))
            .await
    }

    pub async fn post_message(&self, conversation_id: &str, draft: MessageDraft) -> ApiResult<Message> {
        let form = draft.append_to(Form::new())?;
        self.send(
            Method::POST,
            &format!("/conversations/{conversation_id}/messages"),
            RequestBody::Multipart(form),
        )
        .await
    }

    pub async fn update_conversation_title(
        &self,
        conversation_id: &str,
        title: &str,
    ) -> ApiResult<Conversation> {
        self.send(
            Method::PUT,
            &format!("/conversations/{conversation_id}/title"),
            RequestBody::Json(json!({ "title": title })),
        )
        .await
    }
}

//! `/answers` bindings. Answers always go out as multipart forms.

use crate::attachment::Attachment;
use crate::client::{ApiClient, RequestBody};
use crate::error::ApiResult;
use medconnect_api_shared::{AnswerRecord, CaseRecord};
use reqwest::multipart::Form;
use reqwest::Method;

/// An answer as typed by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnswerDraft {
    pub content: Option<String>,
    pub specialty: Option<String>,
    pub attachment: Option<Attachment>,
}

impl AnswerDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Trimmed content, or `None` when blank.
    pub fn trimmed_content(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// An answer needs text, an attachment, or both.
    pub fn is_empty(&self) -> bool {
        self.trimmed_content().is_none() && self.attachment.is_none()
    }

    fn into_form(self, trim_content: bool) -> ApiResult<Form> {
        let mut form = Form::new();
        let content = if trim_content {
            self.trimmed_content().map(str::to_owned)
        } else {
            self.content.clone().filter(|c| !c.is_empty())
        };
        if let Some(content) = content {
            form = form.text("content", content);
        }
        if let Some(specialty) = self.specialty.filter(|s| !s.is_empty()) {
            form = form.text("specialty", specialty);
        }
        if let Some(attachment) = self.attachment {
            form = form.part("attachment", attachment.into_part()?);
        }
        Ok(form)
    }
}

impl ApiClient {
    pub async fn create_answer(&self, case_id: &str, draft: AnswerDraft) -> ApiResult<AnswerRecord> {
        let form = draft.into_form(true)?;
        self.send(
            Method::POST,
            &format!("/answers/{case_id}"),
            RequestBody::Multipart(form),
        )
        .await
    }

    pub async fn update_answer(
        &self,
        case_id: &str,
        answer_id: &str,
        draft: AnswerDraft,
    ) -> ApiResult<AnswerRecord> {
        let form = draft.into_form(false)?;
        self.send(
            Method::PUT,
            &format!("/answers/{case_id}/{answer_id}"),
            RequestBody::Multipart(form),
        )
        .await
    }

    pub async fn delete_answer(&self, case_id: &str, answer_id: &str) -> ApiResult<()> {
        self.send_unit(
            Method::DELETE,
            &format!("/answers/{case_id}/{answer_id}"),
            RequestBody::Empty,
        )
        .await
    }

    /// Upvote an answer. The server answers with the entire updated case.
    pub async fn vote_answer(&self, case_id: &str, answer_id: &str) -> ApiResult<CaseRecord> {
        self.send(
            Method::POST,
            &format!("/answers/{case_id}/{answer_id}/vote"),
            RequestBody::Empty,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_answer_is_empty() {
        assert!(AnswerDraft::default().is_empty());
        assert!(AnswerDraft::text("   ").is_empty());
        assert!(!AnswerDraft::text(" consider CT ").is_empty());
    }

    #[test]
    fn attachment_alone_is_enough() {
        let draft = AnswerDraft {
            attachment: Some(Attachment::from_bytes("ecg.png", vec![0])),
            ..AnswerDraft::default()
        };
        assert!(!draft.is_empty());
        assert_eq!(draft.trimmed_content(), None);
    }

    #[test]
    fn content_is_trimmed() {
        assert_eq!(
            AnswerDraft::text("  start antibiotics \n").trimmed_content(),
            Some("start antibiotics")
        );
    }
}

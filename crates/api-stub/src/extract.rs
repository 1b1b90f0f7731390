//! Request extractors shared by the route handlers.

use crate::error::StubError;
use crate::StubState;
use axum::async_trait;
use axum::extract::{FromRequestParts, Multipart};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use medconnect_api_shared::auth::bearer_token;
use std::collections::HashMap;

/// The id of the user owning the request's bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser(pub String);

#[async_trait]
impl FromRequestParts<StubState> for CurrentUser {
    type Rejection = StubError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &StubState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| StubError::unauthorised("No token provided"))?;
        let store = state.store.read().await;
        store
            .tokens
            .get(token)
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| StubError::unauthorised("Invalid token"))
    }
}

/// A file part of a multipart form. Only its metadata is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl UploadedFile {
    /// Where the stub pretends to serve the upload from.
    pub fn url(&self) -> String {
        format!("/uploads/{}-{}", uuid::Uuid::new_v4().simple(), self.name)
    }
}

/// Text fields and the (single) file of a multipart form.
#[derive(Clone, Debug, Default)]
pub struct FormFields {
    pub text: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl FormFields {
    /// Trimmed text of a field, or `None` when absent or blank.
    pub fn trimmed(&self, name: &str) -> Option<String> {
        self.text
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

pub async fn read_form(mut multipart: Multipart) -> Result<FormFields, StubError> {
    let mut fields = FormFields::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StubError::bad_request(format!("Invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_owned) {
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| StubError::bad_request(format!("Invalid upload: {e}")))?;
            fields.file = Some(UploadedFile {
                name: file_name,
                mime_type,
                size: bytes.len() as u64,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| StubError::bad_request(format!("Invalid form field: {e}")))?;
            fields.text.insert(name, value);
        }
    }
    Ok(fields)
}

//! The single request wrapper every resource binding goes through.
//!
//! Responsibilities:
//! - attach `Authorization: Bearer <token>` whenever a token is installed
//! - send JSON bodies with `Content-Type: application/json`, and leave multipart bodies alone so
//!   the transport writes the boundary
//! - unwrap the `{success, data}` envelope, or pass bare payloads through
//! - normalise failures into [`ApiError`]
//!
//! There are no retries, no timeouts and no caching. Every call is a fresh round trip.

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use medconnect_api_shared::auth::authorization_value;
use medconnect_api_shared::FieldIssue;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};

/// Body of an outgoing request.
pub enum RequestBody {
    Empty,
    /// A structured body, serialised as JSON.
    Json(Value),
    /// A pre-serialised body, sent verbatim.
    Text(String),
    /// A multipart form, used whenever a file is attached.
    Multipart(Form),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> ApiResult<Self> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }

    fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

/// Query string pairs. Repeated keys are allowed (`tags=a&tags=b`).
pub type Query = Vec<(&'static str, String)>;

/// HTTP client for the MedConnect API.
///
/// Cloning is cheap and clones share the installed session token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(ApiError::Network)?;
        Ok(Self {
            http,
            config,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Install or remove the bearer token attached to every request.
    pub fn set_token(&self, token: Option<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Issue a request and return the unwrapped payload.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: RequestBody,
    ) -> ApiResult<Value> {
        let url = self.config.endpoint(path);
        let mut builder = self.http.request(method.clone(), &url);

        if !query.is_empty() {
            builder = builder.query(query);
        }
        if !body.is_multipart() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        if let Some(token) = self.token() {
            builder = builder.header(AUTHORIZATION, authorization_value(&token));
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(serde_json::to_vec(&value)?),
            RequestBody::Text(text) => builder.body(text),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        tracing::debug!(%method, path, "api request");

        let response = builder.send().await.map_err(ApiError::Network)?;
        let status = response.status();
        let text = response.text().await.map_err(ApiError::Network)?;
        let data = decode_body(&text);

        if !status.is_success() {
            let err = error_from_body(status.as_u16(), &data);
            tracing::debug!(status = status.as_u16(), path, "api request failed: {err}");
            return Err(err);
        }

        Ok(unwrap_envelope(data))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, query: &Query) -> ApiResult<T> {
        let value = self.request(Method::GET, path, query, RequestBody::Empty).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// GET a listing that should be an array. Anything else yields `None`.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> ApiResult<Option<Vec<T>>> {
        let value = self.request(Method::GET, path, query, RequestBody::Empty).await?;
        decode_list(value)
    }

    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> ApiResult<T> {
        let value = self.request(method, path, &[], body).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a request whose response payload is not needed.
    pub(crate) async fn send_unit(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> ApiResult<()> {
        self.request(method, path, &[], body).await.map(|_| ())
    }
}

/// Parse a response body. Empty bodies become `{}`; non-JSON text becomes an error object
/// carrying the text.
pub fn decode_body(text: &str) -> Value {
    if text.is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| {
        let message = if text.trim().is_empty() {
            "Request failed"
        } else {
            text
        };
        json!({ "error": message, "message": message })
    })
}

/// Return `data` from a `{success, data}` envelope, or the whole body when it is not enveloped.
///
/// An envelope without a `data` field yields the whole envelope.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("success") => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Build an [`ApiError::Status`] from a decoded error body.
///
/// The message prefers `error`, then `message`, then a generic status line. Validation details
/// are appended to the message as `: first; second`.
pub fn error_from_body(status: u16, body: &Value) -> ApiError {
    let base = non_empty_str(body.get("error"))
        .or_else(|| non_empty_str(body.get("message")))
        .map(str::to_owned)
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    let details: Vec<FieldIssue> = body
        .get("details")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(field_issue).collect())
        .unwrap_or_default();

    let message = if details.is_empty() {
        base
    } else {
        let joined = details
            .iter()
            .filter_map(FieldIssue::text)
            .collect::<Vec<_>>()
            .join("; ");
        format!("{base}: {joined}")
    };

    ApiError::Status {
        status,
        message,
        details,
    }
}

/// Lenient detail parsing. A detail that is not an object is kept as its JSON text.
fn field_issue(value: &Value) -> FieldIssue {
    let param = value.get("param").and_then(Value::as_str).map(str::to_owned);
    let msg = value.get("msg").and_then(Value::as_str).map(str::to_owned);
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned);
    if msg.is_none() && message.is_none() {
        return FieldIssue {
            param,
            msg: None,
            message: Some(value.to_string()),
        };
    }
    FieldIssue {
        param,
        msg,
        message,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub(crate) fn decode_list<T: DeserializeOwned>(value: Value) -> ApiResult<Option<Vec<T>>> {
    match value {
        Value::Array(_) => Ok(Some(serde_json::from_value(value)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_enveloped_data() {
        let body = json!({ "success": true, "data": { "id": "123" } });
        assert_eq!(unwrap_envelope(body), json!({ "id": "123" }));
    }

    #[test]
    fn envelope_without_data_returns_whole_body() {
        let body = json!({ "success": true, "message": "done" });
        assert_eq!(unwrap_envelope(body.clone()), body);
    }

    #[test]
    fn bare_payloads_pass_through() {
        let body = json!([{ "id": "1" }]);
        assert_eq!(unwrap_envelope(body.clone()), body);
    }

    #[test]
    fn empty_body_decodes_to_empty_object() {
        assert_eq!(decode_body(""), json!({}));
    }

    #[test]
    fn non_json_body_becomes_error_text() {
        let value = decode_body("Bad Gateway");
        assert_eq!(value["error"], "Bad Gateway");
        let err = error_from_body(502, &value);
        assert_eq!(err.to_string(), "Bad Gateway");
    }

    #[test]
    fn error_prefers_error_then_message_then_status() {
        let err = error_from_body(400, &json!({ "error": "Bad Request", "message": "ignored" }));
        assert_eq!(err.to_string(), "Bad Request");

        let err = error_from_body(403, &json!({ "message": "Forbidden" }));
        assert_eq!(err.to_string(), "Forbidden");

        let err = error_from_body(500, &json!({}));
        assert_eq!(err.to_string(), "Request failed with status 500");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn validation_details_are_appended() {
        let body = json!({
            "error": "Validation failed",
            "details": [
                { "param": "email", "msg": "Email is invalid" },
                { "param": "password", "message": "Too short" }
            ]
        });
        let err = error_from_body(400, &body);
        assert_eq!(
            err.to_string(),
            "Validation failed: Email is invalid; Too short"
        );
        assert!(err.is_validation());
        assert_eq!(err.details().len(), 2);
        assert_eq!(err.details()[0].param.as_deref(), Some("email"));
    }

    #[test]
    fn odd_details_keep_their_json_text() {
        let err = error_from_body(400, &json!({ "error": "Nope", "details": ["raw"] }));
        assert_eq!(err.to_string(), "Nope: \"raw\"");
    }

    #[test]
    fn decode_list_ignores_non_arrays() {
        let none: Option<Vec<Value>> = decode_list(json!({ "rows": [] })).expect("decodes");
        assert!(none.is_none());
        let some: Option<Vec<u32>> = decode_list(json!([1, 2])).expect("decodes");
        assert_eq!(some, Some(vec![1, 2]));
    }

    #[test]
    fn token_is_shared_between_clones() {
        let cfg = ClientConfig::new("http://localhost:1/api", "s.json".into()).expect("config");
        let client = ApiClient::new(cfg).expect("client");
        let clone = client.clone();
        client.set_token(Some("tok".into()));
        assert_eq!(clone.token().as_deref(), Some("tok"));
        clone.set_token(None);
        assert_eq!(client.token(), None);
    }
}

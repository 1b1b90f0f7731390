//! Bearer-token helpers usable by both the client and the stub backend.

const BEARER_PREFIX: &str = "Bearer ";

/// Formats the `Authorization` header value for a session token.
pub fn authorization_value(token: &str) -> String {
    format!("{BEARER_PREFIX}{token}")
}

/// Extracts the token from an `Authorization` header value.
///
/// Returns `None` when the scheme is not `Bearer` or the token is blank.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

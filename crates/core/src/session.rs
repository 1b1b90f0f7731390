//! Session and profile cache.
//!
//! The bearer token and the user record are cached between runs by a [`SessionStore`]. The
//! session installs the token on its [`ApiClient`] and exposes the signed-in [`Profile`].
//!
//! Lifecycle:
//! - created by login or registration
//! - restored at startup from the cache, asking `/auth/me` when only the token is cached
//! - cleared on logout or on any 401

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::profile::{normalize_phone_number, prepare_profile_update, Profile};
use medconnect_api_shared::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, UserRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What is cached between runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
}

pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when nothing is cached. An unreadable cache is an error.
    fn load(&self) -> ApiResult<Option<CachedSession>>;
    fn save(&self, session: &CachedSession) -> ApiResult<()>;
    fn clear(&self) -> ApiResult<()>;
}

/// JSON file holding `{token, user}`.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> ApiResult<Option<CachedSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| ApiError::Session(format!("failed to read {}: {e}", self.path.display())))?;
        let session = serde_json::from_str(&raw)
            .map_err(|e| ApiError::Session(format!("failed to parse {}: {e}", self.path.display())))?;
        Ok(Some(session))
    }

    fn save(&self, session: &CachedSession) -> ApiResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ApiError::Session(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)
            .map_err(|e| ApiError::Session(format!("failed to write {}: {e}", self.path.display())))
    }

    fn clear(&self) -> ApiResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Session(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

/// In-process store, for tests and one-shot tools.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<CachedSession>>,
}

impl MemorySessionStore {
    pub fn with(session: CachedSession) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> ApiResult<Option<CachedSession>> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &CachedSession) -> ApiResult<()> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Registration form as typed, including the password confirmation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub request: RegisterRequest,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Check the required fields and build the request: text trimmed, phone normalised.
    pub fn into_request(self) -> ApiResult<RegisterRequest> {
        let r = &self.request;
        let required = [
            &r.first_name,
            &r.last_name,
            &r.email,
            &r.password,
            &r.phone_number,
            &r.country,
            &r.license_number,
        ];
        if required.iter().any(|v| v.trim().is_empty()) {
            return Err(ApiError::InvalidInput(
                "Please fill in all required fields".into(),
            ));
        }
        if r.password != self.confirm_password {
            return Err(ApiError::InvalidInput("Passwords do not match".into()));
        }

        let r = self.request;
        Ok(RegisterRequest {
            title: r.title.trim().to_string(),
            first_name: r.first_name.trim().to_string(),
            last_name: r.last_name.trim().to_string(),
            email: r.email.trim().to_string(),
            password: r.password,
            phone_number: normalize_phone_number(&r.phone_number),
            country: r.country.trim().to_string(),
            hospital: r.hospital.trim().to_string(),
            specialty: r.specialty.trim().to_string(),
            license_number: r.license_number.trim().to_string(),
            bio: r.bio.trim().to_string(),
            credentials: r.credentials,
        })
    }
}

pub struct Session<S> {
    store: S,
    client: ApiClient,
    profile: Option<Profile>,
}

impl<S: SessionStore> Session<S> {
    pub fn new(store: S, client: ApiClient) -> Self {
        Self {
            store,
            client,
            profile: None,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn profile_mut(&mut self) -> Option<&mut Profile> {
        self.profile.as_mut()
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    fn install(&mut self, token: String, user: UserRecord) -> ApiResult<&Profile> {
        let profile = Profile::from_record(&user)
            .ok_or_else(|| ApiError::Session("user record has no id".into()))?;
        self.store.save(&CachedSession {
            token: Some(token.clone()),
            user: Some(user),
        })?;
        self.client.set_token(Some(token));
        tracing::info!(user_id = %profile.id, "session established");
        Ok(&*self.profile.insert(profile))
    }

    fn forget(&mut self) -> ApiResult<()> {
        self.client.set_token(None);
        self.profile = None;
        self.store.clear()
    }

    /// Rebuild the session from the cache. Returns whether a user is signed in afterwards.
    pub async fn restore(&mut self) -> ApiResult<bool> {
        let cached = match self.store.load() {
            Ok(cached) => cached.unwrap_or_default(),
            Err(err) => {
                tracing::warn!("discarding unreadable session cache: {err}");
                self.forget()?;
                return Ok(false);
            }
        };

        let Some(token) = cached.token.filter(|t| !t.is_empty()) else {
            self.forget()?;
            return Ok(false);
        };

        if let Some(profile) = cached.user.as_ref().and_then(Profile::from_record) {
            self.client.set_token(Some(token));
            self.profile = Some(profile);
            return Ok(true);
        }

        self.client.set_token(Some(token.clone()));
        match self.client.me().await {
            Ok(user) if Profile::from_record(&user).is_some() => {
                self.install(token, user)?;
                Ok(true)
            }
            Ok(_) => {
                tracing::info!("cached token did not resolve to a user");
                self.forget()?;
                Ok(false)
            }
            Err(err) => {
                tracing::info!("cached token rejected: {err}");
                self.forget()?;
                Ok(false)
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> ApiResult<&Profile> {
        if email.trim().is_empty() || password.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "Please enter email and password".into(),
            ));
        }
        let AuthResponse { token, user } = self
            .client
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.install(token, user)
    }

    pub async fn register(&mut self, form: RegistrationForm) -> ApiResult<&Profile> {
        let request = form.into_request()?;
        let AuthResponse { token, user } = self.client.register(&request).await?;
        self.install(token, user)
    }

    pub fn logout(&mut self) -> ApiResult<()> {
        tracing::info!("session cleared");
        self.forget()
    }

    /// Clear the session if `err` says the token is no longer valid. Returns whether it did.
    pub fn invalidate_on(&mut self, err: &ApiError) -> bool {
        if !err.is_unauthorised() {
            return false;
        }
        tracing::info!("session invalidated by 401");
        if let Err(clear_err) = self.forget() {
            tracing::warn!("failed to clear session cache: {clear_err}");
        }
        true
    }

    /// Send a profile update. The returned record replaces the cached user.
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> ApiResult<&Profile> {
        if self.profile.is_none() {
            return Err(ApiError::AuthRequired);
        }
        let update = prepare_profile_update(update);
        let user = self.client.update_profile(&update).await?;
        let token = self
            .client
            .token()
            .ok_or_else(|| ApiError::Session("no token installed".into()))?;
        self.install(token, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn offline_client() -> ApiClient {
        // Port 9 (discard) is never served in tests, so any request fails as a network error.
        let cfg = ClientConfig::new("http://127.0.0.1:9/api", PathBuf::from("unused.json"))
            .expect("config");
        ApiClient::new(cfg).expect("client")
    }

    fn user() -> UserRecord {
        UserRecord {
            id: Some("u-1".into()),
            first_name: Some("Ama".into()),
            last_name: Some("Mensah".into()),
            ..UserRecord::default()
        }
    }

    #[test]
    fn file_store_round_trips_and_creates_parents() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let store = FileSessionStore::new(dir.path().join("nested/session.json"));
        assert_eq!(store.load().expect("empty load"), None);

        let session = CachedSession {
            token: Some("tok-1".into()),
            user: Some(user()),
        };
        store.save(&session).expect("should save");
        assert_eq!(store.load().expect("should load"), Some(session));

        store.clear().expect("should clear");
        store.clear().expect("clearing twice is fine");
        assert_eq!(store.load().expect("empty load"), None);
    }

    #[test]
    fn corrupt_file_is_a_session_error() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").expect("write");
        match FileSessionStore::new(&path).load() {
            Err(ApiError::Session(msg)) => assert!(msg.contains("failed to parse")),
            other => panic!("Expected Session error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cached_token_and_user_restore_without_a_request() {
        let store = MemorySessionStore::with(CachedSession {
            token: Some("tok-1".into()),
            user: Some(user()),
        });
        let mut session = Session::new(store, offline_client());
        assert!(session.restore().await.expect("restores"));
        assert_eq!(session.profile().map(|p| p.id.as_str()), Some("u-1"));
        assert_eq!(session.client().token().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn unreadable_cache_clears_everything() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("session.json");
        fs::write(&path, "garbage").expect("write");
        let mut session = Session::new(FileSessionStore::new(&path), offline_client());
        assert!(!session.restore().await.expect("restores"));
        assert!(!path.exists());
        assert!(session.client().token().is_none());
    }

    #[tokio::test]
    async fn token_without_user_is_dropped_when_me_fails() {
        let store = MemorySessionStore::with(CachedSession {
            token: Some("tok-1".into()),
            user: None,
        });
        let mut session = Session::new(store, offline_client());
        assert!(!session.restore().await.expect("restores"));
        assert!(session.client().token().is_none());
        assert_eq!(session.store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn no_token_clears_cached_user() {
        let store = MemorySessionStore::with(CachedSession {
            token: None,
            user: Some(user()),
        });
        let mut session = Session::new(store, offline_client());
        assert!(!session.restore().await.expect("restores"));
        assert_eq!(session.store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn blank_login_is_rejected_locally() {
        let mut session = Session::new(MemorySessionStore::default(), offline_client());
        let err = session.login("  ", "secret").await.expect_err("blank email");
        assert_eq!(err.to_string(), "Please enter email and password");
    }

    #[test]
    fn unauthorised_errors_invalidate() {
        let store = MemorySessionStore::with(CachedSession {
            token: Some("tok-1".into()),
            user: Some(user()),
        });
        let client = offline_client();
        client.set_token(Some("tok-1".into()));
        let mut session = Session::new(store, client);
        session.profile = Profile::from_record(&user());

        let forbidden = ApiError::Status {
            status: 403,
            message: "Forbidden".into(),
            details: Vec::new(),
        };
        assert!(!session.invalidate_on(&forbidden));
        assert!(session.is_authenticated());

        let unauthorised = ApiError::Status {
            status: 401,
            message: "Token expired".into(),
            details: Vec::new(),
        };
        assert!(session.invalidate_on(&unauthorised));
        assert!(!session.is_authenticated());
        assert!(session.client().token().is_none());
    }

    #[test]
    fn registration_requires_fields_and_matching_passwords() {
        let mut form = RegistrationForm {
            request: RegisterRequest {
                first_name: " Ama ".into(),
                last_name: "Mensah".into(),
                email: "ama@example.com ".into(),
                password: "pw".into(),
                phone_number: "+233 24 412 3456".into(),
                country: "Ghana".into(),
                license_number: "MDC/123".into(),
                ..RegisterRequest::default()
            },
            confirm_password: "other".into(),
        };
        let err = form.clone().into_request().expect_err("mismatch");
        assert_eq!(err.to_string(), "Passwords do not match");

        form.confirm_password = "pw".into();
        let request = form.clone().into_request().expect("valid");
        assert_eq!(request.first_name, "Ama");
        assert_eq!(request.email, "ama@example.com");
        assert_eq!(request.phone_number, "+233244123456");

        form.request.license_number = " ".into();
        let err = form.into_request().expect_err("missing licence");
        assert_eq!(err.to_string(), "Please fill in all required fields");
    }
}

//! Constants used throughout the MedConnect client.

/// Backend base URL used when nothing is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "MEDCONNECT_API_URL";

/// Environment variable holding the session cache location.
pub const SESSION_PATH_ENV: &str = "MEDCONNECT_SESSION_PATH";

/// Session cache location used when nothing is configured.
pub const DEFAULT_SESSION_PATH: &str = ".medconnect/session.json";

/// Cases requested per feed page.
pub const FEED_PAGE_SIZE: u32 = 20;

/// Rows fetched for the leaderboard.
pub const LEADERBOARD_LIMIT: u32 = 10;

/// Maximum number of tags on a case.
pub const MAX_CASE_TAGS: usize = 8;

/// Maximum number of credentials on a profile.
pub const MAX_CREDENTIALS: usize = 10;

/// Product name, used for window/terminal titles.
pub const APP_NAME: &str = "MedConnect";

/// Display name used when an author has neither first nor last name.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Score changes smaller than this are treated as no change.
pub const SCORE_EPSILON: f64 = 0.0001;

use medconnect_api_shared::FieldIssue;

/// Message shown for transport failures, distinct from anything the backend can send.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error: Unable to connect to the server. Please check your internet connection and ensure the server is running.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// DNS, connection or other transport-level failure. No response was received.
    #[error("Network error: Unable to connect to the server. Please check your internet connection and ensure the server is running.")]
    Network(#[source] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        details: Vec<FieldIssue>,
    },

    /// The backend answered 2xx but the payload was not in the expected shape.
    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rejected locally before any request was issued.
    #[error("{0}")]
    InvalidInput(String),

    #[error("you must be logged in to do that")]
    AuthRequired,

    #[error("This case is closed. Voting and new answers are disabled.")]
    CaseClosed,

    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session cache error: {0}")]
    Session(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorised(&self) -> bool {
        self.status() == Some(401)
    }

    /// A 4xx carrying field-level issues.
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Status { status, details, .. } if (400..500).contains(status) && !details.is_empty())
    }

    pub fn details(&self) -> &[FieldIssue] {
        match self {
            ApiError::Status { details, .. } => details,
            _ => &[],
        }
    }

    /// Field-level messages keyed by parameter name, for inline form errors.
    pub fn field_errors(&self) -> Vec<(String, String)> {
        self.details()
            .iter()
            .filter_map(|d| Some((d.param.clone()?, d.msg.clone()?)))
            .collect()
    }

    /// Text for a blocking alert: the message, then each detail on its own line.
    pub fn alert_text(&self) -> String {
        let lines: Vec<&str> = self.details().iter().filter_map(FieldIssue::text).collect();
        if lines.is_empty() {
            self.to_string()
        } else {
            format!("{}\n\n{}", self, lines.join("\n"))
        }
    }
}

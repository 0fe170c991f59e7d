// Client-side error taxonomy for the authenticated call pipeline.
use thiserror::Error;

/// Errors surfaced by [`crate::client::ApiClient`].
///
/// The auth-class variants (`AuthExpired`, `AuthForbidden`) are returned
/// *after* the pipeline has already run its recovery steps; callers may
/// abort their own flow on them but never need per-call handling.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-level failure: DNS, connection refused, timeout. No recovery.
    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// 401 response. The credential has been cleared and the user redirected
    /// to the login route by the time this is returned.
    #[error("session expired")]
    AuthExpired,

    /// 403 response. The credential is still valid, just under-privileged;
    /// the user has been notified.
    #[error("insufficient privileges")]
    AuthForbidden,

    /// Any other non-2xx status, with the raw response body for page-level
    /// error handling.
    #[error("request failed with status {status}")]
    Http { status: u16, body: String },

    /// 2xx response whose body did not parse as the expected format.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request body could not be serialized; nothing was dispatched.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ClientError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        ClientError::Http {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code, when the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::AuthExpired => Some(401),
            ClientError::AuthForbidden => Some(403),
            _ => None,
        }
    }

    /// The backend's `error` field from an error envelope body, if present.
    pub fn api_error_message(&self) -> Option<String> {
        match self {
            ClientError::Http { body, .. } => {
                let value: serde_json::Value = serde_json::from_str(body).ok()?;
                value.get("error")?.as_str().map(|s| s.to_string())
            }
            _ => None,
        }
    }

    /// Classify the backend error message when it is one of the well-known
    /// ones, so callers can map it to user-facing copy.
    pub fn known_error(&self) -> Option<KnownApiError> {
        KnownApiError::from_message(&self.api_error_message()?)
    }
}

/// Well-known backend error messages, as emitted by the server's error
/// responder. Anything else is surfaced verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownApiError {
    InvalidEmail,
    WeakPassword,
    InvalidUsername,
    InvalidInput,
    NotFound,
    Unauthorized,
    Forbidden,
    AlreadyExists,
}

impl KnownApiError {
    pub fn from_message(message: &str) -> Option<Self> {
        match message.trim().to_lowercase().as_str() {
            "invalid email format" => Some(Self::InvalidEmail),
            "password must be at least 8 characters and include 3 of: lowercase, uppercase, digits, special characters" => {
                Some(Self::WeakPassword)
            }
            "username must be 3-32 characters, alphanumeric with underscores/hyphens only" => {
                Some(Self::InvalidUsername)
            }
            "invalid input" => Some(Self::InvalidInput),
            "resource not found" => Some(Self::NotFound),
            "unauthorized" => Some(Self::Unauthorized),
            "forbidden" => Some(Self::Forbidden),
            "resource already exists" => Some(Self::AlreadyExists),
            _ => None,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "The email address is not valid",
            Self::WeakPassword => {
                "Password must be at least 8 characters and mix lowercase, uppercase, digits and special characters"
            }
            Self::InvalidUsername => {
                "Username must be 3-32 characters, alphanumeric with underscores or hyphens"
            }
            Self::InvalidInput => "The submitted data is not valid",
            Self::NotFound => "The requested resource was not found",
            Self::Unauthorized => "You are not logged in",
            Self::Forbidden => "You do not have access to this resource",
            Self::AlreadyExists => "The resource already exists",
        }
    }
}

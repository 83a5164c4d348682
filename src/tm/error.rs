//! Error types for the Teams Manager backend and its auth

use thiserror::Error;

/// Errors raised while obtaining or renewing an access token
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read token file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Token file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No access token found in {0}; authenticate first")]
    MissingToken(String),

    #[error("Access token is malformed: {0}")]
    MalformedToken(String),

    #[error("Reauthentication was declined")]
    Declined,

    #[error("Prompt failed: {0}")]
    Prompt(String),
}

/// Errors raised by backend requests
#[derive(Debug, Error)]
pub enum TmError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {path} failed with code {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Request to {path} was unauthorized and reauthentication was declined")]
    ReauthDeclined { path: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TmError {
    /// Whether the run can't continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TmError::ReauthDeclined { .. } | TmError::Auth(AuthError::Declined)
        )
    }
}

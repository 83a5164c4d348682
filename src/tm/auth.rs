//! Access token handling
//!
//! Token acquisition itself happens outside this tool. The backend client
//! only needs something implementing [`TokenProvider`]; [`TokenFileAuth`]
//! reads the token from the auth file written by the login flow.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::error::AuthError;

/// Warn when the token expires within this many seconds
const EXPIRY_WARNING_SECS: i64 = 5 * 60;

/// Claims of the access token payload this tool reads
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Tenant id
    #[serde(default)]
    pub tid: Option<String>,
    /// Expiry as unix timestamp
    #[serde(default)]
    pub exp: Option<i64>,
}

/// A bearer token together with its decoded claims
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub raw: String,
    pub claims: TokenClaims,
}

impl AccessToken {
    pub fn parse(raw: impl Into<String>) -> Result<Self, AuthError> {
        let raw = raw.into();
        let claims = decode_claims(&raw)?;
        Ok(Self { raw, claims })
    }

    /// Seconds until expiry, if the token carries an expiry
    pub fn expires_in(&self) -> Option<i64> {
        self.claims.exp.map(|exp| exp - Utc::now().timestamp())
    }
}

/// Decode the payload segment of a JWT without verifying its signature
pub fn decode_claims(token: &str) -> Result<TokenClaims, AuthError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::MalformedToken("missing payload segment".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(e.to_string()))
}

/// Interactive decisions the auth flow needs from the user
pub trait AuthPrompt: Send + Sync {
    /// Ask whether to reauthenticate after an authorization failure
    fn confirm_reauth(&self) -> bool;

    /// Ask for a fresh access token; `None` when the user gives up
    fn ask_token(&self) -> Result<Option<String>, AuthError>;
}

/// Source of access tokens for backend requests
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, AuthError>;

    /// Obtain a new token after the backend rejected the current one
    async fn reauthenticate(&self) -> Result<(), AuthError>;
}

/// Token provider backed by the auth JSON file
pub struct TokenFileAuth {
    path: PathBuf,
    token: Mutex<AccessToken>,
    prompt: Arc<dyn AuthPrompt>,
}

impl TokenFileAuth {
    pub fn load(path: &Path, prompt: Arc<dyn AuthPrompt>) -> Result<Self, AuthError> {
        let document = read_document(path)?;
        let raw = document
            .pointer("/authToken/access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AuthError::MissingToken(path.display().to_string()))?;
        let token = AccessToken::parse(raw)?;
        info!(path = %path.display(), "Loaded access token");

        Ok(Self {
            path: path.to_path_buf(),
            token: Mutex::new(token),
            prompt,
        })
    }

    fn persist(&self, raw: &str) -> Result<(), AuthError> {
        let mut document = read_document(&self.path).unwrap_or_else(|_| json!({}));
        if !document.is_object() {
            document = json!({});
        }
        document["authToken"] = json!({
            "token_type": "Bearer",
            "access_token": raw,
        });
        let content = serde_json::to_string_pretty(&document)?;
        std::fs::write(&self.path, content).map_err(|source| AuthError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

#[async_trait]
impl TokenProvider for TokenFileAuth {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        let token = self
            .token
            .lock()
            .map_err(|_| AuthError::MalformedToken("token lock poisoned".to_string()))?
            .clone();

        match token.expires_in() {
            Some(secs) if secs <= 0 => warn!("Access token is expired"),
            Some(secs) if secs < EXPIRY_WARNING_SECS => {
                warn!("Access token expires in the next 5 min; migration might fail")
            }
            _ => {}
        }
        Ok(token)
    }

    async fn reauthenticate(&self) -> Result<(), AuthError> {
        let raw = self.prompt.ask_token()?.ok_or(AuthError::Declined)?;
        let token = AccessToken::parse(raw.trim())?;
        self.persist(&token.raw)?;
        *self
            .token
            .lock()
            .map_err(|_| AuthError::MalformedToken("token lock poisoned".to_string()))? = token;
        info!("Access token replaced");
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<Value, AuthError> {
    let content = std::fs::read_to_string(path).map_err(|source| AuthError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_decode_claims_reads_tenant_and_expiry() {
        let claims = decode_claims(&token_with(r#"{"tid":"tenant-1","exp":42}"#)).unwrap();
        assert_eq!(claims.tid.as_deref(), Some("tenant-1"));
        assert_eq!(claims.exp, Some(42));
    }

    #[test]
    fn test_decode_claims_rejects_opaque_token() {
        assert!(matches!(
            decode_claims("not-a-jwt"),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_expired_token_reports_negative_lifetime() {
        let token = AccessToken::parse(token_with(r#"{"exp":1}"#)).unwrap();
        assert!(token.expires_in().unwrap() < 0);
    }
}

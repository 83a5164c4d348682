//! HTTP client for the Teams Manager API

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::auth::{AuthPrompt, TokenProvider};
use super::error::TmError;
use super::types::{
    CreateField, Field, FieldValuePayload, NextLink, SlimTeam, Template, User,
};
use super::TmBackend;

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Templates Teams Manager ships itself; never migration targets
const DEFAULT_TEMPLATE_TEAM_IDS: [&str; 2] = ["groupTemplate.default", "yammerTemplate.default"];

/// Hosts behind the Azure front door don't need the source header
const FRONT_DOOR_SUFFIX: &str = "azurefd.net";

/// A fully prepared API request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(HeaderName, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw answer of the API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Sends prepared requests over the wire
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TmError>;
}

/// [`Transport`] backed by reqwest
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TmError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TmError> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .query(&request.query);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}

/// Client for the Teams Manager REST API
pub struct TmClient {
    transport: Arc<dyn Transport>,
    host: String,
    auth: Arc<dyn TokenProvider>,
    prompt: Arc<dyn AuthPrompt>,
    /// Serializes reauthentication across concurrent requests
    reauth_gate: Mutex<()>,
    /// Set once the user refused to reauthenticate
    declined: AtomicBool,
}

impl TmClient {
    pub fn new(
        host: impl Into<String>,
        auth: Arc<dyn TokenProvider>,
        prompt: Arc<dyn AuthPrompt>,
    ) -> Result<Self, TmError> {
        let transport = HttpTransport::new()?;
        Ok(Self::with_transport(host, auth, prompt, Arc::new(transport)))
    }

    pub fn with_transport(
        host: impl Into<String>,
        auth: Arc<dyn TokenProvider>,
        prompt: Arc<dyn AuthPrompt>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            transport,
            host: host.into(),
            auth,
            prompt,
            reauth_gate: Mutex::new(()),
            declined: AtomicBool::new(false),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("https://{}/api{}", self.host, path)
    }

    fn declined_error(&self, path: &str) -> TmError {
        TmError::ReauthDeclined {
            path: path.to_string(),
        }
    }

    /// Issue a request, reauthenticating and retrying on 401
    ///
    /// Once reauthentication was declined every later 401 fails right away.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Value, TmError> {
        loop {
            let token = self.auth.access_token().await?;

            let mut headers = vec![
                (CONTENT_TYPE, "application/json".to_string()),
                (AUTHORIZATION, format!("Bearer {}", token.raw)),
                (ORIGIN, self.host.clone()),
            ];
            if !self.host.ends_with(FRONT_DOOR_SUFFIX) {
                headers.push((HeaderName::from_static("tmsource"), "true".to_string()));
            }

            let payload = (method != Method::GET).then(|| {
                let mut merged = Map::new();
                merged.insert("AccessToken".to_string(), json!(token.raw));
                if let Some(tid) = &token.claims.tid {
                    merged.insert("TenantId".to_string(), json!(tid));
                }
                if let Some(Value::Object(fields)) = body.clone() {
                    merged.extend(fields);
                }
                Value::Object(merged)
            });

            let request = ApiRequest {
                method: method.clone(),
                url: self.url(path),
                headers,
                query: query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: payload,
            };

            debug!(%method, path, "Sending request");
            let response = self.transport.send(request).await?;

            if response.status == StatusCode::UNAUTHORIZED.as_u16() {
                warn!(path, "Request failed with code 401: {}", response.body);
                if self.declined.load(Ordering::SeqCst) {
                    return Err(self.declined_error(path));
                }

                let _guard = self.reauth_gate.lock().await;
                if self.declined.load(Ordering::SeqCst) {
                    return Err(self.declined_error(path));
                }
                // Another request may have renewed the token while we waited
                let current = self.auth.access_token().await?;
                if current.raw != token.raw {
                    continue;
                }
                if !self.prompt.confirm_reauth() {
                    self.declined.store(true, Ordering::SeqCst);
                    return Err(self.declined_error(path));
                }
                warn!("Trying to fix the problem by reauthenticating...");
                if let Err(e) = self.auth.reauthenticate().await {
                    let e = TmError::from(e);
                    if e.is_fatal() {
                        self.declined.store(true, Ordering::SeqCst);
                    }
                    return Err(e);
                }
                continue;
            }

            if !(200..300).contains(&response.status) {
                return Err(TmError::Status {
                    path: path.to_string(),
                    status: response.status,
                    body: response.body,
                });
            }

            if response.body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return match serde_json::from_str(&response.body) {
                Ok(value) => Ok(value),
                Err(e) => {
                    debug!(path, error = %e, "Response body is not JSON");
                    Ok(Value::Null)
                }
            };
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, TmError> {
        let value = self.request(Method::GET, path, query, None).await?;
        serde_json::from_value(value).map_err(|source| TmError::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// Collect every page of a paged endpoint
    async fn get_paged<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, TmError> {
        let mut items = Vec::new();
        let mut next: Option<String> = None;
        loop {
            let query: Vec<(&str, &str)> = next
                .as_deref()
                .map(|link| vec![("nextLinkString", link)])
                .unwrap_or_default();
            let page: NextLink<T> = self.get(path, &query).await?;
            next = page.next().map(str::to_string);
            items.extend(page.item2);
            if next.is_none() {
                break;
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl TmBackend for TmClient {
    async fn fetch_templates(&self) -> Result<Vec<Template>, TmError> {
        let templates: Vec<Template> = self.get("/GetTemplates", &[]).await?;
        Ok(templates
            .into_iter()
            .filter(|t| !DEFAULT_TEMPLATE_TEAM_IDS.contains(&t.team_id.as_str()))
            .collect())
    }

    async fn fetch_managed_teams(&self) -> Result<Vec<SlimTeam>, TmError> {
        self.get_paged("/GetAllManagedTeams").await
    }

    async fn fetch_all_field_definitions(&self) -> Result<Vec<Field>, TmError> {
        self.get("/GetFields", &[]).await
    }

    async fn create_fields(&self, template_id: &str, fields: &[CreateField]) -> Result<(), TmError> {
        let created: Vec<Value> = fields
            .iter()
            .map(|field| {
                json!({
                    "title": field.title,
                    "type": field.field_type,
                    "id": -1,
                    "required": false,
                    "order": 0,
                    "fieldOptions": {
                        "choices": [],
                        "isRunning": false,
                        "isPermissionField": false,
                        "permissionGroupName": ""
                    },
                    "defaultValue": "",
                    "description": "",
                    "spInternalName": "",
                    "EditableBy": 0
                })
            })
            .collect();

        let body = json!({
            "TemplateId": template_id,
            "RemovedFields": [],
            "UpdatedFields": [],
            "CreatedFields": created,
            "AddedFields": [],
            "DeletedFields": []
        });
        self.request(Method::PATCH, "/AddFieldsToTemplate", &[], Some(body))
            .await?;
        Ok(())
    }

    async fn convert_team(
        &self,
        template_id: &str,
        team_id: &str,
        team_title: &str,
        field_values: &[FieldValuePayload],
    ) -> Result<(), TmError> {
        let body = json!({
            "Template": template_id,
            "TeamId": team_id,
            "IsTeam": true,
            "FieldValues": field_values,
            "TeamTitle": team_title,
            "CurrentUser": "upn",
            "RequesterComment": ""
        });
        self.request(Method::PATCH, "/ConvertToManagedTeam", &[], Some(body))
            .await?;
        Ok(())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>, TmError> {
        self.get("/GetUserLimited", &[("searchString", query)]).await
    }
}

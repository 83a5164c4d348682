//! Tests for the Teams Manager client: reauthentication, paging and request shape

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use indicatif::ProgressBar;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_json::{json, Value};

use valo2tm::pipeline::{migrate_teams, TeamOutcome};
use valo2tm::tm::auth::{AccessToken, AuthPrompt, TokenClaims, TokenProvider};
use valo2tm::tm::{
    ApiRequest, ApiResponse, AuthError, FieldType, FieldValuePayload, TmBackend, TmClient,
    TmError, Transport,
};

#[path = "common/mod.rs"]
mod common;

use common::{field, team, template};

const HOST: &str = "tm.contoso.com";

fn token(raw: &str) -> AccessToken {
    AccessToken {
        raw: raw.to_string(),
        claims: TokenClaims {
            tid: Some("tenant-1".to_string()),
            exp: None,
        },
    }
}

/// Hands out `token-1` until reauthenticated, then `token-2`
struct SwappingAuth {
    current: Mutex<AccessToken>,
    reauths: AtomicUsize,
}

impl SwappingAuth {
    fn new() -> Self {
        Self {
            current: Mutex::new(token("token-1")),
            reauths: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TokenProvider for SwappingAuth {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn reauthenticate(&self) -> Result<(), AuthError> {
        self.reauths.fetch_add(1, Ordering::SeqCst);
        *self.current.lock().unwrap() = token("token-2");
        Ok(())
    }
}

/// Answers every reauthentication question the same way and counts them
struct CountingPrompt {
    answer: bool,
    asked: AtomicUsize,
}

impl CountingPrompt {
    fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl AuthPrompt for CountingPrompt {
    fn confirm_reauth(&self) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }

    fn ask_token(&self) -> Result<Option<String>, AuthError> {
        Ok(None)
    }
}

type Responder = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

/// Transport recording every request and answering through a closure
struct ScriptedTransport {
    respond: Responder,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    fn new(respond: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TmError> {
        self.requests.lock().unwrap().push(request.clone());
        // Let other requests in flight reach the transport too
        tokio::task::yield_now().await;
        Ok((self.respond)(&request))
    }
}

fn ok(body: Value) -> ApiResponse {
    ApiResponse {
        status: 200,
        body: body.to_string(),
    }
}

fn unauthorized() -> ApiResponse {
    ApiResponse {
        status: 401,
        body: "Unauthorized".to_string(),
    }
}

/// 401 for the first token, `body` for the renewed one
fn rejects_first_token(body: Value) -> impl Fn(&ApiRequest) -> ApiResponse + Send + Sync {
    move |request: &ApiRequest| {
        if request.header(&AUTHORIZATION) == Some("Bearer token-1") {
            unauthorized()
        } else {
            ok(body.clone())
        }
    }
}

fn build_client(
    host: &str,
    transport: &Arc<ScriptedTransport>,
    auth: &Arc<SwappingAuth>,
    prompt: &Arc<CountingPrompt>,
) -> TmClient {
    TmClient::with_transport(
        host,
        Arc::clone(auth) as Arc<dyn TokenProvider>,
        Arc::clone(prompt) as Arc<dyn AuthPrompt>,
        Arc::clone(transport) as Arc<dyn Transport>,
    )
}

fn without_token(body: &Option<Value>) -> Value {
    let mut body = body.clone().unwrap_or(Value::Null);
    if let Some(map) = body.as_object_mut() {
        map.remove("AccessToken");
    }
    body
}

// ============================================================================
// Reauthentication
// ============================================================================

#[tokio::test]
async fn test_unauthorized_request_is_retried_after_reauth() {
    let transport = ScriptedTransport::new(rejects_first_token(Value::Null));
    let auth = Arc::new(SwappingAuth::new());
    let prompt = Arc::new(CountingPrompt::answering(true));
    let client = build_client(HOST, &transport, &auth, &prompt);
    let values = vec![FieldValuePayload {
        field_id: 1,
        value: "Sales".to_string(),
    }];

    client
        .convert_team("tpl-1", "g1", "Marketing", &values)
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2, "The rejected request should be sent once more");
    assert_eq!(requests[0].method, requests[1].method);
    assert_eq!(requests[0].url, requests[1].url);
    assert_eq!(requests[0].query, requests[1].query);
    assert_eq!(
        without_token(&requests[0].body),
        without_token(&requests[1].body),
        "Only the token may change between attempts"
    );
    assert_eq!(requests[1].header(&AUTHORIZATION), Some("Bearer token-2"));
    assert_eq!(requests[1].body.as_ref().unwrap()["AccessToken"], "token-2");
    assert_eq!(prompt.asked(), 1);
    assert_eq!(auth.reauths.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_declined_reauth_is_fatal_and_remembered() {
    let transport = ScriptedTransport::new(|_: &ApiRequest| unauthorized());
    let auth = Arc::new(SwappingAuth::new());
    let prompt = Arc::new(CountingPrompt::answering(false));
    let client = build_client(HOST, &transport, &auth, &prompt);

    let err = client.fetch_templates().await.unwrap_err();
    assert!(
        matches!(&err, TmError::ReauthDeclined { path } if path == "/GetTemplates"),
        "Unexpected error: {err}"
    );
    assert!(err.is_fatal());

    let err = client.search_users("jane@contoso.com").await.unwrap_err();
    assert!(matches!(err, TmError::ReauthDeclined { .. }));
    assert_eq!(prompt.asked(), 1, "A decline must not be asked again");
    assert_eq!(auth.reauths.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_prompt_once() {
    let transport = ScriptedTransport::new(rejects_first_token(json!([])));
    let auth = Arc::new(SwappingAuth::new());
    let prompt = Arc::new(CountingPrompt::answering(true));
    let client = build_client(HOST, &transport, &auth, &prompt);

    let (a, b, c) = tokio::join!(
        client.search_users("a@contoso.com"),
        client.search_users("b@contoso.com"),
        client.search_users("c@contoso.com"),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(prompt.asked(), 1, "Only the first 401 should prompt");
    assert_eq!(auth.reauths.load(Ordering::SeqCst), 1);
    assert_eq!(transport.requests().len(), 6);
}

#[tokio::test]
async fn test_other_failures_do_not_prompt() {
    let transport = ScriptedTransport::new(|_: &ApiRequest| ApiResponse {
        status: 500,
        body: "boom".to_string(),
    });
    let auth = Arc::new(SwappingAuth::new());
    let prompt = Arc::new(CountingPrompt::answering(true));
    let client = build_client(HOST, &transport, &auth, &prompt);

    let err = client.fetch_all_field_definitions().await.unwrap_err();

    assert!(matches!(err, TmError::Status { status: 500, .. }));
    assert!(!err.is_fatal());
    assert_eq!(prompt.asked(), 0);
}

#[tokio::test]
async fn test_declined_reauth_stops_migration() {
    let transport = ScriptedTransport::new(|_: &ApiRequest| unauthorized());
    let auth = Arc::new(SwappingAuth::new());
    let prompt = Arc::new(CountingPrompt::answering(false));
    let backend: Arc<dyn TmBackend> = Arc::new(build_client(HOST, &transport, &auth, &prompt));
    let template = template(vec![field(1, "Dept", FieldType::Text)]);
    let teams = vec![
        team("g1", "One", &[("Dept", "Text", &["A"])]),
        team("g2", "Two", &[("Dept", "Text", &["B"])]),
        team("g3", "Three", &[("Dept", "Text", &["C"])]),
    ];

    let report = migrate_teams(
        backend,
        &template,
        &teams,
        &[],
        template.fields.clone(),
        ProgressBar::hidden(),
    )
    .await;

    assert!(report.is_aborted(), "A declined reauthentication must stop the run");
    assert_eq!(prompt.asked(), 1, "The user is asked once, not per team");
    assert!(report.succeeded().next().is_none());
    assert!(report
        .failed()
        .all(|r| matches!(&r.outcome, TeamOutcome::Failed(reason) if reason.contains("declined"))));
}

// ============================================================================
// Paging and request shape
// ============================================================================

#[tokio::test]
async fn test_managed_teams_follow_next_links() {
    for terminator in [json!("1"), json!(""), Value::Null] {
        let last = terminator.clone();
        let transport = ScriptedTransport::new(move |request: &ApiRequest| {
            match request.query_value("nextLinkString") {
                None => ok(json!({
                    "item1": "page-2",
                    "item2": [{"TeamId": "g1", "DisplayName": "One"}]
                })),
                Some("page-2") => ok(json!({
                    "item1": last.clone(),
                    "item2": [{"TeamId": "g2", "DisplayName": "Two"}]
                })),
                Some(other) => panic!("Unexpected next link {other}"),
            }
        });
        let auth = Arc::new(SwappingAuth::new());
        let prompt = Arc::new(CountingPrompt::answering(true));
        let client = build_client(HOST, &transport, &auth, &prompt);

        let managed = client.fetch_managed_teams().await.unwrap();

        let ids: Vec<&str> = managed.iter().map(|t| t.team_id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2"], "Paging should stop at {terminator}");
        assert_eq!(transport.requests().len(), 2);
    }
}

#[tokio::test]
async fn test_default_templates_are_dropped() {
    let transport = ScriptedTransport::new(|_: &ApiRequest| {
        ok(json!([
            {"id": "t1", "displayName": "Group", "teamId": "groupTemplate.default"},
            {"id": "t2", "displayName": "Yammer", "teamId": "yammerTemplate.default"},
            {"id": "t3", "displayName": "Project", "teamId": "g-project"}
        ]))
    });
    let auth = Arc::new(SwappingAuth::new());
    let prompt = Arc::new(CountingPrompt::answering(true));
    let client = build_client(HOST, &transport, &auth, &prompt);

    let templates = client.fetch_templates().await.unwrap();

    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].display_name, "Project");
}

#[tokio::test]
async fn test_write_requests_carry_token_and_tenant() {
    let transport = ScriptedTransport::new(|_: &ApiRequest| ok(Value::Null));
    let auth = Arc::new(SwappingAuth::new());
    let prompt = Arc::new(CountingPrompt::answering(true));
    let client = build_client(HOST, &transport, &auth, &prompt);

    client.convert_team("tpl-1", "g1", "Marketing", &[]).await.unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::PATCH);
    assert_eq!(request.url, "https://tm.contoso.com/api/ConvertToManagedTeam");
    assert_eq!(
        request.header(&reqwest::header::HeaderName::from_static("tmsource")),
        Some("true")
    );
    let body = request.body.as_ref().unwrap();
    assert_eq!(body["AccessToken"], "token-1");
    assert_eq!(body["TenantId"], "tenant-1");
    assert_eq!(body["TeamId"], "g1");
    assert_eq!(body["Template"], "tpl-1");
}

#[tokio::test]
async fn test_front_door_host_skips_source_header() {
    let transport = ScriptedTransport::new(|_: &ApiRequest| ok(json!([])));
    let auth = Arc::new(SwappingAuth::new());
    let prompt = Arc::new(CountingPrompt::answering(true));
    let client = build_client("teamsmanagerprod.azurefd.net", &transport, &auth, &prompt);

    client.search_users("jane@contoso.com").await.unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::GET);
    assert!(request.body.is_none(), "GET requests have no body");
    assert_eq!(request.query_value("searchString"), Some("jane@contoso.com"));
    assert!(request
        .header(&reqwest::header::HeaderName::from_static("tmsource"))
        .is_none());
}

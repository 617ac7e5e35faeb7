//! `RemoteService` over HTTP against a Supabase-style deployment.
//!
//! Auth goes through the GoTrue endpoints under `/auth/v1`; tables are read
//! and written through PostgREST under `/rest/v1`. The signed-in session is
//! kept in memory and, when a session file is configured, persisted between
//! runs and refreshed shortly before it expires.

use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use taskflow_common::{
    AuthEvent, AuthUser, Comment, NewComment, NewProject, NewProjectMember, NewTask, Profile,
    Project, TaskPatch, TaskRow,
};

use super::{RemoteService, SignUpOutcome};
use crate::errors::RemoteError;

/// Embed used for the assignee column of the board query.
const TASK_SELECT: &str = "*,profiles:assignee_id(full_name,email)";
/// Embed used for the author column of the comment query.
const COMMENT_SELECT: &str = "*,profiles:user_id(full_name,email)";
const MEMBER_SELECT: &str = "profiles:user_id(id,email,full_name)";
/// Board order: position, then newest first so new tasks sit at the top.
const TASK_ORDER: &str = "position.asc,created_at.desc,id.asc";

/// Refresh the access token when it expires within this many seconds.
const REFRESH_MARGIN_SECS: i64 = 30;

/// Token pair persisted between runs so a signed-in user stays signed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which `access_token` expires.
    pub expires_at: i64,
    pub user: AuthUser,
}

impl StoredSession {
    fn is_expiring(&self) -> bool {
        self.expires_at - chrono::Utc::now().timestamp() <= REFRESH_MARGIN_SECS
    }
}

/// User object returned by the auth endpoints (subset of fields).
#[derive(Debug, Deserialize)]
pub(crate) struct AuthUserResponse {
    pub id: Uuid,
    pub email: Option<String>,
}

impl From<AuthUserResponse> for AuthUser {
    fn from(u: AuthUserResponse) -> Self {
        AuthUser {
            id: u.id,
            email: u.email,
        }
    }
}

/// Response from the password and refresh-token grants.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    expires_at: Option<i64>,
    user: AuthUserResponse,
}

impl From<TokenResponse> for StoredSession {
    fn from(t: TokenResponse) -> Self {
        let expires_at = t
            .expires_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp() + t.expires_in);
        StoredSession {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            expires_at,
            user: t.user.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MemberProfileRow {
    profiles: Option<Profile>,
}

/// Pull a human-readable message out of an auth or PostgREST error body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Turn a non-success response into `RemoteError::Status`.
pub(crate) async fn check_response(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

pub(crate) async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, RemoteError> {
    resp.json::<T>()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

pub(crate) fn endpoint(base_url: &Url, path: &str) -> Result<Url, RemoteError> {
    base_url
        .join(path)
        .map_err(|e| RemoteError::Unavailable(format!("invalid endpoint {}: {}", path, e)))
}

pub(crate) fn build_http(timeout: Duration) -> Result<reqwest::Client, RemoteError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("taskflow/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(RemoteError::Network)
}

/// HTTP client for a Supabase-style deployment (GoTrue auth + PostgREST tables).
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    session: RwLock<Option<StoredSession>>,
    session_path: Option<PathBuf>,
    auth_tx: broadcast::Sender<AuthEvent>,
}

impl RestClient {
    pub fn new(base_url: Url, anon_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let (auth_tx, _) = broadcast::channel(16);
        Ok(Self {
            http: build_http(timeout)?,
            base_url,
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
            session_path: None,
            auth_tx,
        })
    }

    /// Persist the session to `path` and restore it from there on lookup.
    pub fn with_session_file(mut self, path: PathBuf) -> Self {
        self.session_path = Some(path);
        self
    }

    fn url(&self, path: &str) -> Result<Url, RemoteError> {
        endpoint(&self.base_url, path)
    }

    fn stored(&self) -> Option<StoredSession> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    fn access_token(&self) -> String {
        self.stored()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.anon_key)
            .bearer_auth(self.access_token())
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, RemoteError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(RemoteError::Network)?;
        check_response(resp).await
    }

    fn install_session(&self, session: Option<StoredSession>) {
        if let Some(path) = &self.session_path {
            let result = match &session {
                Some(s) => write_session_file(path, s),
                None => match std::fs::remove_file(path) {
                    Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                    _ => Ok(()),
                },
            };
            if let Err(e) = result {
                warn!(path = %path.display(), error = %e, "Failed to persist session");
            }
        }
        if let Ok(mut guard) = self.session.write() {
            *guard = session;
        }
    }

    fn load_session_file(&self) -> Option<StoredSession> {
        let path = self.session_path.as_ref()?;
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<StoredSession, RemoteError> {
        let url = self.url("auth/v1/token")?;
        let req = self
            .http
            .post(url)
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body);
        let resp = req.send().await.map_err(RemoteError::Network)?;
        let token: TokenResponse = decode(check_response(resp).await?).await?;
        Ok(token.into())
    }

    async fn refresh(&self, session: &StoredSession) -> Result<Option<AuthUser>, RemoteError> {
        debug!("Refreshing access token");
        match self
            .token_grant(
                "refresh_token",
                serde_json::json!({ "refresh_token": session.refresh_token }),
            )
            .await
        {
            Ok(fresh) => {
                let user = fresh.user.clone();
                self.install_session(Some(fresh));
                let _ = self.auth_tx.send(AuthEvent::TokenRefreshed(user.clone()));
                Ok(Some(user))
            }
            // Only a refused token ends the session; throttling and timeouts do not.
            Err(RemoteError::Status {
                status: status @ (400 | 401 | 403),
                message,
            }) => {
                warn!(status, %message, "Stored session rejected, signing out locally");
                self.install_session(None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn insert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<Response, RemoteError> {
        let url = self.url(&format!("rest/v1/{}", table))?;
        self.send(
            self.http
                .post(url)
                .header("Prefer", "return=representation")
                .json(&[row]),
        )
        .await
    }
}

fn write_session_file(path: &std::path::Path, session: &StoredSession) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(session)?)?;
    Ok(())
}

#[async_trait]
impl RemoteService for RestClient {
    async fn current_session(&self) -> Result<Option<AuthUser>, RemoteError> {
        let session = match self.stored().or_else(|| self.load_session_file()) {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expiring() {
            return self.refresh(&session).await;
        }

        if let Ok(mut guard) = self.session.write() {
            *guard = Some(session.clone());
        }
        let url = self.url("auth/v1/user")?;
        match self.send(self.http.get(url)).await {
            Ok(resp) => {
                let user: AuthUserResponse = decode(resp).await?;
                Ok(Some(user.into()))
            }
            Err(RemoteError::Status {
                status: 401 | 403, ..
            }) => self.refresh(&session).await,
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError> {
        debug!(email, "Signing in");
        let session = self
            .token_grant(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;
        let user = session.user.clone();
        self.install_session(Some(session));
        let _ = self.auth_tx.send(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, RemoteError> {
        let url = self.url("auth/v1/signup")?;
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "data": { "full_name": full_name },
        });
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(RemoteError::Network)?;
        let value: serde_json::Value = decode(check_response(resp).await?).await?;

        // Without auto-confirm the endpoint answers with the bare user object.
        if value.get("access_token").is_none() {
            return Ok(SignUpOutcome::ConfirmationRequired);
        }
        let token: TokenResponse =
            serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string()))?;
        let session = StoredSession::from(token);
        let user = session.user.clone();
        self.install_session(Some(session));
        let _ = self.auth_tx.send(AuthEvent::SignedIn(user.clone()));
        Ok(SignUpOutcome::SignedIn(user))
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let result = match self.stored().or_else(|| self.load_session_file()) {
            Some(session) => {
                let url = self.url("auth/v1/logout")?;
                let req = self
                    .http
                    .post(url)
                    .header("apikey", &self.anon_key)
                    .bearer_auth(&session.access_token);
                match req.send().await.map_err(RemoteError::Network) {
                    Ok(resp) => match check_response(resp).await {
                        // An already-invalid token means the session is gone anyway.
                        Err(RemoteError::Status {
                            status: 401 | 403 | 404,
                            ..
                        }) => Ok(()),
                        other => other.map(|_| ()),
                    },
                    Err(e) => Err(e),
                }
            }
            None => Ok(()),
        };
        self.install_session(None);
        let _ = self.auth_tx.send(AuthEvent::SignedOut);
        result
    }

    fn auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth_tx.subscribe()
    }

    async fn list_projects(&self) -> Result<Vec<Project>, RemoteError> {
        let url = self.url("rest/v1/projects")?;
        let req = self
            .http
            .get(url)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        decode(self.send(req).await?).await
    }

    async fn fetch_project(&self, id: Uuid) -> Result<Option<Project>, RemoteError> {
        let url = self.url("rest/v1/projects")?;
        let req = self
            .http
            .get(url)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{}", id))]);
        let rows: Vec<Project> = decode(self.send(req).await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Project, RemoteError> {
        let rows: Vec<Project> = decode(self.insert("projects", project).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::Decode("insert returned no project row".to_string()))
    }

    async fn insert_member(&self, member: &NewProjectMember) -> Result<(), RemoteError> {
        self.insert("project_members", member).await?;
        Ok(())
    }

    async fn list_member_profiles(&self, project_id: Uuid) -> Result<Vec<Profile>, RemoteError> {
        let url = self.url("rest/v1/project_members")?;
        let req = self.http.get(url).query(&[
            ("select", MEMBER_SELECT.to_string()),
            ("project_id", format!("eq.{}", project_id)),
        ]);
        let rows: Vec<MemberProfileRow> = decode(self.send(req).await?).await?;
        Ok(rows.into_iter().filter_map(|r| r.profiles).collect())
    }

    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<TaskRow>, RemoteError> {
        let url = self.url("rest/v1/tasks")?;
        let req = self.http.get(url).query(&[
            ("select", TASK_SELECT.to_string()),
            ("project_id", format!("eq.{}", project_id)),
            ("order", TASK_ORDER.to_string()),
        ]);
        decode(self.send(req).await?).await
    }

    async fn insert_task(&self, task: &NewTask) -> Result<(), RemoteError> {
        self.insert("tasks", task).await?;
        Ok(())
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> Result<(), RemoteError> {
        let url = self.url("rest/v1/tasks")?;
        let req = self
            .http
            .patch(url)
            .query(&[("id", format!("eq.{}", id))])
            .json(patch);
        self.send(req).await?;
        Ok(())
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), RemoteError> {
        let url = self.url("rest/v1/tasks")?;
        let req = self.http.delete(url).query(&[("id", format!("eq.{}", id))]);
        self.send(req).await?;
        Ok(())
    }

    async fn list_comments(&self, task_id: Uuid) -> Result<Vec<Comment>, RemoteError> {
        let url = self.url("rest/v1/comments")?;
        let req = self.http.get(url).query(&[
            ("select", COMMENT_SELECT.to_string()),
            ("task_id", format!("eq.{}", task_id)),
            ("order", "created_at.asc".to_string()),
        ]);
        decode(self.send(req).await?).await
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<(), RemoteError> {
        self.insert("comments", comment).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .field("signed_in", &self.stored().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ANON: &str = "anon-key";

    fn client(server: &MockServer) -> RestClient {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        RestClient::new(base, ANON, Duration::from_secs(5)).unwrap()
    }

    fn token_body(user_id: Uuid, expires_in: i64) -> serde_json::Value {
        serde_json::json!({
            "access_token": "access-1",
            "token_type": "bearer",
            "expires_in": expires_in,
            "refresh_token": "refresh-1",
            "user": { "id": user_id, "email": "dev@example.com" }
        })
    }

    // ── error_message ────────────────────────────────────────────────

    #[test]
    fn test_error_message_prefers_msg_field() {
        assert_eq!(
            error_message(r#"{"code":400,"msg":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
    }

    #[test]
    fn test_error_message_postgrest_shape() {
        let body = r#"{"code":"42501","details":null,"hint":null,"message":"new row violates row-level security policy"}"#;
        assert_eq!(
            error_message(body),
            "new row violates row-level security policy"
        );
    }

    #[test]
    fn test_error_message_plain_text_and_empty() {
        assert_eq!(error_message("  gateway timeout "), "gateway timeout");
        assert_eq!(error_message(""), "no response body");
    }

    // ── HTTP behaviour ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_sign_in_stores_session_and_sends_tokens() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", ANON))
            .and(body_json(serde_json::json!({"email": "dev@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(user_id, 3600)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session_file = dir.path().join("session.json");
        let client = client(&server).with_session_file(session_file.clone());
        let mut events = client.auth_events();

        let user = client.sign_in("dev@example.com", "pw").await.unwrap();
        assert_eq!(user.id, user_id);
        assert!(session_file.exists());
        assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedIn(_)));

        let projects = client.list_projects().await.unwrap();
        assert!(projects.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_failure_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .sign_in("dev@example.com", "wrong")
            .await
            .unwrap_err();
        match err {
            RemoteError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid login credentials");
            }
            other => panic!("Expected Status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_current_session_without_file_is_none() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let client = client(&server).with_session_file(dir.path().join("session.json"));
        assert!(client.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_current_session_validates_stored_token() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer stored-access"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": user_id, "email": "dev@example.com"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session_file = dir.path().join("session.json");
        let stored = StoredSession {
            access_token: "stored-access".into(),
            refresh_token: "stored-refresh".into(),
            expires_at: chrono::Utc::now().timestamp() + 3600,
            user: AuthUser {
                id: user_id,
                email: Some("dev@example.com".into()),
            },
        };
        write_session_file(&session_file, &stored).unwrap();

        let client = client(&server).with_session_file(session_file);
        let user = client.current_session().await.unwrap().unwrap();
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn test_expired_session_with_rejected_refresh_signs_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"msg": "Invalid Refresh Token"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session_file = dir.path().join("session.json");
        let stored = StoredSession {
            access_token: "old".into(),
            refresh_token: "old-refresh".into(),
            expires_at: chrono::Utc::now().timestamp() - 10,
            user: AuthUser {
                id: Uuid::new_v4(),
                email: None,
            },
        };
        write_session_file(&session_file, &stored).unwrap();

        let client = client(&server).with_session_file(session_file.clone());
        assert!(client.current_session().await.unwrap().is_none());
        assert!(!session_file.exists());
    }

    #[tokio::test]
    async fn test_throttled_refresh_keeps_stored_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"msg": "Too many requests"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session_file = dir.path().join("session.json");
        let stored = StoredSession {
            access_token: "old".into(),
            refresh_token: "old-refresh".into(),
            expires_at: chrono::Utc::now().timestamp() - 10,
            user: AuthUser {
                id: Uuid::new_v4(),
                email: None,
            },
        };
        write_session_file(&session_file, &stored).unwrap();

        let client = client(&server).with_session_file(session_file.clone());
        let err = client.current_session().await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 429, .. }));
        assert!(session_file.exists());
    }

    #[tokio::test]
    async fn test_sign_up_without_autoconfirm_requires_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"id": Uuid::new_v4(), "email": "new@example.com"}),
            ))
            .mount(&server)
            .await;

        let outcome = client(&server)
            .sign_up("new@example.com", "pw", Some("New User"))
            .await
            .unwrap();
        assert_eq!(outcome, SignUpOutcome::ConfirmationRequired);
    }

    #[tokio::test]
    async fn test_list_tasks_sends_board_query() {
        let server = MockServer::start().await;
        let project_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("select", TASK_SELECT))
            .and(query_param("project_id", format!("eq.{}", project_id).as_str()))
            .and(query_param("order", TASK_ORDER))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = client(&server).list_tasks(project_id).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_rls_rejection_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/comments"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "code": "42501",
                "message": "new row violates row-level security policy for table \"comments\""
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .insert_comment(&NewComment {
                task_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                content: "hi".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("row-level security"));
    }

    #[tokio::test]
    async fn test_member_profiles_skip_missing_profiles() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/project_members"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"profiles": {"id": id, "email": "a@example.com", "full_name": "Ada"}},
                {"profiles": null}
            ])))
            .mount(&server)
            .await;

        let profiles = client(&server)
            .list_member_profiles(Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].display_name(), "Ada");
    }
}

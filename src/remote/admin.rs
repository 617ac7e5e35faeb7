//! Service-role operations used to provision accounts outside the normal
//! sign-up flow.

use std::time::Duration;

use reqwest::{RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::rest::{build_http, check_response, decode, endpoint};
use crate::errors::RemoteError;

#[derive(Debug, Clone, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdminUserList {
    #[serde(default)]
    users: Vec<AdminUser>,
}

#[derive(Debug, Serialize)]
struct ProfileUpsert<'a> {
    id: Uuid,
    email: &'a str,
    full_name: &'a str,
}

/// Result of [`AdminClient::seed_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(Uuid),
    AlreadyExists(Uuid),
}

impl SeedOutcome {
    pub fn user_id(&self) -> Uuid {
        match self {
            SeedOutcome::Created(id) | SeedOutcome::AlreadyExists(id) => *id,
        }
    }
}

/// Client authorized with the service-role key. Bypasses row-level security,
/// so it is only constructed for the `seed-user` command.
pub struct AdminClient {
    http: reqwest::Client,
    base_url: Url,
    service_key: String,
}

impl AdminClient {
    pub fn new(base_url: Url, service_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        Ok(Self {
            http: build_http(timeout)?,
            base_url,
            service_key: service_key.to_string(),
        })
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(RemoteError::Network)?;
        check_response(resp).await
    }

    pub async fn list_users(&self) -> Result<Vec<AdminUser>, RemoteError> {
        let url = endpoint(&self.base_url, "auth/v1/admin/users")?;
        let list: AdminUserList = decode(self.send(self.http.get(url)).await?).await?;
        Ok(list.users)
    }

    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AdminUser, RemoteError> {
        let url = endpoint(&self.base_url, "auth/v1/admin/users")?;
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "email_confirm": true,
            "user_metadata": { "full_name": full_name },
        });
        decode(self.send(self.http.post(url).json(&body)).await?).await
    }

    pub async fn upsert_profile(
        &self,
        id: Uuid,
        email: &str,
        full_name: &str,
    ) -> Result<(), RemoteError> {
        let url = endpoint(&self.base_url, "rest/v1/profiles")?;
        let row = ProfileUpsert {
            id,
            email,
            full_name,
        };
        let req = self
            .http
            .post(url)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[row]);
        self.send(req).await?;
        Ok(())
    }

    /// Ensure a confirmed account with a profile exists for `email`.
    /// Existing accounts are left untouched apart from the profile upsert.
    pub async fn seed_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SeedOutcome, RemoteError> {
        let existing = self
            .list_users()
            .await?
            .into_iter()
            .find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            });

        let outcome = match existing {
            Some(user) => {
                debug!(email, id = %user.id, "User already exists");
                SeedOutcome::AlreadyExists(user.id)
            }
            None => {
                let user = self.create_user(email, password, full_name).await?;
                info!(email, id = %user.id, "Created user");
                SeedOutcome::Created(user.id)
            }
        };

        self.upsert_profile(outcome.user_id(), email, full_name)
            .await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SERVICE: &str = "service-key";

    fn admin(server: &MockServer) -> AdminClient {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        AdminClient::new(base, SERVICE, Duration::from_secs(5)).unwrap()
    }

    async fn mount_profile_upsert(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .and(header("prefer", "resolution=merge-duplicates"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_seed_creates_missing_user_and_profile() {
        let server = MockServer::start().await;
        let new_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .and(header("apikey", SERVICE))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"users": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .and(body_partial_json(serde_json::json!({
                "email": "demo@example.com",
                "email_confirm": true,
                "user_metadata": {"full_name": "Demo User"}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": new_id, "email": "demo@example.com"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_profile_upsert(&server).await;

        let outcome = admin(&server)
            .seed_user("demo@example.com", "secret", "Demo User")
            .await
            .unwrap();
        assert_eq!(outcome, SeedOutcome::Created(new_id));
    }

    #[tokio::test]
    async fn test_seed_reuses_existing_user() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "users": [{"id": id, "email": "Demo@Example.com"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        mount_profile_upsert(&server).await;

        let outcome = admin(&server)
            .seed_user("demo@example.com", "secret", "Demo User")
            .await
            .unwrap();
        assert_eq!(outcome, SeedOutcome::AlreadyExists(id));
        assert_eq!(outcome.user_id(), id);
    }

    #[tokio::test]
    async fn test_list_users_propagates_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"msg": "Invalid API key"})),
            )
            .mount(&server)
            .await;

        let err = admin(&server).list_users().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("Invalid API key"));
    }
}

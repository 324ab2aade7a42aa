//! Admin authentication
//!
//! Login stores the returned token and the username in the session store;
//! logout clears both.

use crate::http::{ApiClient, ClientResult, Credentials, RequestOptions};
use crate::logging::Metadata;
use crate::session::Session;
use serde::{Deserialize, Serialize};

const LOGIN_PATH: &str = "/api/admin/auth/login";
const REFRESH_PATH: &str = "/api/admin/auth/refresh";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Auth endpoints plus local session bookkeeping
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Log in and persist the session on success
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        // A stale token must not ride along with fresh credentials
        let options = RequestOptions::post()
            .json(&request)?
            .credentials(Credentials::Omit);
        let response: LoginResponse = self.client.send(LOGIN_PATH, options).await?;

        self.client
            .session()
            .set(&Session::new(&response.access_token, username))?;
        self.client
            .logger()
            .info("Logged in", Some(Metadata::new().with("username", username)));

        Ok(response)
    }

    /// Exchange a refresh token; the stored session is updated with the new
    /// access token and the existing username
    pub async fn refresh(&self, refresh_token: &str) -> ClientResult<LoginResponse> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let response: LoginResponse = self.client.post_json(REFRESH_PATH, &request).await?;

        let username = self.current_user()?.unwrap_or_default();
        self.client
            .session()
            .set(&Session::new(&response.access_token, username))?;

        Ok(response)
    }

    /// Forget the stored session
    pub fn logout(&self) -> ClientResult<()> {
        self.client.session().clear()?;
        self.client.logger().info("Logged out", None);
        Ok(())
    }

    /// Username of the stored session
    pub fn current_user(&self) -> ClientResult<Option<String>> {
        Ok(self.client.session().get()?.map(|s| s.username))
    }

    pub fn is_authenticated(&self) -> ClientResult<bool> {
        Ok(self.client.session().token()?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Navigator, LOGIN_PATH as LOGIN_SCREEN};
    use crate::session::{MemorySessionStore, SessionStore};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingNavigator {
        visited: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.visited.lock().unwrap().push(path.to_string());
        }
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path(LOGIN_PATH)
                .json_body(json!({"username": "admin", "password": "secret"}));
            then.status(200).json_body(json!({
                "access_token": "jwt-abc",
                "token_type": "bearer",
                "expires_in": 3600
            }));
        });

        let store = Arc::new(MemorySessionStore::new());
        let client = ApiClient::builder()
            .base_url(server.base_url())
            .session_store(store.clone())
            .build()
            .unwrap();

        let response = client.auth().login("admin", "secret").await.unwrap();
        m.assert();

        assert_eq!(response.expires_in, 3600);
        assert_eq!(store.get().unwrap(), Some(Session::new("jwt-abc", "admin")));
        assert_eq!(client.auth().current_user().unwrap().as_deref(), Some("admin"));
        assert!(client.auth().is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn test_wrong_password_surfaces_401() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(LOGIN_PATH);
            then.status(401).json_body(json!({"detail": "Invalid credentials"}));
        });

        let store = Arc::new(MemorySessionStore::new());
        let client = ApiClient::builder()
            .base_url(server.base_url())
            .session_store(store.clone())
            .build()
            .unwrap();

        let err = client.auth().login("admin", "wrong").await.unwrap_err();
        let http = err.as_http().expect("protocol failure");
        assert_eq!(http.status(), 401);
        assert_eq!(http.message(), "Invalid credentials");
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_guarded_client_clears_token_and_navigates_on_401() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(LOGIN_PATH);
            then.status(401).json_body(json!({"detail": "Invalid credentials"}));
        });

        let store = Arc::new(MemorySessionStore::with_session(Session::new("old", "admin")));
        let navigator = Arc::new(RecordingNavigator::default());
        let client = ApiClient::builder()
            .base_url(server.base_url())
            .session_store(store.clone())
            .session_guard(navigator.clone())
            .build()
            .unwrap();

        let err = client.auth().login("admin", "wrong").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(*navigator.visited.lock().unwrap(), vec![LOGIN_SCREEN.to_string()]);
    }

    #[tokio::test]
    async fn test_refresh_keeps_username() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path(REFRESH_PATH)
                .header("authorization", "Bearer old")
                .json_body(json!({"refresh_token": "r-1"}));
            then.status(200).json_body(json!({
                "access_token": "new",
                "token_type": "bearer",
                "expires_in": 60
            }));
        });

        let store = Arc::new(MemorySessionStore::with_session(Session::new("old", "admin")));
        let client = ApiClient::builder()
            .base_url(server.base_url())
            .session_store(store.clone())
            .build()
            .unwrap();

        client.auth().refresh("r-1").await.unwrap();
        m.assert();
        assert_eq!(store.get().unwrap(), Some(Session::new("new", "admin")));
    }

    #[test]
    fn test_logout_clears_session() {
        let store = Arc::new(MemorySessionStore::with_session(Session::new("t", "admin")));
        let client = ApiClient::builder()
            .session_store(store.clone())
            .build()
            .unwrap();

        client.auth().logout().unwrap();
        assert_eq!(store.get().unwrap(), None);
        assert_eq!(client.auth().current_user().unwrap(), None);
    }
}

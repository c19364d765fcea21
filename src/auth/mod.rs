//! Session lifecycle: logging in, signing up, logging out, and the middleware that keeps the
//! session alive in between.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use middleware::{Attempt, BearerAuth, Outcome};
pub use refresh::{LoginResponse, RefreshResponse};

use crate::config::ApiConfig;
use crate::multipart::Form;
use crate::store::{FileStore, MemoryStore, TokenPair, TokenStore};
use crate::{Client, InMemoryResponseExt, InMemoryResult};

mod middleware;
mod refresh;

/// Account details for a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signup {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AuthFlow {
    config: ApiConfig,
    store: Arc<dyn TokenStore>,
}

impl AuthFlow {
    pub fn new(config: ApiConfig, store: Arc<dyn TokenStore>) -> Self {
        Self { config, store }
    }

    /// Tokens go to `config.token_file` when it is set, otherwise they are kept in memory.
    pub fn from_config(config: ApiConfig) -> crate::Result<Self> {
        let store: Arc<dyn TokenStore> = match config.token_file.as_ref() {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::new(config, store))
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn TokenStore> {
        self.store.clone()
    }

    pub fn middleware(&self) -> BearerAuth {
        BearerAuth::from_config(self.store.clone(), &self.config)
    }

    /// A client for the configured backend with `BearerAuth` installed. Further middlewares
    /// run after it, so they see the authorized request.
    pub fn client(&self) -> Client {
        self.public_client().with_middleware(self.middleware())
    }

    /// A client for the configured backend without `BearerAuth`. Use it for `login` and
    /// `signup`, where a 401 means the credentials were wrong rather than that the session
    /// expired.
    pub fn public_client(&self) -> Client {
        Client::new().base_url(&self.config.base_url)
    }

    /// Exchange credentials for a token pair and store it. The backend expects the
    /// password-grant form, so `username` is whatever the user signs in with (usually email).
    ///
    /// Sent through a `BearerAuth` client, a rejected login is refreshed like any other 401.
    pub async fn login(&self, client: &Client, username: &str, password: &str) -> InMemoryResult<TokenPair> {
        let form = Form::form_data()
            .text("username", username)
            .text("password", password);
        let res = client
            .post(&self.config.login_endpoint)
            .multipart(form)
            .send_awaiting_body()
            .await?;
        let data: LoginResponse = res.json()?;
        let tokens = TokenPair::from(data);
        tokens.clone().store_in(self.store.as_ref());
        info!("Logged in");
        Ok(tokens)
    }

    /// Register a new account. Tokens are untouched; the user still has to log in.
    pub async fn signup(&self, client: &Client, signup: &Signup) -> InMemoryResult<serde_json::Value> {
        let res = client
            .post(&self.config.signup_endpoint)
            .set_json(signup)
            .send_awaiting_body()
            .await?;
        res.json()
    }

    pub fn logout(&self) {
        self.store.clear_tokens();
        info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.access_token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use http::{header, Method, StatusCode};
    use serde_json::json;

    use crate::mock::MockBackend;
    use crate::{Error, InMemoryBody};

    use super::*;

    const LOGIN: &str = "/api/v1/auth/login";

    fn flow() -> AuthFlow {
        AuthFlow::new(ApiConfig::default(), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_login_stores_tokens() {
        let backend = MockBackend::new().route(
            Method::POST,
            LOGIN,
            StatusCode::OK,
            InMemoryBody::Json(json!({"access_token": "A1", "refresh_token": "R1", "token_type": "bearer"})),
        );
        let flow = flow();
        let client = flow.public_client().with_middleware(backend.clone());

        let tokens = flow.login(&client, "a@b.c", "pw").await.unwrap();
        assert_eq!(tokens.access_token, "A1");
        assert!(flow.is_authenticated());
        assert_eq!(flow.store().refresh_token().as_deref(), Some("R1"));

        let sent = &backend.requests()[0];
        let content_type = sent.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let InMemoryBody::Bytes(body) = sent.body() else {
            panic!("expected a multipart body");
        };
        let body = String::from_utf8_lossy(body);
        assert!(body.contains("name=\"username\"\r\n\r\na@b.c\r\n"));
        assert!(body.contains("name=\"password\"\r\n\r\npw\r\n"));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let backend = MockBackend::new()
            .route(Method::POST, LOGIN, StatusCode::UNAUTHORIZED, InMemoryBody::Json(json!({"detail": "Incorrect email or password"})))
            .route(Method::POST, "/api/v1/auth/refresh", StatusCode::OK, InMemoryBody::Json(json!({"access_token": "A2"})));
        let flow = AuthFlow::new(ApiConfig::default(), Arc::new(MemoryStore::with_tokens("A1", "R1")));
        let client = flow.public_client().with_middleware(backend.clone());

        let err = flow.login(&client, "a@b.c", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::HttpError(_)));
        assert_eq!(err.detail().as_deref(), Some("Incorrect email or password"));
        assert_eq!(flow.store().access_token().as_deref(), Some("A1"));
        assert_eq!(backend.calls(&Method::POST, "/api/v1/auth/refresh"), 0);
        assert!(backend.requests()[0].headers().get(header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_signup_leaves_tokens_alone() {
        let backend = MockBackend::new().handler(Method::POST, "/api/v1/auth/signup", |req| {
            let body: serde_json::Value = req.body().clone().json()?;
            assert_eq!(body, json!({"email": "a@b.c", "username": "ann", "password": "pw"}));
            Ok(crate::response::in_memory_response(StatusCode::CREATED, InMemoryBody::Json(json!({"id": 7, "username": "ann"}))))
        });
        let flow = flow();
        let client = flow.public_client().with_middleware(backend);

        let user = flow.signup(&client, &Signup {
            email: "a@b.c".to_string(),
            username: "ann".to_string(),
            password: "pw".to_string(),
        }).await.unwrap();
        assert_eq!(user["id"], 7);
        assert!(!flow.is_authenticated());
    }

    #[test]
    fn test_logout_clears_tokens() {
        let flow = AuthFlow::new(ApiConfig::default(), Arc::new(MemoryStore::with_tokens("A1", "R1")));
        assert!(flow.is_authenticated());
        flow.logout();
        assert!(!flow.is_authenticated());
        assert_eq!(flow.store().refresh_token(), None);
    }
}

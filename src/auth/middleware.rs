use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use http::{header, HeaderValue, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::refresh::RefreshResponse;
use crate::config::ApiConfig;
use crate::middleware::{Middleware, Next};
use crate::sanitize::sanitize_query;
use crate::store::{TokenPair, TokenStore};
use crate::{Error, InMemoryRequest, Response, ResponseExt, Result};

/// Whether a request has already been through a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    Retry,
}

/// What a response means for the session.
#[derive(Debug)]
pub enum Outcome {
    /// Informational, success or redirect. Returned as is.
    Success(Response),
    /// Rejected as unauthenticated on the initial attempt. Worth a refresh.
    Unauthorized(Result),
    /// Everything else, including a 401 on a retry. Returned as is.
    Failure(Result),
}

impl Outcome {
    pub fn classify(res: Result, attempt: Attempt) -> Self {
        let unauthorized = match &res {
            Ok(r) => r.status() == StatusCode::UNAUTHORIZED,
            Err(e) => e.is_unauthorized(),
        };
        match res {
            res if unauthorized && attempt == Attempt::Initial => Outcome::Unauthorized(res),
            Ok(r) if !(r.status().is_client_error() || r.status().is_server_error()) => Outcome::Success(r),
            res => Outcome::Failure(res),
        }
    }
}

/// Authorizes every request with the stored access token. When a request comes back 401,
/// exchanges the refresh token for a new access token and sends the request once more.
///
/// If the exchange fails, both tokens are cleared, `on_session_end` is called with the login
/// entry point, and the caller gets the refresh error.
///
/// Refreshes are single-flight: requests that fail together wait for one refresh and retry
/// with its token.
pub struct BearerAuth {
    store: Arc<dyn TokenStore>,
    refresh_endpoint: String,
    login_redirect: String,
    refresh_lock: Mutex<()>,
    on_refresh: Option<Box<dyn Fn(&TokenPair) + Send + Sync + 'static>>,
    on_session_end: Option<Box<dyn Fn(&str) + Send + Sync + 'static>>,
}

impl Debug for BearerAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("store", &self.store)
            .field("refresh_endpoint", &self.refresh_endpoint)
            .field("login_redirect", &self.login_redirect)
            .field("on_refresh", &self.on_refresh.as_ref().map(|_| "Fn(&TokenPair)"))
            .field("on_session_end", &self.on_session_end.as_ref().map(|_| "Fn(&str)"))
            .finish()
    }
}

impl BearerAuth {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self::from_config(store, &ApiConfig::default())
    }

    pub fn from_config(store: Arc<dyn TokenStore>, config: &ApiConfig) -> Self {
        BearerAuth {
            store,
            refresh_endpoint: config.refresh_endpoint.clone(),
            login_redirect: config.login_redirect.clone(),
            refresh_lock: Mutex::new(()),
            on_refresh: None,
            on_session_end: None,
        }
    }

    pub fn refresh_endpoint(mut self, endpoint: &str) -> Self {
        self.refresh_endpoint = endpoint.to_string();
        self
    }

    pub fn login_redirect(mut self, redirect: &str) -> Self {
        self.login_redirect = redirect.to_string();
        self
    }

    /// Called with the new tokens after every successful refresh.
    pub fn on_refresh(mut self, callback: impl Fn(&TokenPair) + Send + Sync + 'static) -> Self {
        self.on_refresh = Some(Box::new(callback));
        self
    }

    /// Called with the login entry point when the session is over.
    pub fn on_session_end(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_session_end = Some(Box::new(callback));
        self
    }

    /// Overwrites any authorization already on the request. Without a usable token the
    /// request goes out as it is.
    fn authorize(&self, mut request: InMemoryRequest, token: Option<&str>) -> InMemoryRequest {
        let Some(token) = token else {
            return request;
        };
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                request.headers_mut().insert(header::AUTHORIZATION, value);
            }
            Err(_) => warn!("Stored access token is not a valid header value; sending unauthenticated"),
        }
        request
    }

    /// Returns the access token to retry with. `stale` is the token the failed request carried.
    async fn refresh(&self, stale: Option<&str>, next: Next<'_>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(current) = self.store.access_token() {
            if stale != Some(current.as_str()) {
                debug!("Access token was already refreshed by a concurrent request");
                return Ok(current);
            }
        }
        match self.exchange(next).await {
            Ok(tokens) => {
                let access_token = tokens.access_token.clone();
                self.store.set_tokens(tokens.access_token.clone(), tokens.refresh_token.clone());
                info!(rotated = tokens.refresh_token.is_some(), "Refreshed access token");
                if let Some(callback) = self.on_refresh.as_ref() {
                    callback(&tokens);
                }
                Ok(access_token)
            }
            Err(e) => {
                warn!(error = %e, "Unable to refresh access token; ending session");
                self.store.clear_tokens();
                if let Some(callback) = self.on_session_end.as_ref() {
                    callback(&self.login_redirect);
                }
                Err(e)
            }
        }
    }

    /// The refresh request skips the middlewares before this one, so it carries no bearer token.
    async fn exchange(&self, next: Next<'_>) -> Result<TokenPair> {
        let Some(refresh_token) = self.store.refresh_token() else {
            return Err(Error::MissingRefreshToken);
        };
        let request = next.client
            .post(&self.refresh_endpoint)
            .query("refresh_token", &refresh_token)
            .build()?;
        let res = next.run(request).await?.error_for_status()?;
        let data: RefreshResponse = res.json().await?;
        Ok(data.into())
    }
}

#[async_trait]
impl Middleware for BearerAuth {
    async fn handle(&self, request: InMemoryRequest, next: Next<'_>) -> Result {
        let mut attempt = Attempt::Initial;
        let mut token = self.store.access_token();
        loop {
            let req = self.authorize(request.clone(), token.as_deref());
            match Outcome::classify(next.run(req).await, attempt) {
                Outcome::Success(res) => return Ok(res),
                Outcome::Failure(res) => return res,
                Outcome::Unauthorized(_) => {
                    debug!(url = %sanitize_query(request.uri()), "Request was unauthorized, refreshing access token");
                    attempt = Attempt::Retry;
                    token = Some(self.refresh(token.as_deref(), next).await?);
                }
            }
        }
    }
}

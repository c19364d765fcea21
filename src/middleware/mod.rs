use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::client::{transport, Client};
use crate::sanitize::{sanitize_query, sanitized_headers};
use crate::{Body, Error, InMemoryBody, InMemoryRequest, Response, Result};

pub type MiddlewareStack = Vec<Arc<dyn Middleware>>;

/// The remainder of the middleware stack. Running it past the last middleware sends the
/// request over the network.
#[derive(Debug, Copy, Clone)]
pub struct Next<'a> {
    pub client: &'a Client,
    pub(crate) middlewares: &'a [Arc<dyn Middleware>],
}

impl Next<'_> {
    pub async fn run(self, request: InMemoryRequest) -> Result {
        if let Some((middleware, rest)) = self.middlewares.split_first() {
            let next = Next {
                client: self.client,
                middlewares: rest,
            };
            middleware.handle(request, next).await
        } else {
            let request = request.into_hyper()?;
            let res = transport()?.request(request).await?;
            let (parts, body) = res.into_parts();
            Ok(Response::from_parts(parts, Body::Hyper(body)))
        }
    }
}

#[async_trait]
pub trait Middleware: Send + Sync + Debug {
    async fn handle(&self, request: InMemoryRequest, next: Next<'_>) -> Result {
        next.run(request).await
    }
}

/// Logs requests and responses at `debug`. Credentials in headers, query strings and JSON
/// bodies are masked. Response bodies are read into memory so they can be logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Logger;

fn describe(body: &InMemoryBody) -> String {
    let mut body = body.clone();
    body.sanitize();
    match body {
        InMemoryBody::Empty => String::new(),
        InMemoryBody::Json(value) => value.to_string(),
        InMemoryBody::Text(text) => text,
        InMemoryBody::Bytes(b) => format!("<{} bytes>", b.len()),
    }
}

async fn log_response(url: &str, res: Response) -> Result {
    let (parts, body) = res.into_parts();
    let body = body.into_memory().await?;
    debug!(
        url = %url,
        status = %parts.status,
        headers = ?sanitized_headers(&parts.headers),
        body = %describe(&body),
        "response"
    );
    Ok(Response::from_parts(parts, body.into()))
}

#[async_trait]
impl Middleware for Logger {
    async fn handle(&self, request: InMemoryRequest, next: Next<'_>) -> Result {
        let url = sanitize_query(request.uri());
        let method = request.method().clone();
        debug!(
            %method,
            url = %url,
            headers = ?sanitized_headers(request.headers()),
            body = %describe(request.body()),
            "request"
        );
        match next.run(request).await {
            Ok(res) => log_response(&url, res).await,
            Err(Error::HttpError(res)) => Err(Error::HttpError(log_response(&url, res).await?)),
            Err(e) => {
                warn!(%method, url = %url, error = %e, "request failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use serde_json::json;

    use crate::mock::MockBackend;
    use crate::ResponseExt;

    use super::*;

    #[derive(Debug)]
    struct Tag(&'static str);

    #[async_trait]
    impl Middleware for Tag {
        async fn handle(&self, request: InMemoryRequest, next: Next<'_>) -> Result {
            let request = request.set_header(
                http::header::HeaderName::from_static("x-tag"),
                http::HeaderValue::from_static(self.0),
            );
            next.run(request).await
        }
    }

    #[tokio::test]
    async fn test_stack_runs_in_order() {
        let backend = MockBackend::new().route(Method::GET, "/", StatusCode::OK, InMemoryBody::Empty);
        let client = Client::new()
            .base_url("http://localhost")
            .with_middleware(Tag("first"))
            .with_middleware(Tag("second"))
            .with_middleware(backend.clone());
        client.get("/").await.unwrap();
        assert_eq!(backend.requests()[0].headers()["x-tag"], "second");
    }

    #[tokio::test]
    async fn test_logger_passes_body_through() {
        let backend = MockBackend::new()
            .route(Method::POST, "/todos/", StatusCode::CREATED, InMemoryBody::Json(json!({"id": 1, "title": "milk"})));
        let client = Client::new()
            .base_url("http://localhost")
            .with_middleware(Logger)
            .with_middleware(backend);
        let res = client.post("/todos/").json(json!({"title": "milk"})).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let value: serde_json::Value = res.json().await.unwrap();
        assert_eq!(value, json!({"id": 1, "title": "milk"}));
    }

    #[test]
    fn test_describe_masks_credentials() {
        let body = InMemoryBody::Json(json!({"username": "a@b.c", "password": "pw", "email": "a@b.c"}));
        assert_eq!(describe(&body), r#"{"email":"a@b.c","password":"**********","username":"**********"}"#);
    }
}

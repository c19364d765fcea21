//! A scripted stand-in for the backend. Put `MockBackend` last in the middleware stack and
//! it answers every request itself, so nothing reaches the network.
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use http::{Method, StatusCode};
use serde_json::json;

use crate::middleware::{Middleware, Next};
use crate::response::in_memory_response;
use crate::{Error, InMemoryBody, InMemoryRequest, Result};

type Handler = Arc<dyn Fn(&InMemoryRequest) -> Result + Send + Sync>;

struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

#[derive(Default)]
struct State {
    routes: Vec<Route>,
    requests: Vec<InMemoryRequest>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl Debug for MockBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MockBackend")
            .field("routes", &state.routes.iter().map(|r| format!("{} {}", r.method, r.path)).collect::<Vec<_>>())
            .field("requests", &state.requests.len())
            .finish()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` by calling `handler`. Later routes for the same path take precedence.
    pub fn handler(self, method: Method, path: &str, handler: impl Fn(&InMemoryRequest) -> Result + Send + Sync + 'static) -> Self {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).routes.push(Route {
            method,
            path: path.to_string(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Always answer `method path` with the same status and body.
    pub fn route(self, method: Method, path: &str, status: StatusCode, body: InMemoryBody) -> Self {
        self.handler(method, path, move |_| Ok(in_memory_response(status, body.clone())))
    }

    /// Answer with each response in turn. The last one repeats once the others are used up.
    pub fn sequence(self, method: Method, path: &str, responses: Vec<(StatusCode, InMemoryBody)>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        self.handler(method, path, move |_| {
            let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
            let next = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            let (status, body) = next.unwrap_or((StatusCode::NOT_FOUND, InMemoryBody::Empty));
            Ok(in_memory_response(status, body))
        })
    }

    /// Fail `method path` as if the connection was refused.
    pub fn unreachable(self, method: Method, path: &str) -> Self {
        self.handler(method, path, |_| {
            Err(Error::IoError(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused")))
        })
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<InMemoryRequest> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).requests.clone()
    }

    pub fn calls(&self, method: &Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method() == method && r.path() == path)
            .count()
    }
}

#[async_trait]
impl Middleware for MockBackend {
    async fn handle(&self, request: InMemoryRequest, _next: Next<'_>) -> Result {
        let handler = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.requests.push(request.clone());
            state.routes.iter().rev()
                .find(|r| r.method == request.method && r.path == request.path())
                .map(|r| r.handler.clone())
        };
        match handler {
            Some(handler) => handler(&request),
            None => Ok(in_memory_response(StatusCode::NOT_FOUND, InMemoryBody::Json(json!({"detail": "Not Found"})))),
        }
    }
}

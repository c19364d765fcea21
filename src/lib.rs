//! HTTP client for the task backend.
//!
//! Requests go through a stack of [`Middleware`]s before they hit the network. [`BearerAuth`]
//! authorizes every request with the stored access token and, when the backend answers 401,
//! refreshes the token once and retries. If the refresh fails, the session is ended: tokens
//! are cleared and the application is told to go back to its login entry point.
//!
//! ```ignore
//! let auth = AuthFlow::from_config(ApiConfig::from_env())?;
//! auth.login(&auth.public_client(), "a@b.c", "pw").await?;
//! let client = auth.client().with_middleware(Logger);
//! let todos = client.get("/todos/").send_awaiting_body().await?;
//! ```
pub mod auth;
mod body;
mod client;
pub mod config;
mod error;
pub mod middleware;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod multipart;
mod request;
mod response;
pub mod sanitize;
pub mod store;

pub use auth::{AuthFlow, BearerAuth, Signup};
pub use body::{Body, InMemoryBody};
pub use client::Client;
pub use config::ApiConfig;
pub use error::{Error, InMemoryError, InMemoryResult, Result};
pub use http::{Method, StatusCode};
pub use middleware::{Logger, Middleware, Next};
pub use request::{InMemoryRequest, Request, RequestBuilder};
pub use response::{in_memory_response, InMemoryResponse, InMemoryResponseExt, Response, ResponseExt};
pub use store::{FileStore, MemoryStore, TokenPair, TokenStore};

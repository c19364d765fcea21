//! Logs in against a running backend and lists the user's todos.
//!
//! TASKCLIENT_USERNAME=a@b.c TASKCLIENT_PASSWORD=pw RUST_LOG=taskclient=debug cargo run --example session
use std::env;

use taskclient::{ApiConfig, AuthFlow, InMemoryResponseExt, Logger};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ApiConfig::from_env();
    let auth = match AuthFlow::from_config(config) {
        Ok(auth) => auth,
        Err(e) => {
            error!(error = %e, "Unable to open token store");
            return;
        }
    };
    let client = auth.client().with_middleware(Logger);

    if !auth.is_authenticated() {
        let (Ok(username), Ok(password)) = (env::var("TASKCLIENT_USERNAME"), env::var("TASKCLIENT_PASSWORD")) else {
            error!("Not logged in. Set TASKCLIENT_USERNAME and TASKCLIENT_PASSWORD.");
            return;
        };
        let public = auth.public_client().with_middleware(Logger);
        if let Err(e) = auth.login(&public, &username, &password).await {
            error!(detail = ?e.detail(), "Login failed");
            return;
        }
    }

    match client.get("/todos/").send_awaiting_body().await {
        Ok(res) => match res.json::<serde_json::Value>() {
            Ok(todos) => info!(%todos, "Fetched todos"),
            Err(e) => error!(error = %e, "Unexpected response"),
        },
        Err(e) if !auth.is_authenticated() => {
            error!(error = %e, redirect = %auth.config().login_redirect, "Session ended");
        }
        Err(e) => error!(error = %e, detail = ?e.detail(), "Request failed"),
    }
}

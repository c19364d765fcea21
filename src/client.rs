use std::fmt::Formatter;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use http::{Method, Uri};
use http_body_util::Full;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::middleware::{Middleware, MiddlewareStack};
use crate::{Error, RequestBuilder};

pub(crate) type HttpsClient = hyper_util::client::legacy::Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

static TRANSPORT: OnceLock<HttpsClient> = OnceLock::new();

/// The connection pool shared by every `Client`. Built on first use, so clients whose
/// middleware answers every request never load root certificates.
pub(crate) fn transport() -> std::io::Result<&'static HttpsClient> {
    if let Some(client) = TRANSPORT.get() {
        return Ok(client);
    }
    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build();
    let client = hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build(https);
    Ok(TRANSPORT.get_or_init(|| client))
}

static APP_USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
);

pub struct Client {
    base_url: Option<String>,
    default_headers: Vec<(String, String)>,
    pub(crate) middlewares: MiddlewareStack,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Client {{ base_url: {:?}, middlewares: {:?} }}", self.base_url, self.middlewares)
    }
}

impl Client {
    pub fn new() -> Self {
        Client {
            base_url: None,
            default_headers: vec![("User-Agent".to_string(), APP_USER_AGENT.to_string())],
            middlewares: Vec::new(),
        }
    }

    /// Set a `base_url` so you can pass relative paths instead of full URLs.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    /// Middlewares run in the order they are added. The first one sees the request first
    /// and the response last.
    pub fn with_middleware<T: Middleware + 'static>(mut self, middleware: T) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn no_default_headers(mut self) -> Self {
        self.default_headers = Vec::new();
        self
    }

    pub fn default_headers<S: AsRef<str>, I: Iterator<Item = (S, S)>>(mut self, headers: I) -> Self {
        self.default_headers.extend(headers.map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())));
        self
    }

    pub fn default_header<S: AsRef<str>>(mut self, key: S, value: S) -> Self {
        self.default_headers.push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    fn build_uri(&self, uri_or_path: &str) -> Result<Uri, http::uri::InvalidUri> {
        if let Ok(uri) = Uri::from_str(uri_or_path) {
            if uri.scheme().is_some() && uri.host().is_some() {
                return Ok(uri);
            }
        }
        match &self.base_url {
            Some(base) if uri_or_path.starts_with('/') => Uri::from_str(&format!("{base}{uri_or_path}")),
            Some(base) => Uri::from_str(&format!("{base}/{uri_or_path}")),
            None => Uri::from_str(uri_or_path),
        }
    }

    pub fn get(&self, uri_or_path: &str) -> RequestBuilder<'_> {
        self.request(Method::GET, uri_or_path)
    }

    pub fn post(&self, uri_or_path: &str) -> RequestBuilder<'_> {
        self.request(Method::POST, uri_or_path)
    }

    pub fn put(&self, uri_or_path: &str) -> RequestBuilder<'_> {
        self.request(Method::PUT, uri_or_path)
    }

    pub fn patch(&self, uri_or_path: &str) -> RequestBuilder<'_> {
        self.request(Method::PATCH, uri_or_path)
    }

    pub fn delete(&self, uri_or_path: &str) -> RequestBuilder<'_> {
        self.request(Method::DELETE, uri_or_path)
    }

    pub fn request(&self, method: Method, uri_or_path: &str) -> RequestBuilder<'_> {
        let builder = match self.build_uri(uri_or_path) {
            Ok(uri) => RequestBuilder::new(self, method, uri),
            Err(e) => RequestBuilder::new(self, method, Uri::default()).with_error(Error::Http(e.into())),
        };
        builder.headers(self.default_headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

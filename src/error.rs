use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use std::string::FromUtf8Error;

use http::StatusCode;

use crate::{Body, InMemoryBody, InMemoryResponse, Response};

pub type Result<T = Response, E = Error> = std::result::Result<T, E>;
pub type InMemoryError = Error<InMemoryBody>;
pub type InMemoryResult<T> = Result<T, InMemoryError>;

pub enum Error<T = Body> {
    Custom(String),
    /// A URI or header given to the request builder was invalid.
    Http(http::Error),
    /// Connecting to, or exchanging bytes with, the remote server failed.
    Transport(hyper_util::client::legacy::Error),
    HttpProtocol(hyper::Error),
    Utf8Error(FromUtf8Error),
    JsonEncoding(serde_json::Error),
    IoError(std::io::Error),
    HttpError(Response<T>),
    /// A request was rejected as unauthenticated and there is no refresh token to recover with.
    MissingRefreshToken,
}

impl<T> Error<T> {
    pub fn custom(msg: &str) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Get the error status code.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError(r) => Some(r.status()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

impl Error {
    pub async fn into_memory(self) -> InMemoryError {
        match self {
            Error::HttpError(r) => {
                let (parts, body) = r.into_parts();
                let body = match body.into_memory().await {
                    Ok(body) => body,
                    Err(e) => return e,
                };
                Error::HttpError(InMemoryResponse::from_parts(parts, body))
            }
            Error::Custom(e) => Error::Custom(e),
            Error::Http(e) => Error::Http(e),
            Error::Transport(e) => Error::Transport(e),
            Error::HttpProtocol(h) => Error::HttpProtocol(h),
            Error::Utf8Error(u) => Error::Utf8Error(u),
            Error::JsonEncoding(e) => Error::JsonEncoding(e),
            Error::IoError(i) => Error::IoError(i),
            Error::MissingRefreshToken => Error::MissingRefreshToken,
        }
    }
}

impl InMemoryError {
    /// The backend reports failures as `{"detail": "..."}`. Returns that message if present.
    pub fn detail(&self) -> Option<String> {
        let Error::HttpError(r) = self else {
            return None;
        };
        let value: serde_json::Value = r.body().clone().json().ok()?;
        match value.get("detail")? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl From<InMemoryError> for Error {
    fn from(value: InMemoryError) -> Self {
        match value {
            Error::HttpError(r) => {
                let (parts, body) = r.into_parts();
                Error::HttpError(Response::from_parts(parts, body.into()))
            }
            Error::Custom(e) => Error::Custom(e),
            Error::Http(e) => Error::Http(e),
            Error::Transport(e) => Error::Transport(e),
            Error::HttpProtocol(h) => Error::HttpProtocol(h),
            Error::Utf8Error(u) => Error::Utf8Error(u),
            Error::JsonEncoding(e) => Error::JsonEncoding(e),
            Error::IoError(i) => Error::IoError(i),
            Error::MissingRefreshToken => Error::MissingRefreshToken,
        }
    }
}

impl<T: Debug> Debug for Error<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Custom(msg) => write!(f, "Custom: {}", msg),
            Error::Http(e) => write!(f, "HttpError: {}", e),
            Error::Transport(e) => write!(f, "TransportError: {:?}", e),
            Error::HttpProtocol(e) => write!(f, "HttpProtocolError: {}", e),
            Error::Utf8Error(e) => write!(f, "Utf8Error: {}", e),
            Error::JsonEncoding(e) => write!(f, "JsonEncodingError: {}", e),
            Error::IoError(e) => write!(f, "IoError: {}", e),
            Error::HttpError(r) => {
                write!(
                    f,
                    "HttpError {{ status: {}, headers: {:?}, body: {:?} }}",
                    r.status(), r.headers(), r.body()
                )
            }
            Error::MissingRefreshToken => write!(f, "MissingRefreshToken"),
        }
    }
}

impl<T: Debug> Display for Error<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Custom(msg) => write!(f, "{}", msg),
            Error::Http(e) => write!(f, "Invalid request: {}", e),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
            Error::HttpProtocol(e) => write!(f, "HttpProtocolError: {}", e),
            Error::Utf8Error(e) => write!(f, "Utf8Error: {}", e),
            Error::JsonEncoding(e) => write!(f, "JsonEncodingError: {}", e),
            Error::IoError(e) => write!(f, "IoError: {}", e),
            Error::HttpError(r) => {
                write!(
                    f,
                    "HttpError {{ status: {}, body: {:?} }}",
                    r.status(), r.body()
                )
            }
            Error::MissingRefreshToken => write!(f, "No refresh token is stored; the session has ended"),
        }
    }
}

impl<T: Debug> StdError for Error<T> {}

impl<T> From<serde_json::Error> for Error<T> {
    fn from(value: serde_json::Error) -> Self {
        Error::JsonEncoding(value)
    }
}

impl<T> From<std::io::Error> for Error<T> {
    fn from(value: std::io::Error) -> Self {
        Error::IoError(value)
    }
}

impl<T> From<hyper::Error> for Error<T> {
    fn from(value: hyper::Error) -> Self {
        Error::HttpProtocol(value)
    }
}

impl<T> From<hyper_util::client::legacy::Error> for Error<T> {
    fn from(value: hyper_util::client::legacy::Error) -> Self {
        Error::Transport(value)
    }
}

impl<T> From<http::Error> for Error<T> {
    fn from(value: http::Error) -> Self {
        Error::Http(value)
    }
}

impl<T> From<FromUtf8Error> for Error<T> {
    fn from(value: FromUtf8Error) -> Self {
        Error::Utf8Error(value)
    }
}

impl<T> From<serde_qs::Error> for Error<T> {
    fn from(value: serde_qs::Error) -> Self {
        Error::Custom(format!("Unable to encode form: {}", value))
    }
}

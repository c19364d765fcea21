use serde::{Deserialize, Serialize};

use crate::store::TokenPair;

/// Response of the login endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Response when requesting a new access token using a refresh token. The backend may
/// rotate the refresh token; when it doesn't, the field is absent.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl From<LoginResponse> for TokenPair {
    fn from(value: LoginResponse) -> Self {
        TokenPair {
            access_token: value.access_token,
            refresh_token: Some(value.refresh_token),
        }
    }
}

impl From<RefreshResponse> for TokenPair {
    fn from(value: RefreshResponse) -> Self {
        TokenPair {
            access_token: value.access_token,
            // an empty refresh token is no rotation
            refresh_token: value.refresh_token.filter(|t| !t.is_empty()),
        }
    }
}

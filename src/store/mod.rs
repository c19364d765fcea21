//! Where the session's tokens live between requests.
//!
//! The store is the only place tokens are kept. `BearerAuth` reads the access token before
//! every request and is the only writer after login: it overwrites tokens on refresh and
//! clears them when refresh fails.
use std::fmt::Debug;

pub use file::FileStore;
pub use memory::MemoryStore;

mod file;
mod memory;

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

pub trait TokenStore: Send + Sync + Debug {
    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    /// Overwrite the access token. The refresh token is only overwritten when one is given.
    fn set_tokens(&self, access_token: String, refresh_token: Option<String>);

    fn clear_tokens(&self);
}

/// A pair of tokens as issued by login or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn store_in(self, store: &dyn TokenStore) {
        store.set_tokens(self.access_token, self.refresh_token);
    }
}

//! Session configuration for the standalone binary

use secrecy::SecretString;
use serde::Deserialize;

/// Credentials the binary signs in with
///
/// Library callers supply their own `SessionProvider` and leave this empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Bearer token; never logged
    pub token: Option<SecretString>,
}

impl SessionConfig {
    /// True when a token was configured
    pub fn has_token(&self) -> bool {
        use secrecy::ExposeSecret;
        self.token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty())
    }
}

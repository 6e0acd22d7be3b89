//! Streaming endpoint construction.
//!
//! The stream lives on the same origin as the dashboard page. A page
//! served over `https` talks `wss`, a plain `http` page talks `ws`, and
//! the bearer token rides along as a percent-encoded query credential:
//!
//! ```text
//! https://ops.example.com  ->  wss://ops.example.com/ws?token=<token>
//! ```

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::domain::foundation::ValidationError;

/// Where the streaming connection goes, minus the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoint {
    scheme: &'static str,
    authority: String,
    path: String,
}

impl StreamEndpoint {
    /// Derives the endpoint from the page origin.
    ///
    /// `http`/`https` map to `ws`/`wss`; `ws`/`wss` origins are taken as-is.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the origin does not parse, has no host,
    /// uses another scheme, or `path` does not start with `/`.
    pub fn from_page_origin(origin: &str, path: &str) -> Result<Self, ValidationError> {
        let url = Url::parse(origin)
            .map_err(|e| ValidationError::invalid_format("base_url", e.to_string()))?;

        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(ValidationError::invalid_format(
                    "base_url",
                    format!("unsupported scheme '{}'", other),
                ))
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ValidationError::invalid_format("base_url", "missing host"))?;

        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        if !path.starts_with('/') {
            return Err(ValidationError::invalid_format(
                "ws_path",
                "must start with '/'",
            ));
        }

        Ok(Self {
            scheme,
            authority,
            path: path.to_string(),
        })
    }

    /// Returns true if the endpoint uses transport security.
    pub fn is_secure(&self) -> bool {
        self.scheme == "wss"
    }

    /// Builds the full target for one connection attempt.
    pub fn target(&self, token: &SecretString) -> StreamTarget {
        let base = format!("{}://{}{}", self.scheme, self.authority, self.path);
        StreamTarget {
            url: format!(
                "{}?token={}",
                base,
                urlencoding::encode(token.expose_secret())
            ),
            redacted: format!("{}?token=[REDACTED]", base),
        }
    }
}

impl fmt::Display for StreamEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path)
    }
}

/// A concrete connection target carrying the credential.
///
/// `Debug` and `Display` only ever show the redacted form.
#[derive(Clone, PartialEq, Eq)]
pub struct StreamTarget {
    url: String,
    redacted: String,
}

impl StreamTarget {
    /// The full URL including the token. Hand it to the transport only.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL with the token masked, safe for logs.
    pub fn redacted(&self) -> &str {
        &self.redacted
    }
}

impl fmt::Debug for StreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamTarget").field(&self.redacted).finish()
    }
}

impl fmt::Display for StreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    #[test]
    fn https_origin_uses_secure_scheme() {
        let endpoint = StreamEndpoint::from_page_origin("https://ops.example.com", "/ws").unwrap();
        assert!(endpoint.is_secure());
        assert_eq!(
            endpoint.target(&token("abc")).url(),
            "wss://ops.example.com/ws?token=abc"
        );
    }

    #[test]
    fn http_origin_keeps_port_and_plain_scheme() {
        let endpoint = StreamEndpoint::from_page_origin("http://localhost:8080/dashboard", "/ws").unwrap();
        assert!(!endpoint.is_secure());
        assert_eq!(endpoint.to_string(), "ws://localhost:8080/ws");
    }

    #[test]
    fn token_is_percent_encoded() {
        let endpoint = StreamEndpoint::from_page_origin("https://ops.example.com", "/ws").unwrap();
        let target = endpoint.target(&token("a b/c+d=="));
        assert_eq!(
            target.url(),
            "wss://ops.example.com/ws?token=a%20b%2Fc%2Bd%3D%3D"
        );
    }

    #[test]
    fn target_never_shows_token_in_debug_or_display() {
        let endpoint = StreamEndpoint::from_page_origin("https://ops.example.com", "/ws").unwrap();
        let target = endpoint.target(&token("super-secret"));

        assert!(!format!("{:?}", target).contains("super-secret"));
        assert!(!target.to_string().contains("super-secret"));
        assert_eq!(target.redacted(), "wss://ops.example.com/ws?token=[REDACTED]");
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        assert!(StreamEndpoint::from_page_origin("ftp://ops.example.com", "/ws").is_err());
    }

    #[test]
    fn unparseable_origin_is_rejected() {
        assert!(StreamEndpoint::from_page_origin("not a url", "/ws").is_err());
    }

    #[test]
    fn relative_path_is_rejected() {
        assert!(StreamEndpoint::from_page_origin("https://ops.example.com", "ws").is_err());
    }
}

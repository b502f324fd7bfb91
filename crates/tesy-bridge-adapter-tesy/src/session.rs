//! Login credentials and session artifacts.

use crate::client::ClientError;
use reqwest::header::{HeaderMap, SET_COOKIE};
use secrecy::SecretString;

/// Name of the PHP session cookie issued at login.
pub const SESSION_COOKIE: &str = "PHPSESSID";
/// Response header carrying the alternate account token.
pub const HEADER_ACC_ALT: &str = "acc_alt";
/// Response header carrying the account session token.
pub const HEADER_ACC_SESSION: &str = "acc_session";

/// Account credentials for the vendor login form.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account user name
    pub username: String,
    /// Account password
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Authenticated session artifacts. All three are non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    php_session: String,
    acc_alt: String,
    acc_session: String,
}

impl Session {
    /// Assemble a session from its three artifacts.
    ///
    /// # Errors
    ///
    /// Returns error naming the first artifact that is empty.
    pub fn new(
        php_session: impl Into<String>,
        acc_alt: impl Into<String>,
        acc_session: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let php_session = non_empty(php_session.into(), SESSION_COOKIE)?;
        let acc_alt = non_empty(acc_alt.into(), HEADER_ACC_ALT)?;
        let acc_session = non_empty(acc_session.into(), HEADER_ACC_SESSION)?;

        Ok(Self {
            php_session,
            acc_alt,
            acc_session,
        })
    }

    /// Extract a session from login response headers.
    ///
    /// # Errors
    ///
    /// Returns error if the cookie or either token header is absent.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ClientError> {
        let php_session = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>();
        let php_session = session_cookie(&php_session)
            .ok_or_else(|| ClientError::MissingSessionArtifact(SESSION_COOKIE.to_string()))?;

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        Self::new(
            php_session,
            header(HEADER_ACC_ALT),
            header(HEADER_ACC_SESSION),
        )
    }

    /// Value for the `Cookie` request header.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        format!("{SESSION_COOKIE}={}", self.php_session)
    }

    /// Alternate account token (`X-ACC-ALT`).
    #[must_use]
    pub fn acc_alt(&self) -> &str {
        &self.acc_alt
    }

    /// Account session token (`X-ACC-SESSION`).
    #[must_use]
    pub fn acc_session(&self) -> &str {
        &self.acc_session
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("php_session", &"[REDACTED]")
            .field("acc_alt", &"[REDACTED]")
            .field("acc_session", &"[REDACTED]")
            .finish()
    }
}

fn non_empty(value: String, artifact: &str) -> Result<String, ClientError> {
    if value.trim().is_empty() {
        Err(ClientError::MissingSessionArtifact(artifact.to_string()))
    } else {
        Ok(value)
    }
}

/// Pick the session cookie value out of `Set-Cookie` header values.
///
/// Prefers a cookie named `PHPSESSID`; otherwise falls back to the first
/// cookie set.
fn session_cookie(set_cookies: &[&str]) -> Option<String> {
    let pairs = set_cookies.iter().filter_map(|raw| {
        let pair = raw.split(';').next()?;
        let (name, value) = pair.split_once('=')?;
        Some((name.trim(), value.trim()))
    });

    let mut first = None;
    for (name, value) in pairs {
        if name == SESSION_COOKIE {
            return Some(value.to_string()).filter(|v| !v.is_empty());
        }
        first.get_or_insert(value);
    }

    first.map(str::to_string).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn login_headers(cookie: &str, alt: &str, session: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers.insert(HEADER_ACC_ALT, HeaderValue::from_str(alt).unwrap());
        headers.insert(HEADER_ACC_SESSION, HeaderValue::from_str(session).unwrap());
        headers
    }

    #[test]
    fn parses_all_artifacts() {
        let headers = login_headers("PHPSESSID=abc123; path=/; HttpOnly", "alt-1", "sess-1");

        let session = Session::from_headers(&headers).unwrap();

        assert_eq!(session.cookie_header(), "PHPSESSID=abc123");
        assert_eq!(session.acc_alt(), "alt-1");
        assert_eq!(session.acc_session(), "sess-1");
    }

    #[test]
    fn prefers_php_session_cookie() {
        assert_eq!(
            session_cookie(&["lang=bg; path=/", "PHPSESSID=xyz; path=/"]),
            Some("xyz".to_string())
        );
        assert_eq!(
            session_cookie(&["other=first; path=/"]),
            Some("first".to_string())
        );
        assert_eq!(session_cookie(&["PHPSESSID=; path=/"]), None);
        assert_eq!(session_cookie(&["garbage"]), None);
    }

    #[test]
    fn missing_cookie_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_ACC_ALT, HeaderValue::from_static("alt"));
        headers.insert(HEADER_ACC_SESSION, HeaderValue::from_static("sess"));

        let err = Session::from_headers(&headers).unwrap_err();
        assert!(matches!(err, ClientError::MissingSessionArtifact(ref a) if a == SESSION_COOKIE));
    }

    #[test]
    fn empty_token_is_rejected() {
        let headers = login_headers("PHPSESSID=abc", "alt", " ");

        let err = Session::from_headers(&headers).unwrap_err();
        assert!(
            matches!(err, ClientError::MissingSessionArtifact(ref a) if a == HEADER_ACC_SESSION)
        );
    }

    #[test]
    fn debug_redacts_tokens() {
        let session = Session::new("a", "b", "c").unwrap();
        let debug = format!("{session:?}");
        assert!(!debug.contains("\"a\""));
        assert!(debug.contains("REDACTED"));
    }
}

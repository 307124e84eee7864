use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Credentials for authenticating with the Cloudflare API.
///
/// Only scoped API tokens are supported; they are sent as
/// `Authorization: Bearer <token>` on every request.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Scoped API token with `Account > Zero Trust > Read` permission.
    ApiToken(SecretString),
}

impl Credentials {
    /// Default headers carrying these credentials.
    ///
    /// The authorization value is marked sensitive so it never shows up
    /// in `Debug` output of the header map.
    pub fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        match self {
            Self::ApiToken(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|e| Error::InvalidToken {
                        message: format!("invalid authorization header value: {e}"),
                    })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_token_becomes_bearer_header() {
        let creds = Credentials::ApiToken(SecretString::from("tok-123".to_string()));
        let headers = creds.headers().unwrap();

        let auth = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer tok-123");
        assert!(auth.is_sensitive());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let creds = Credentials::ApiToken(SecretString::from("bad\ntoken".to_string()));
        assert!(matches!(creds.headers(), Err(Error::InvalidToken { .. })));
    }
}

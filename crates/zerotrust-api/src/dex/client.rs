// DEX API HTTP client
//
// Wraps `reqwest::Client` with account-scoped URL construction, status
// handling, and envelope decoding. Endpoint methods live in sibling files
// as inherent impls so this module stays focused on transport mechanics.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::dex::models::ApiEnvelope;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Default Cloudflare v4 API root.
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4/";

/// Async client for the account-scoped DEX endpoints.
///
/// Bound to a single account at construction; every request carries the
/// credentials given to [`new`](Self::new) as default headers.
#[derive(Debug, Clone)]
pub struct DexClient {
    http: reqwest::Client,
    base_url: Url,
    account_id: String,
}

impl DexClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `account_id` against the API root `api_base`.
    pub fn new(
        api_base: &str,
        account_id: impl Into<String>,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client_with_headers(credentials.headers()?)?;
        Self::from_reqwest(api_base, account_id, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        api_base: &str,
        account_id: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(api_base)?,
            account_id: account_id.into(),
        })
    }

    /// Ensure the API root ends with `/` so relative joins append to it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `{base}accounts/{account_id}/{path}`
    pub(crate) fn account_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self
            .base_url
            .join(&format!("accounts/{}/{path}", self.account_id))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET with query parameters and decode the v4 envelope.
    ///
    /// `resource` names what is being fetched in upstream error messages.
    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<ApiEnvelope<T>, Error> {
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        Self::handle_response(resource, resp).await
    }

    /// Map non-2xx to `Error::Upstream`, otherwise decode the body.
    async fn handle_response<T: DeserializeOwned>(
        resource: &'static str,
        resp: reqwest::Response,
    ) -> Result<ApiEnvelope<T>, Error> {
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                resource,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
                body,
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> DexClient {
        DexClient::from_reqwest(base, "acc123", reqwest::Client::new()).unwrap()
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let c = client("https://api.cloudflare.com/client/v4");
        assert_eq!(c.base_url.as_str(), DEFAULT_API_BASE);
    }

    #[test]
    fn account_url_is_scoped() {
        let c = client(DEFAULT_API_BASE);
        let url = c.account_url("dex/fleet-status/devices").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.cloudflare.com/client/v4/accounts/acc123/dex/fleet-status/devices"
        );
    }

    #[test]
    fn invalid_base_is_rejected() {
        let err = DexClient::from_reqwest("::not-a-url", "acc", reqwest::Client::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}

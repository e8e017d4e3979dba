//! Authenticated session against the service's OAuth and API endpoints.
//!
//! The session owns the HTTP client, the current OAuth [`Token`] and its
//! persistent store, and implements the request policy the rest of the
//! crate relies on:
//!
//! * the bearer token is attached to every request, and refreshed
//!   proactively when it is about to expire;
//! * a `401 Unauthorized` response triggers exactly one token refresh and
//!   one retry of the same request, below the pagination layer, so a
//!   continuation token is never perturbed by authentication concerns;
//! * transient gateway failures (502/503/504) are retried with exponential
//!   backoff;
//! * `429 Too Many Requests` is never retried here. It surfaces as
//!   [`ErrorKind::ResourceExhausted`](crate::error::ErrorKind::ResourceExhausted)
//!   so callers can apply their own backoff.
//!
//! Interactive authorization is a three-step dance driven by the caller:
//! [`Session::authorization_url`], user consent, then
//! [`Session::fetch_token`] with the displayed code. The resulting token is
//! persisted through the [`TokenStore`] and reloaded on the next start.

use std::{
    future::Future,
    sync::Mutex,
    time::{Duration, SystemTime},
};

use exponential_backoff::Backoff;
use reqwest::{
    header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode, Url,
};
use serde::Deserialize;
use url::form_urlencoded;

use crate::{
    config::Config,
    error::{Error, Result},
    http,
    token::{FileTokenStore, Token, TokenStore},
};

/// OAuth authorization endpoint.
const AUTHORIZATION_BASE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// OAuth token endpoint, for both code exchange and refresh.
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Out-of-band redirect: the authorization code is displayed to the user
/// instead of being delivered to a callback server.
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// OAuth client ID of the mobile application.
const CLIENT_ID: &str = "228293309116.apps.googleusercontent.com";

/// OAuth client secret of the mobile application. Long public knowledge,
/// like the ID; the service it unlocks no longer exists.
const CLIENT_SECRET: &str = "GL1YV0xMp0RlL7ylCV3ilFz-";

/// Scope covering the mobile API.
const SCOPE: &str = "https://www.googleapis.com/auth/skyjam";

/// Token identifier in the store, keeps mobile credentials apart from any
/// other client type stored for the same account.
const CLIENT_NAME: &str = "mobileclient";

/// Wire shape of a token endpoint response.
#[derive(Clone, Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    refresh_token: Option<String>,
    token_type: String,
    scope: Option<String>,
}

impl TokenResponse {
    /// Converts the relative `expires_in` into an absolute expiry, carrying
    /// the previous refresh token forward when the endpoint omits it.
    fn into_token(self, previous_refresh: Option<String>) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            token_type: self.token_type,
            expires_at: SystemTime::now() + Duration::from_secs(self.expires_in),
            scope: self.scope,
        }
    }
}

/// Authenticated session shared by all client methods.
///
/// Interior mutability keeps the request path `&self`, so independent
/// iterations can page concurrently over one session. The token lock is
/// never held across an await point.
pub struct Session {
    http: http::Client,
    store: FileTokenStore,
    token: Mutex<Option<Token>>,

    /// ICU locale, sent as the `hl` query parameter.
    locale: String,

    /// Subscription tier: `aa` when subscribed, `fr` when not. Sent as the
    /// `tier` query parameter and updated when the account status is known.
    tier: Mutex<String>,

    /// Mobile device ID, sent as the `X-Device-ID` header.
    device_id: Mutex<String>,
}

impl Session {
    /// Attempts before giving up on a transiently failing endpoint.
    const RETRY_ATTEMPTS: u32 = 3;

    /// Shortest wait between transient retries.
    const RETRY_MIN: Duration = Duration::from_millis(500);

    /// Longest wait between transient retries.
    const RETRY_MAX: Duration = Duration::from_secs(10);

    /// Creates a session for the configured account, loading any token
    /// previously stored for it.
    pub fn new(config: &Config) -> Result<Self> {
        let http = http::Client::new(config)?;
        let store = FileTokenStore::new(&config.token_dir, &config.username, CLIENT_NAME);

        let token = store.load()?;
        if token.is_some() {
            debug!("loaded stored token from {}", store.path().display());
        }

        Ok(Self {
            http,
            store,
            token: Mutex::new(token),
            locale: config.locale.clone(),
            tier: Mutex::new(String::from("fr")),
            device_id: Mutex::new(config.device_id.clone()),
        })
    }

    /// Whether a token is present. It may still be expired; expiry is
    /// handled transparently on the next request.
    pub fn is_authenticated(&self) -> bool {
        self.token.lock().is_ok_and(|token| token.is_some())
    }

    pub fn device_id(&self) -> String {
        self.device_id
            .lock()
            .map(|id| id.clone())
            .unwrap_or_default()
    }

    pub fn set_device_id(&self, device_id: &str) {
        if let Ok(mut id) = self.device_id.lock() {
            *id = device_id.to_owned();
        }
    }

    pub fn tier(&self) -> String {
        self.tier.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn set_tier(&self, tier: &str) {
        if let Ok(mut t) = self.tier.lock() {
            *t = tier.to_owned();
        }
    }

    /// The URL to open in a browser to authorize this client.
    ///
    /// The consent page displays a code to paste into
    /// [`Session::fetch_token`].
    #[must_use]
    pub fn authorization_url(&self) -> Url {
        Url::parse_with_params(
            AUTHORIZATION_BASE_URL,
            &[
                ("response_type", "code"),
                ("client_id", CLIENT_ID),
                ("redirect_uri", REDIRECT_URI),
                ("scope", SCOPE),
                ("access_type", "offline"),
                ("prompt", "select_account"),
            ],
        )
        .expect("authorization url is invalid")
    }

    /// Exchanges an authorization code for a token and persists it.
    pub async fn fetch_token(&self, code: &str) -> Result<Token> {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "authorization_code")
            .append_pair("code", code)
            .append_pair("client_id", CLIENT_ID)
            .append_pair("client_secret", CLIENT_SECRET)
            .append_pair("redirect_uri", REDIRECT_URI)
            .finish();

        let token = self.token_endpoint(body, None).await?;
        self.install(token.clone())?;

        Ok(token)
    }

    /// Obtains a fresh access token with the stored refresh token and
    /// persists the result.
    pub async fn refresh_token(&self) -> Result<Token> {
        let refresh = {
            let guard = self.token.lock().map_err(|e| Error::internal(e.to_string()))?;
            guard
                .as_ref()
                .and_then(|token| token.refresh_token.clone())
                .ok_or_else(|| Error::unauthenticated("no refresh token available"))?
        };

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "refresh_token")
            .append_pair("refresh_token", &refresh)
            .append_pair("client_id", CLIENT_ID)
            .append_pair("client_secret", CLIENT_SECRET)
            .finish();

        let token = self.token_endpoint(body, Some(refresh)).await?;
        self.install(token.clone())?;
        debug!("token refreshed, valid for {}s", token.time_to_live().as_secs());

        Ok(token)
    }

    /// Issues an authenticated API request.
    ///
    /// `body` is sent as JSON when present. The URL gains the session's
    /// `hl` and `tier` query parameters.
    pub async fn request(
        &self,
        method: Method,
        mut url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        url.query_pairs_mut()
            .append_pair("hl", &self.locale)
            .append_pair("tier", &self.tier());

        let body = body.map(|value| value.to_string());

        self.ensure_fresh().await?;
        Self::dispatch_with_refresh(
            || self.execute_with_retry(&method, &url, body.as_deref()),
            || async {
                debug!("access token rejected by {}, refreshing once", url.path());
                self.refresh_token().await.map(|_| ())
            },
        )
        .await
    }

    /// Dispatches one logical request under the credential-retry policy:
    /// a `401 Unauthorized` response triggers one refresh and one repeat
    /// dispatch. A second rejection is surfaced, and a failed refresh
    /// aborts without re-dispatching.
    async fn dispatch_with_refresh<D, DFut, R, RFut>(
        mut dispatch: D,
        refresh: R,
    ) -> Result<reqwest::Response>
    where
        D: FnMut() -> DFut,
        DFut: Future<Output = Result<reqwest::Response>>,
        R: FnOnce() -> RFut,
        RFut: Future<Output = Result<()>>,
    {
        let response = dispatch().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            refresh().await?;
            return Self::check_status(dispatch().await?);
        }

        Self::check_status(response)
    }

    /// Issues an authenticated request and decodes the JSON response body.
    pub async fn request_json<T>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.request(method, url, body).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::data_loss(format!("malformed response body: {e}")))
    }

    /// Direct access to the unthrottled HTTP client for media downloads.
    #[must_use]
    pub fn media_client(&self) -> reqwest::Client {
        self.http.unlimited.clone()
    }

    /// Refreshes proactively when the current token is about to lapse.
    async fn ensure_fresh(&self) -> Result<()> {
        let expired = {
            let guard = self.token.lock().map_err(|e| Error::internal(e.to_string()))?;
            match guard.as_ref() {
                Some(token) => token.is_expired(),
                None => {
                    return Err(Error::unauthenticated(
                        "not logged in; complete the authorization flow first",
                    ))
                }
            }
        };

        if expired {
            trace!("access token expired locally, refreshing");
            self.refresh_token().await?;
        }

        Ok(())
    }

    /// Executes one logical request, retrying transient gateway failures
    /// with exponential backoff. Rebuilds the request per attempt because
    /// a dispatched `reqwest::Request` cannot be reused.
    async fn execute_with_retry(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&str>,
    ) -> Result<reqwest::Response> {
        let backoff = Backoff::new(Self::RETRY_ATTEMPTS, Self::RETRY_MIN, Self::RETRY_MAX);

        for duration in &backoff {
            let request = self.build_request(method, url, body)?;
            match self.http.execute(request).await {
                Ok(response) if Self::is_transient(response.status()) => match duration {
                    Some(duration) => {
                        warn!(
                            "{} returned {}, retrying in {:.1}s",
                            url.path(),
                            response.status(),
                            duration.as_secs_f32()
                        );
                        tokio::time::sleep(duration).await;
                    }
                    None => return Ok(response),
                },
                Ok(response) => return Ok(response),
                Err(e) => return Err(e),
            }
        }

        unreachable!("backoff iterator always yields a final attempt");
    }

    fn build_request(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&str>,
    ) -> Result<reqwest::Request> {
        let bearer = {
            let guard = self.token.lock().map_err(|e| Error::internal(e.to_string()))?;
            let token = guard
                .as_ref()
                .ok_or_else(|| Error::unauthenticated("no token available"))?;
            HeaderValue::from_str(&format!("Bearer {token}"))?
        };

        let mut request =
            self.http
                .request(method.clone(), url.clone(), body.map(str::to_owned));
        let headers = request.headers_mut();
        headers.insert(AUTHORIZATION, bearer);
        if let Ok(device_id) = HeaderValue::from_str(&self.device_id()) {
            headers.insert("X-Device-ID", device_id);
        }
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(request)
    }

    fn is_transient(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        )
    }

    /// Maps an error status onto the crate taxonomy; passes success through.
    fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(response);
        }

        let detail = format!("{} {}", status, response.url().path());
        Err(match status {
            StatusCode::UNAUTHORIZED => Error::unauthenticated(detail),
            StatusCode::FORBIDDEN => Error::permission_denied(detail),
            StatusCode::NOT_FOUND => Error::not_found(detail),
            StatusCode::TOO_MANY_REQUESTS => Error::resource_exhausted(detail),
            _ if status.is_client_error() => Error::failed_precondition(detail),
            _ => Error::unavailable(detail),
        })
    }

    /// Calls the token endpoint with a form body, outside the bearer path.
    async fn token_endpoint(&self, body: String, previous_refresh: Option<String>) -> Result<Token> {
        let url = TOKEN_URL.parse::<Url>()?;
        let mut request = self.http.post(url, body);
        request.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded;charset=UTF-8"),
        );

        let response = self.http.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::unauthenticated(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let parsed = response.json::<TokenResponse>().await?;
        Ok(parsed.into_token(previous_refresh))
    }

    /// Makes a token current and persists it.
    fn install(&self, token: Token) -> Result<()> {
        self.store.dump(&token)?;

        let mut guard = self.token.lock().map_err(|e| Error::internal(e.to_string()))?;
        *guard = Some(token);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ErrorKind;

    fn canned(status: StatusCode) -> reqwest::Response {
        ::http::Response::builder()
            .status(status.as_u16())
            .body("")
            .expect("response")
            .into()
    }

    #[tokio::test]
    async fn rejected_request_is_retried_after_one_refresh() {
        let dispatches = AtomicUsize::new(0);
        let refreshes = AtomicUsize::new(0);

        let result = Session::dispatch_with_refresh(
            || {
                let attempt = dispatches.fetch_add(1, Ordering::SeqCst);
                async move {
                    Ok(canned(if attempt == 0 {
                        StatusCode::UNAUTHORIZED
                    } else {
                        StatusCode::OK
                    }))
                }
            },
            || async {
                refreshes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(dispatches.load(Ordering::SeqCst), 2);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_rejection_surfaces_without_another_refresh() {
        let dispatches = AtomicUsize::new(0);
        let refreshes = AtomicUsize::new(0);

        let result = Session::dispatch_with_refresh(
            || {
                dispatches.fetch_add(1, Ordering::SeqCst);
                async { Ok(canned(StatusCode::UNAUTHORIZED)) }
            },
            || async {
                refreshes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Unauthenticated);
        assert_eq!(dispatches.load(Ordering::SeqCst), 2);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn accepted_request_never_refreshes() {
        let dispatches = AtomicUsize::new(0);
        let refreshes = AtomicUsize::new(0);

        let result = Session::dispatch_with_refresh(
            || {
                dispatches.fetch_add(1, Ordering::SeqCst);
                async { Ok(canned(StatusCode::OK)) }
            },
            || async {
                refreshes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(dispatches.load(Ordering::SeqCst), 1);
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_refresh_aborts_without_redispatching() {
        let dispatches = AtomicUsize::new(0);

        let result = Session::dispatch_with_refresh(
            || {
                dispatches.fetch_add(1, Ordering::SeqCst);
                async { Ok(canned(StatusCode::UNAUTHORIZED)) }
            },
            || async { Err(Error::unauthenticated("refresh token revoked")) },
        )
        .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Unauthenticated);
        assert_eq!(dispatches.load(Ordering::SeqCst), 1);
    }
}

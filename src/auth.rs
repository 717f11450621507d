//! Credential parsing and OAuth2 token provisioning
//!
//! Credentials arrive as raw bytes resolved from a ProviderConfig's Secret
//! and must form a JSON object with `client_id`/`client_secret`, optionally
//! overriding the token URL and audience. The [`TokenProvider`] owns one
//! cached token with its expiry and refreshes it ahead of time, so ticks
//! share a token without re-authenticating on every reconciliation and
//! without depending on process lifetime for correctness.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::{Error, DEFAULT_AUDIENCE, DEFAULT_TOKEN_URL};

/// Seconds of remaining token life below which a refresh is triggered
const REFRESH_SKEW_SECS: i64 = 60;

/// Console API credentials, parsed from resolved secret bytes
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// OAuth2 client id
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,

    /// Token endpoint override
    #[serde(default)]
    pub token_url: Option<String>,

    /// Audience override, doubling as the console API host
    #[serde(default)]
    pub audience: Option<String>,
}

impl Credentials {
    /// Parse credentials from raw secret bytes
    ///
    /// The bytes must form a JSON object carrying at least a non-empty
    /// `client_id` and `client_secret`.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let creds: Self = serde_json::from_slice(bytes).map_err(|e| {
            Error::malformed_credentials(format!("expected JSON credential object: {e}"))
        })?;
        if creds.client_id.is_empty() {
            return Err(Error::malformed_credentials("client_id must not be empty"));
        }
        if creds.client_secret.is_empty() {
            return Err(Error::malformed_credentials("client_secret must not be empty"));
        }
        Ok(creds)
    }

    /// Token endpoint to exchange against
    pub fn token_url(&self) -> &str {
        self.token_url.as_deref().unwrap_or(DEFAULT_TOKEN_URL)
    }

    /// Audience requested for issued tokens; also the console API host
    pub fn audience(&self) -> &str {
        self.audience.as_deref().unwrap_or(DEFAULT_AUDIENCE)
    }
}

/// A token as returned by one client-credentials exchange
#[derive(Clone, Debug, Deserialize)]
pub struct IssuedToken {
    /// Bearer token value
    pub access_token: String,

    /// Lifetime in seconds granted by the authorization server
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    300
}

/// Trait abstracting the OAuth2 client-credentials exchange
///
/// This trait allows counting and stubbing exchanges in tests while using
/// the HTTP implementation in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Perform one client-credentials exchange
    async fn exchange(&self, credentials: &Credentials) -> Result<IssuedToken, Error>;
}

/// Real exchanger posting the client-credentials form to the token endpoint
pub struct HttpTokenExchanger {
    http: reqwest::Client,
}

impl HttpTokenExchanger {
    /// Create a new HTTP exchanger
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTokenExchanger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(&self, credentials: &Credentials) -> Result<IssuedToken, Error> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("audience", credentials.audience()),
        ];

        let response = self
            .http
            .post(credentials.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::auth(format!("token exchange failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::auth(format!("token exchange failed: {e}")))?;
        if !status.is_success() {
            return Err(Error::auth(format!(
                "token exchange rejected: status={} body={}",
                status.as_u16(),
                body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::auth(format!("token response not understood: {e}")))
    }
}

/// One cached token with its computed expiry
#[derive(Clone, Debug)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_SKEW_SECS) < self.expires_at
    }
}

/// Expiry-aware token cache shared by all reconciliation units
///
/// Holds at most one token. Concurrent first access is serialized by the
/// mutex: a single exchange wins and every waiter reuses its result.
pub struct TokenProvider {
    exchanger: Arc<dyn TokenExchanger>,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create a token provider over the given exchanger
    pub fn new(exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self {
            exchanger,
            cache: Mutex::new(None),
        }
    }

    /// Return a bearer token, exchanging only when the cache is stale
    ///
    /// Exchange failures surface as [`Error::Auth`]; the controller harness
    /// provides backoff, no retry happens here.
    pub async fn access_token(&self, credentials: &Credentials) -> Result<String, Error> {
        let mut slot = self.cache.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.access_token.clone());
            }
            debug!("cached token near expiry, refreshing");
        }

        let issued = self.exchanger.exchange(credentials).await?;
        let expires_at = Utc::now() + Duration::seconds(issued.expires_in as i64);
        let cached = CachedToken {
            access_token: issued.access_token,
            expires_at,
        };
        let token = cached.access_token.clone();
        *slot = Some(cached);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_credentials() -> Credentials {
        Credentials {
            client_id: "cid".to_string(),
            client_secret: "shhh".to_string(),
            token_url: None,
            audience: None,
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn test_minimal_credential_object_parses_with_defaults() {
            let creds =
                Credentials::from_json_bytes(br#"{"client_id":"cid","client_secret":"shhh"}"#)
                    .unwrap();
            assert_eq!(creds.client_id, "cid");
            assert_eq!(creds.token_url(), DEFAULT_TOKEN_URL);
            assert_eq!(creds.audience(), DEFAULT_AUDIENCE);
        }

        #[test]
        fn test_overrides_win_over_defaults() {
            let creds = Credentials::from_json_bytes(
                br#"{
                    "client_id": "cid",
                    "client_secret": "shhh",
                    "token_url": "https://login.example.test/token",
                    "audience": "api.example.test"
                }"#,
            )
            .unwrap();
            assert_eq!(creds.token_url(), "https://login.example.test/token");
            assert_eq!(creds.audience(), "api.example.test");
        }

        #[test]
        fn test_non_json_bytes_are_malformed() {
            let err = Credentials::from_json_bytes(b"not json").unwrap_err();
            assert!(matches!(err, Error::MalformedCredentials(_)));
        }

        #[test]
        fn test_missing_client_secret_is_malformed() {
            let err = Credentials::from_json_bytes(br#"{"client_id":"cid"}"#).unwrap_err();
            assert!(matches!(err, Error::MalformedCredentials(_)));
        }

        #[test]
        fn test_empty_client_id_is_malformed() {
            let err =
                Credentials::from_json_bytes(br#"{"client_id":"","client_secret":"s"}"#)
                    .unwrap_err();
            assert!(matches!(err, Error::MalformedCredentials(_)));
        }
    }

    mod token_provider {
        use super::*;

        /// Exchanger stub that counts exchanges and issues tokens with a
        /// configurable lifetime.
        struct CountingExchanger {
            calls: AtomicUsize,
            expires_in: u64,
        }

        impl CountingExchanger {
            fn new(expires_in: u64) -> Self {
                Self {
                    calls: AtomicUsize::new(0),
                    expires_in,
                }
            }
        }

        #[async_trait]
        impl TokenExchanger for CountingExchanger {
            async fn exchange(&self, _credentials: &Credentials) -> Result<IssuedToken, Error> {
                let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(IssuedToken {
                    access_token: format!("token-{n}"),
                    expires_in: self.expires_in,
                })
            }
        }

        /// Story: within one process, repeated ticks share a single exchange
        ///
        /// Two sequential token requests with valid credentials must trigger
        /// exactly one exchange against the authorization server.
        #[tokio::test]
        async fn story_sequential_requests_share_one_exchange() {
            let exchanger = Arc::new(CountingExchanger::new(3600));
            let provider = TokenProvider::new(exchanger.clone());

            let first = provider.access_token(&sample_credentials()).await.unwrap();
            let second = provider.access_token(&sample_credentials()).await.unwrap();

            assert_eq!(first, "token-1");
            assert_eq!(second, "token-1");
            assert_eq!(exchanger.calls.load(Ordering::SeqCst), 1);
        }

        /// Story: a token at the end of its life is replaced, not served
        ///
        /// A token whose remaining life is inside the refresh margin must
        /// trigger a fresh exchange instead of being handed out stale.
        #[tokio::test]
        async fn story_expired_token_triggers_refresh() {
            // Lifetime shorter than the refresh skew: stale immediately.
            let exchanger = Arc::new(CountingExchanger::new(1));
            let provider = TokenProvider::new(exchanger.clone());

            let first = provider.access_token(&sample_credentials()).await.unwrap();
            let second = provider.access_token(&sample_credentials()).await.unwrap();

            assert_eq!(first, "token-1");
            assert_eq!(second, "token-2");
            assert_eq!(exchanger.calls.load(Ordering::SeqCst), 2);
        }

        /// Story: exchange rejection surfaces as an authentication failure
        #[tokio::test]
        async fn story_exchange_rejection_is_surfaced_not_retried() {
            let mut mock = MockTokenExchanger::new();
            mock.expect_exchange()
                .times(1)
                .returning(|_| Err(Error::auth("status=401 body=invalid_client")));

            let provider = TokenProvider::new(Arc::new(mock));
            let err = provider
                .access_token(&sample_credentials())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Auth(_)));
        }

        /// Story: concurrent first access yields one winner
        ///
        /// Reconciliation units for different records may race on the empty
        /// cache; the mutex serializes them so the winner's token is reused.
        #[tokio::test]
        async fn story_concurrent_first_access_has_single_winner() {
            let exchanger = Arc::new(CountingExchanger::new(3600));
            let provider = Arc::new(TokenProvider::new(exchanger.clone()));

            let a = {
                let provider = provider.clone();
                tokio::spawn(async move { provider.access_token(&sample_credentials()).await })
            };
            let b = {
                let provider = provider.clone();
                tokio::spawn(async move { provider.access_token(&sample_credentials()).await })
            };

            let a = a.await.unwrap().unwrap();
            let b = b.await.unwrap().unwrap();
            assert_eq!(a, b);
            assert_eq!(exchanger.calls.load(Ordering::SeqCst), 1);
        }
    }
}

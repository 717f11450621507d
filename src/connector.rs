//! Credential resolution and console handle construction
//!
//! `Connect` is the per-tick setup step: resolve the record's ProviderConfig
//! into raw credential bytes, obtain a bearer token from the shared
//! [`TokenProvider`], and hand back a console client bound to both. No
//! remote mutating call happens here, so it is safe on every tick.

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::auth::{Credentials, TokenProvider};
use crate::console::{Console, ConsoleApi};
use crate::crd::ProviderConfig;
use crate::Error;

/// Trait abstracting credential-reference resolution
///
/// This trait allows mocking credential lookup in tests while the real
/// implementation walks ProviderConfig → Secret → key.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialsResolver: Send + Sync {
    /// Resolve a ProviderConfig name into raw credential bytes
    async fn resolve(&self, provider_config: &str) -> Result<Vec<u8>, Error>;
}

/// Real resolver reading the ProviderConfig and its referenced Secret
pub struct SecretCredentialsResolver {
    client: Client,
}

impl SecretCredentialsResolver {
    /// Create a resolver over the given Kubernetes client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CredentialsResolver for SecretCredentialsResolver {
    async fn resolve(&self, provider_config: &str) -> Result<Vec<u8>, Error> {
        let configs: Api<ProviderConfig> = Api::all(self.client.clone());
        let config = configs.get(provider_config).await.map_err(|e| {
            Error::credentials(format!("providerconfig '{provider_config}': {e}"))
        })?;

        let selector = &config.spec.credentials.secret_ref;
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &selector.namespace);
        let secret = secrets.get(&selector.name).await.map_err(|e| {
            Error::credentials(format!(
                "secret '{}/{}': {e}",
                selector.namespace, selector.name
            ))
        })?;

        let data = secret.data.unwrap_or_default();
        let value = data.get(&selector.key).ok_or_else(|| {
            Error::credentials(format!(
                "secret '{}/{}' has no key '{}'",
                selector.namespace, selector.name, selector.key
            ))
        })?;

        Ok(value.0.clone())
    }
}

/// Trait abstracting the connect step for the controllers
///
/// This trait allows handing mocked console clients to reconcile tests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Connect: Send + Sync {
    /// Produce an authenticated console handle for the named ProviderConfig
    async fn connect(&self, provider_config: &str) -> Result<Arc<dyn ConsoleApi>, Error>;
}

/// Connector binding credential resolution to the shared token provider
pub struct Connector {
    resolver: Arc<dyn CredentialsResolver>,
    tokens: Arc<TokenProvider>,
}

impl Connector {
    /// Create a connector over a resolver and a shared token provider
    pub fn new(resolver: Arc<dyn CredentialsResolver>, tokens: Arc<TokenProvider>) -> Self {
        Self { resolver, tokens }
    }
}

#[async_trait]
impl Connect for Connector {
    async fn connect(&self, provider_config: &str) -> Result<Arc<dyn ConsoleApi>, Error> {
        let bytes = self.resolver.resolve(provider_config).await?;
        let credentials = Credentials::from_json_bytes(&bytes)?;
        let token = self.tokens.access_token(&credentials).await?;
        debug!(api_host = %credentials.audience(), "console handle ready");
        Ok(Arc::new(Console::new(credentials.audience(), token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IssuedToken, MockTokenExchanger};

    fn provider_with_stub_exchange() -> Arc<TokenProvider> {
        let mut exchanger = MockTokenExchanger::new();
        exchanger.expect_exchange().returning(|_| {
            Ok(IssuedToken {
                access_token: "tok".to_string(),
                expires_in: 3600,
            })
        });
        Arc::new(TokenProvider::new(Arc::new(exchanger)))
    }

    /// Story: a failed credential lookup fails the tick before any auth
    #[tokio::test]
    async fn story_resolution_failure_propagates() {
        let mut resolver = MockCredentialsResolver::new();
        resolver
            .expect_resolve()
            .returning(|name| Err(Error::credentials(format!("providerconfig '{name}' not found"))));

        let connector = Connector::new(Arc::new(resolver), provider_with_stub_exchange());
        let err = connector.connect("prod").await.err().unwrap();
        assert!(matches!(err, Error::Credentials(_)));
        assert!(err.to_string().contains("prod"));
    }

    /// Story: resolvable but garbled credentials are a distinct failure
    #[tokio::test]
    async fn story_malformed_credentials_propagate() {
        let mut resolver = MockCredentialsResolver::new();
        resolver
            .expect_resolve()
            .returning(|_| Ok(b"not json".to_vec()));

        let connector = Connector::new(Arc::new(resolver), provider_with_stub_exchange());
        let err = connector.connect("prod").await.err().unwrap();
        assert!(matches!(err, Error::MalformedCredentials(_)));
    }

    /// Story: connect produces a handle without touching managed resources
    #[tokio::test]
    async fn story_connect_yields_console_handle() {
        let mut resolver = MockCredentialsResolver::new();
        resolver
            .expect_resolve()
            .returning(|_| Ok(br#"{"client_id":"cid","client_secret":"shhh"}"#.to_vec()));

        let connector = Connector::new(Arc::new(resolver), provider_with_stub_exchange());
        assert!(connector.connect("prod").await.is_ok());
    }
}

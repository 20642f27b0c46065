use url::Url;

use crate::auth::{AuthScheme, BasicAuth, NegotiatedAuth};
use crate::client::EwsClient;
use crate::config::{Config, SharedLock};
use crate::transport::{self, ntlm, Exchange};
use crate::{Error, Result};

/// Builder for [`EwsClient`].
///
/// Keep this surface small and predictable: every option maps to one
/// configuration field, and the transport is constructed exactly once at
/// [`build`](Self::build).
pub struct EwsClientBuilder {
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
    auth: Option<Box<dyn AuthScheme>>,
    config: Config,
    exchanger: Option<Box<dyn Exchange>>,
}

impl EwsClientBuilder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: None,
            password: None,
            auth: None,
            config: Config::default(),
            exchanger: None,
        }
    }

    /// Set the account credentials. Used for Basic authentication by default,
    /// or for the NTLM handshake when negotiated auth is enabled.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Replace the whole configuration in one call.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Supply a custom authentication scheme instead of deriving one from the
    /// credentials.
    pub fn auth_scheme(mut self, scheme: Box<dyn AuthScheme>) -> Self {
        self.auth = Some(scheme);
        self
    }

    /// Emit full request/response dumps through `tracing`.
    pub fn dump_traffic(mut self, enable: bool) -> Self {
        self.config.dump_traffic = enable;
        self
    }

    /// Authenticate with the NTLM handshake. Forces a single-connection
    /// transport; combine with [`shared_lock`](Self::shared_lock) when
    /// several clients share one authentication state.
    pub fn negotiated_auth(mut self, enable: bool) -> Self {
        self.config.use_negotiated_auth = enable;
        self
    }

    /// Skip TLS certificate verification. Insecure; development only.
    pub fn skip_tls_verification(mut self, enable: bool) -> Self {
        self.config.skip_tls_verification = enable;
        self
    }

    /// Protocol version passed through to payload builders.
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.config.protocol_version = version.into();
        self
    }

    /// Borrow a caller-owned lock serializing exchanges across clients.
    pub fn shared_lock(mut self, lock: SharedLock) -> Self {
        self.config.shared_lock = Some(lock);
        self
    }

    /// Per-exchange timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Replace the HTTP exchange layer entirely.
    ///
    /// This is primarily for tests, which substitute a fake network. The
    /// serializing decorator is still applied on top when a shared lock is
    /// configured, so synchronization behavior stays observable.
    pub fn exchange_override(mut self, exchanger: Box<dyn Exchange>) -> Self {
        self.exchanger = Some(exchanger);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<EwsClient> {
        let endpoint: Url = self
            .endpoint
            .parse()
            .map_err(|e| Error::Configuration(format!("invalid endpoint URL: {e}")))?;

        let auth: Box<dyn AuthScheme> = match self.auth {
            Some(scheme) => scheme,
            None if self.config.use_negotiated_auth => Box::new(NegotiatedAuth),
            None => match (self.username.as_deref(), self.password.as_deref()) {
                (Some(username), Some(password)) => {
                    Box::new(BasicAuth::new(username, password))
                }
                _ => {
                    return Err(Error::Configuration(
                        "credentials are required unless an authentication scheme is supplied"
                            .into(),
                    ))
                }
            },
        };

        let ntlm_credentials = match (&self.username, &self.password) {
            (Some(username), Some(password)) if self.config.use_negotiated_auth => {
                Some(ntlm::Credentials {
                    username: username.clone(),
                    password: password.clone(),
                })
            }
            _ => None,
        };

        let inner = match self.exchanger {
            Some(exchanger) => exchanger,
            None => transport::build_exchanger(endpoint.clone(), ntlm_credentials, &self.config)?,
        };
        // Negotiated auth must never run unserialized; fall back to a
        // client-private lock when the caller did not supply a shared one.
        let lock = self
            .config
            .shared_lock
            .clone()
            .or_else(|| self.config.use_negotiated_auth.then(SharedLock::default));
        let exchanger = transport::with_serialization(inner, lock);

        Ok(EwsClient {
            endpoint,
            username: self.username.unwrap_or_default(),
            auth,
            config: self.config,
            exchanger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_endpoint() {
        let result = EwsClientBuilder::new("not a url")
            .credentials("user", "pass")
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn rejects_missing_credentials() {
        let result = EwsClientBuilder::new("https://mail.example.com/EWS/Exchange.asmx").build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn constructing_many_clients_has_no_global_effect() {
        // Protocol pinning and TLS policy are per-client construction
        // parameters; repeated construction must be independently valid.
        for _ in 0..2 {
            let client = EwsClientBuilder::new("https://mail.example.com/EWS/Exchange.asmx")
                .credentials("user@example.com", "secret")
                .skip_tls_verification(true)
                .build()
                .unwrap();
            assert_eq!(client.username(), "user@example.com");
        }
    }

    #[test]
    fn negotiated_auth_without_credentials_fails_at_build() {
        let result = EwsClientBuilder::new("https://mail.example.com/EWS/Exchange.asmx")
            .negotiated_auth(true)
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn negotiated_auth_with_credentials_builds() {
        let client = EwsClientBuilder::new("https://mail.example.com/EWS/Exchange.asmx")
            .credentials("CONTOSO\\alice", "secret")
            .negotiated_auth(true)
            .build()
            .unwrap();
        assert_eq!(client.username(), "CONTOSO\\alice");
    }
}

//! HTTP exchange layer.
//!
//! The [`Exchange`] trait is the seam between the envelope client and the
//! network: one buffered request in, one buffered response out. Concrete
//! layers compose as decorators:
//!
//! - [`HttpExchanger`] performs the actual POST over a `reqwest` client
//!   configured from `TransportSettings`;
//! - `NtlmExchanger` wraps it to run the NTLM negotiate/challenge/
//!   authenticate rounds transparently;
//! - [`SerializedExchanger`] gates execution through a caller-supplied lock
//!   so exchanges sharing one authentication state never interleave.
//!
//! Tests substitute their own [`Exchange`] implementation to exercise the
//! client without sockets.

pub(crate) mod ntlm;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{redirect, StatusCode};
use url::Url;

use crate::config::{Config, SharedLock};
use crate::Result;

// Pool width for header-per-request schemes, where connections are
// interchangeable. Negotiated auth overrides this to 1.
const DEFAULT_MAX_IDLE_PER_HOST: usize = 32;

/// A fully-materialized outgoing exchange: headers plus the enveloped body.
/// The target endpoint is a construction parameter of the exchanger.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The buffered result of an exchange.
#[derive(Debug, Clone)]
pub struct ExchangeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// One blocking HTTP round trip: request in, buffered response out.
///
/// Implementations must be safe to call from multiple tasks concurrently;
/// serialization, where required, is layered on top via
/// [`SerializedExchanger`].
#[async_trait]
pub trait Exchange: Send + Sync {
    async fn execute(&self, request: &ExchangeRequest) -> Result<ExchangeResponse>;
}

/// Transport construction parameters derived from [`Config`].
///
/// Derivation is a pure function so the constraints each configuration
/// implies can be verified without touching the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransportSettings {
    pub skip_tls_verification: bool,
    pub negotiated: bool,
    pub timeout: Duration,
}

impl TransportSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            skip_tls_verification: config.skip_tls_verification,
            negotiated: config.use_negotiated_auth,
            timeout: config.timeout,
        }
    }

    /// Idle-connection cap per host. NTLM pins handshake state to a single
    /// TCP connection, so negotiated mode keeps exactly one.
    pub fn max_idle_per_host(&self) -> usize {
        if self.negotiated {
            1
        } else {
            DEFAULT_MAX_IDLE_PER_HOST
        }
    }
}

/// The terminal exchanger: POSTs the enveloped body to the endpoint.
pub struct HttpExchanger {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpExchanger {
    pub(crate) fn new(endpoint: Url, settings: &TransportSettings) -> Result<Self> {
        // HTTP/2 multiplexing can silently migrate a logical exchange onto a
        // different underlying connection, which breaks connection-pinned
        // handshakes. Pin every transport to HTTP/1.1; the setting is
        // per-client, so repeated construction has no process-wide effect.
        let mut builder = reqwest::Client::builder()
            .http1_only()
            .redirect(redirect::Policy::none())
            .timeout(settings.timeout)
            .pool_max_idle_per_host(settings.max_idle_per_host());

        if settings.skip_tls_verification {
            // Development only: accepts any certificate, including
            // self-signed ones.
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }
}

#[async_trait]
impl Exchange for HttpExchanger {
    async fn execute(&self, request: &ExchangeRequest) -> Result<ExchangeResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ExchangeResponse {
            status,
            headers,
            body,
        })
    }
}

/// Decorator holding a caller-supplied lock for the full duration of the
/// underlying exchange.
///
/// Combined with the one-connection cap this guarantees that two logical
/// requests against the same negotiated-auth state never interleave at the
/// connection level. The guard is dropped on every exit path, error included.
pub struct SerializedExchanger {
    inner: Box<dyn Exchange>,
    lock: SharedLock,
}

impl SerializedExchanger {
    pub fn new(inner: Box<dyn Exchange>, lock: SharedLock) -> Self {
        Self { inner, lock }
    }
}

#[async_trait]
impl Exchange for SerializedExchanger {
    async fn execute(&self, request: &ExchangeRequest) -> Result<ExchangeResponse> {
        let _guard = self.lock.lock().await;
        self.inner.execute(request).await
    }
}

/// Builds the exchange stack a configuration calls for, NTLM adapter
/// included. Serialization is composed separately via [`with_serialization`]
/// so test-injected exchangers get the same treatment.
pub(crate) fn build_exchanger(
    endpoint: Url,
    credentials: Option<ntlm::Credentials>,
    config: &Config,
) -> Result<Box<dyn Exchange>> {
    let settings = TransportSettings::from_config(config);
    let http = HttpExchanger::new(endpoint, &settings)?;

    if settings.negotiated {
        let credentials = credentials.ok_or_else(|| {
            crate::Error::Configuration(
                "negotiated authentication requires a username and password".into(),
            )
        })?;
        Ok(Box::new(ntlm::NtlmExchanger::new(
            Box::new(http),
            credentials,
        )))
    } else {
        Ok(Box::new(http))
    }
}

/// Wraps an exchanger in the serializing decorator when a lock was supplied.
pub(crate) fn with_serialization(
    inner: Box<dyn Exchange>,
    lock: Option<SharedLock>,
) -> Box<dyn Exchange> {
    match lock {
        Some(lock) => Box::new(SerializedExchanger::new(inner, lock)),
        None => inner,
    }
}

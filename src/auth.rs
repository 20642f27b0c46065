//! Authentication scheme abstraction.
//!
//! A scheme annotates the outgoing request with whatever headers its
//! mechanism needs; it is chosen at client construction and invoked exactly
//! once per exchange, before any network I/O. Multi-round schemes like NTLM
//! attach nothing here; their handshake lives inside the transport layer,
//! invisible to the envelope client.

use std::fmt;

use base64::prelude::{Engine, BASE64_STANDARD};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::{Error, Result};

/// Per-request authentication capability.
///
/// Object-safe and verb-agnostic so new schemes (token, certificate-bound)
/// slot in without touching the envelope client.
pub trait AuthScheme: Send + Sync + fmt::Debug {
    /// Attach this scheme's headers to an outgoing request.
    fn attach(&self, headers: &mut HeaderMap) -> Result<()>;
}

/// HTTP Basic authentication from a fixed username/password pair.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AuthScheme for BasicAuth {
    fn attach(&self, headers: &mut HeaderMap) -> Result<()> {
        let token = BASE64_STANDARD.encode(format!("{}:{}", self.username, self.password));
        let mut value = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|_| Error::Configuration("credentials contain invalid bytes".into()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Bearer-token authentication (e.g. OAuth2 access tokens).
#[derive(Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl AuthScheme for BearerAuth {
    fn attach(&self, headers: &mut HeaderMap) -> Result<()> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| Error::Configuration("token contains invalid bytes".into()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// NTLM (negotiated) authentication.
///
/// Attaches no headers: the multi-round handshake is performed by the
/// transport's negotiating adapter, which owns the connection the handshake
/// state is pinned to.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegotiatedAuth;

impl AuthScheme for NegotiatedAuth {
    fn attach(&self, _headers: &mut HeaderMap) -> Result<()> {
        Ok(())
    }
}

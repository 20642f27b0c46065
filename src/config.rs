//! Client configuration.

use std::sync::Arc;
use std::time::Duration;

/// A lock handle shared across clients whose exchanges must never interleave.
///
/// Ownership stays with the caller; each client only borrows the lock for the
/// duration of a single exchange. Required when several client instances share
/// one NTLM authentication state.
pub type SharedLock = Arc<tokio::sync::Mutex<()>>;

/// Exchange protocol version announced to payload builders.
pub const DEFAULT_PROTOCOL_VERSION: &str = "Exchange2013_SP1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration, read-only after construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Emit full request/response dumps (headers + body) through `tracing`.
    /// Observability only; never changes exchange behavior.
    pub dump_traffic: bool,

    /// Authenticate with the NTLM handshake instead of a per-request header
    /// scheme. Forces single-connection transport and serialized execution.
    pub use_negotiated_auth: bool,

    /// Skip TLS certificate verification entirely.
    ///
    /// Insecure: accepts any certificate, including self-signed ones. Only
    /// for development against test servers.
    pub skip_tls_verification: bool,

    /// Protocol version passed through to payload builders. Not interpreted
    /// by the transport core.
    pub protocol_version: String,

    /// Caller-owned lock serializing exchanges across clients that share
    /// authentication state.
    pub shared_lock: Option<SharedLock>,

    /// Per-exchange timeout covering connect, write, and read.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dump_traffic: false,
            use_negotiated_auth: false,
            skip_tls_verification: false,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            shared_lock: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_safe() {
        let config = Config::default();
        assert!(!config.dump_traffic);
        assert!(!config.use_negotiated_auth);
        assert!(!config.skip_tls_verification);
        assert_eq!(config.protocol_version, "Exchange2013_SP1");
        assert!(config.shared_lock.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}

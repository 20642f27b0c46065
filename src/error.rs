use thiserror::Error;

/// Unified error type for the EWS client.
///
/// The three failure layers of an exchange are kept distinct so callers can
/// react to each one differently:
///
/// - [`Error::Transport`]: the HTTP exchange itself failed (DNS, connect,
///   TLS, timeout). Nothing reached the application protocol.
/// - [`Error::Http`]: the server answered with a non-200 status. The raw
///   response body is preserved since it may carry diagnostic XML.
/// - [`Error::Fault`]: the server answered 200, but the response message
///   inside the envelope reported a non-`Success` response class. Produced by
///   the operation layer, never by the envelope client.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection, DNS, TLS, or request-construction failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server responded with a status other than 200 OK.
    ///
    /// The body is surfaced as-is; 4xx and 5xx are not distinguished here and
    /// redirects are never followed, so 3xx responses also land in this
    /// variant.
    #[error("HTTP status {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP 200, but the embedded response class was `Warning` or `Error`.
    ///
    /// `message` is the fault text reported by the server, verbatim.
    #[error("operation failed: {message}")]
    Fault {
        code: Option<String>,
        message: String,
    },

    /// XML serialization or deserialization failure.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// The NTLM handshake could not be completed (e.g. malformed challenge).
    #[error("authentication negotiation failed: {0}")]
    Negotiation(String),

    /// Invalid client construction parameters.
    #[error("configuration error: {0}")]
    Configuration(String),
}

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use url::Url;

use crate::auth::AuthScheme;
use crate::config::Config;
use crate::transport::{Exchange, ExchangeRequest};
use crate::{dump, envelope, Error, Result};

/// A client for one EWS endpoint.
///
/// Construction fixes the endpoint, identity, authentication scheme, and
/// transport for the client's lifetime; each exchange is independent and the
/// client holds no per-exchange state, so one instance can serve many
/// concurrent callers.
pub struct EwsClient {
    pub(crate) endpoint: Url,
    pub(crate) username: String,
    pub(crate) auth: Box<dyn AuthScheme>,
    pub(crate) config: Config,
    pub(crate) exchanger: Box<dyn Exchange>,
}

impl EwsClient {
    /// Starts building a client for the given endpoint URL.
    pub fn builder(endpoint: impl Into<String>) -> super::EwsClientBuilder {
        super::EwsClientBuilder::new(endpoint)
    }

    /// Convenience constructor for the common username/password case.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        config: Config,
    ) -> Result<Self> {
        Self::builder(endpoint)
            .credentials(username, password)
            .config(config)
            .build()
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The mailbox identity associated with this client. Diagnostic only.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Protocol version to announce in payloads that carry one.
    pub fn protocol_version(&self) -> &str {
        &self.config.protocol_version
    }

    /// Sends an operation payload and returns the raw response envelope.
    ///
    /// The payload is wrapped in the SOAP envelope, annotated by the
    /// authentication scheme, and POSTed as `text/xml`. Redirects are not
    /// followed. A non-200 status yields [`Error::Http`] with the raw body
    /// preserved; on 200 the envelope comes back unparsed, since unwrapping
    /// and response classification belong to the operation layer.
    pub async fn send_and_receive(&self, payload: &[u8]) -> Result<Bytes> {
        let document = envelope::wrap(payload);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/xml"));
        self.auth.attach(&mut headers)?;

        let request = ExchangeRequest {
            headers,
            body: Bytes::from(document),
        };
        if self.config.dump_traffic {
            dump::request(self.endpoint.as_str(), &request);
        }

        let response = self.exchanger.execute(&request).await?;
        if self.config.dump_traffic {
            dump::response(&response);
        }

        if response.status != StatusCode::OK {
            return Err(Error::Http {
                status: response.status.as_u16(),
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        Ok(response.body)
    }
}

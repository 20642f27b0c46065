//! # ews-client
//!
//! A client runtime for Exchange Web Services (EWS), the XML-over-HTTP
//! (SOAP-style) RPC protocol spoken by Exchange mail/calendar servers.
//!
//! ## Overview
//!
//! The crate centers on a single request/response primitive:
//! [`EwsClient::send_and_receive`] wraps a caller-supplied operation payload
//! in the SOAP envelope, POSTs it to the configured endpoint with the chosen
//! authentication scheme attached, and classifies the outcome into three
//! distinct failure layers (transport, HTTP, and protocol-level application
//! faults) so callers always know which layer failed.
//!
//! Typed operations are thin layers over that primitive;
//! [`FindItem`](EwsClient::find_item) is implemented as the reference
//! operation.
//!
//! ## Key Features
//!
//! - **Pluggable authentication**: [`auth::AuthScheme`] with Basic, Bearer,
//!   and NTLM (negotiated) variants; new schemes slot in without touching the
//!   envelope client.
//! - **NTLM connection affinity**: negotiated authentication pins handshake
//!   state to one TCP connection. The transport caps the connection pool at
//!   one idle connection per host, pins the protocol to HTTP/1.1, and an
//!   optional caller-supplied lock serializes exchanges across clients that
//!   share authentication state.
//! - **Three-tier error classification**: [`Error::Transport`],
//!   [`Error::Http`], and [`Error::Fault`] are never conflated.
//! - **Traffic dump**: opt-in full request/response dumps through `tracing`
//!   for protocol debugging; never alters exchange behavior.
//! - **Test-injectable transport**: the exchange layer is a trait
//!   ([`transport::Exchange`]), so tests substitute a fake network without
//!   touching sockets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ews_client::{EwsClient, FindItemRequest};
//!
//! #[tokio::main]
//! async fn main() -> ews_client::Result<()> {
//!     let client = EwsClient::builder("https://mail.example.com/EWS/Exchange.asmx")
//!         .credentials("user@example.com", "password")
//!         .build()?;
//!
//!     let request = FindItemRequest::default();
//!     let response = client.find_item(&request).await?;
//!     for item in response.messages() {
//!         println!("{}: {}", item.item_id.id, item.subject);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client construction and the envelope send/receive primitive |
//! | [`auth`] | Authentication scheme abstraction and variants |
//! | [`transport`] | HTTP exchange layer, NTLM handshake adapter, serialization |
//! | [`envelope`] | SOAP envelope wrapping/unwrapping |
//! | [`operations`] | Typed EWS operations and response classification |

pub mod auth;
pub mod client;
pub mod config;
mod dump;
pub mod envelope;
pub mod operations;
pub mod transport;

// Re-export main types for convenience
pub use client::{EwsClient, EwsClientBuilder};
pub use config::{Config, SharedLock};
pub use operations::find_item::{
    FindItemRequest, FindItemResponse, ItemShape, ParentFolderIds, Restriction,
};
pub use operations::ResponseClass;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::Error;

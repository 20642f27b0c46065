//! SOAP envelope wrapping and unwrapping.
//!
//! Every EWS request body is wrapped between a fixed envelope prologue and
//! epilogue carrying the namespace declarations the server expects; every
//! response is an envelope whose `Body` holds the operation response. The
//! namespace URIs are pinned to the 2006 Exchange schema revision, which all
//! supported protocol versions share.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::Result;

/// Envelope prologue: XML declaration, `soap:Envelope` open tag with the
/// instance, messages, types, and SOAP envelope namespaces, and `soap:Body`.
pub const ENVELOPE_START: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages" xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types" xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
<soap:Body>
"#;

/// Envelope epilogue closing `soap:Body` and `soap:Envelope`.
pub const ENVELOPE_END: &str = "
</soap:Body>
</soap:Envelope>";

/// Wraps an operation payload in the SOAP envelope.
pub fn wrap(payload: &[u8]) -> Vec<u8> {
    let mut document =
        Vec::with_capacity(ENVELOPE_START.len() + payload.len() + ENVELOPE_END.len());
    document.extend_from_slice(ENVELOPE_START.as_bytes());
    document.extend_from_slice(payload);
    document.extend_from_slice(ENVELOPE_END.as_bytes());
    document
}

/// Strips the fixed envelope from a document produced by [`wrap`].
///
/// Returns `None` if the document does not carry exactly this envelope.
/// Server responses use their own prefixes and attribute order; parse those
/// with [`parse_response_body`] instead.
pub fn unwrap(document: &[u8]) -> Option<&[u8]> {
    document
        .strip_prefix(ENVELOPE_START.as_bytes())?
        .strip_suffix(ENVELOPE_END.as_bytes())
}

#[derive(Deserialize)]
struct ResponseEnvelope<T> {
    #[serde(rename = "Body", alias = "s:Body", alias = "soap:Body")]
    body: ResponseBody<T>,
}

#[derive(Deserialize)]
struct ResponseBody<T> {
    #[serde(rename = "$value")]
    inner: T,
}

/// Deserializes the single operation response held in a response envelope.
///
/// The element and attribute names inside are matched by the target type;
/// the envelope and body tags are matched by local name so that both
/// prefixed (`s:Envelope`) and unprefixed documents parse.
pub fn parse_response_body<T: DeserializeOwned>(document: &[u8]) -> Result<T> {
    let envelope: ResponseEnvelope<T> = quick_xml::de::from_reader(document)?;
    Ok(envelope.body.inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_then_unwrap_is_identity() {
        let payload = b"<m:FindItem Traversal=\"Shallow\"/>";
        let document = wrap(payload);
        assert_eq!(unwrap(&document), Some(payload.as_slice()));
    }

    #[test]
    fn wrap_declares_required_namespaces() {
        let document = wrap(b"<x/>");
        let text = String::from_utf8(document).unwrap();
        for uri in [
            "http://www.w3.org/2001/XMLSchema-instance",
            "http://schemas.microsoft.com/exchange/services/2006/messages",
            "http://schemas.microsoft.com/exchange/services/2006/types",
            "http://schemas.xmlsoap.org/soap/envelope/",
        ] {
            assert!(text.contains(uri), "missing namespace {uri}");
        }
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\" ?>"));
        assert!(text.ends_with("</soap:Envelope>"));
    }

    #[test]
    fn unwrap_rejects_foreign_documents() {
        assert_eq!(unwrap(b"<html>not soap</html>"), None);
        assert_eq!(unwrap(b""), None);
    }

    #[test]
    fn parse_response_body_accepts_prefixed_envelope() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Probe {
            #[serde(rename = "Value", alias = "m:Value")]
            value: String,
        }

        let prefixed = r#"<?xml version="1.0"?>
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
              <s:Header><t:ServerVersionInfo/></s:Header>
              <s:Body><m:Probe><m:Value>ok</m:Value></m:Probe></s:Body>
            </s:Envelope>"#;
        let probe: Probe = parse_response_body(prefixed.as_bytes()).unwrap();
        assert_eq!(probe.value, "ok");

        let unprefixed = r#"<Envelope><Body><Probe><Value>ok</Value></Probe></Body></Envelope>"#;
        let probe: Probe = parse_response_body(unprefixed.as_bytes()).unwrap();
        assert_eq!(probe.value, "ok");
    }
}

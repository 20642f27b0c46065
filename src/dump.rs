//! Wire-traffic dumps. Human-oriented debugging text, not a stable format.

use crate::transport::{ExchangeRequest, ExchangeResponse};

pub(crate) fn format_request(endpoint: &str, request: &ExchangeRequest) -> String {
    let mut text = format!("POST {endpoint}\n");
    for (name, value) in request.headers.iter() {
        text.push_str(name.as_str());
        text.push_str(": ");
        text.push_str(value.to_str().unwrap_or("<binary>"));
        text.push('\n');
    }
    text.push('\n');
    text.push_str(&String::from_utf8_lossy(&request.body));
    text
}

pub(crate) fn format_response(response: &ExchangeResponse) -> String {
    let mut text = format!("HTTP {}\n", response.status);
    for (name, value) in response.headers.iter() {
        text.push_str(name.as_str());
        text.push_str(": ");
        text.push_str(value.to_str().unwrap_or("<binary>"));
        text.push('\n');
    }
    text.push('\n');
    text.push_str(&String::from_utf8_lossy(&response.body));
    text
}

pub(crate) fn request(endpoint: &str, request: &ExchangeRequest) {
    tracing::info!(
        target: "ews_client::dump",
        "request:\n{}\n----",
        format_request(endpoint, request)
    );
}

pub(crate) fn response(response: &ExchangeResponse) {
    tracing::info!(
        target: "ews_client::dump",
        "response:\n{}\n----",
        format_response(response)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use reqwest::StatusCode;

    #[test]
    fn request_dump_carries_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/xml"));
        let request = ExchangeRequest {
            headers,
            body: Bytes::from_static(b"<soap:Envelope/>"),
        };
        let text = format_request("https://mail.example.com/EWS/Exchange.asmx", &request);
        assert!(text.starts_with("POST https://mail.example.com/EWS/Exchange.asmx\n"));
        assert!(text.contains("content-type: text/xml"));
        assert!(text.ends_with("<soap:Envelope/>"));
    }

    #[test]
    fn response_dump_carries_status_and_body() {
        let response = ExchangeResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"<fault/>"),
        };
        let text = format_response(&response);
        assert!(text.starts_with("HTTP 500"));
        assert!(text.ends_with("<fault/>"));
    }
}

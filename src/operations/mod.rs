//! Typed EWS operations.
//!
//! Operations are thin layers over [`EwsClient::send_and_receive`]: they
//! serialize a typed request to XML, send it, deserialize the response
//! envelope, and classify the per-message response class. Everything other
//! than `Success` surfaces as [`Error::Fault`] carrying the server's own
//! fault text.
//!
//! [`EwsClient::send_and_receive`]: crate::EwsClient::send_and_receive
//! [`Error::Fault`]: crate::Error::Fault

pub mod find_item;

use serde::Deserialize;

use crate::{Error, Result};

/// Per-message outcome marker inside a successful HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ResponseClass {
    Success,
    Warning,
    Error,
}

/// Maps a response message's class and fault fields onto the crate result.
pub(crate) fn classify(
    class: ResponseClass,
    code: Option<&str>,
    message: Option<&str>,
) -> Result<()> {
    match class {
        ResponseClass::Success => Ok(()),
        ResponseClass::Warning | ResponseClass::Error => Err(Error::Fault {
            code: code.map(str::to_owned),
            message: message.unwrap_or_default().to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_classifies_as_ok() {
        assert!(classify(ResponseClass::Success, None, None).is_ok());
    }

    #[test]
    fn warning_and_error_surface_fault_text() {
        for class in [ResponseClass::Warning, ResponseClass::Error] {
            let result = classify(class, Some("ErrorNonExistentMailbox"), Some("Mailbox not found"));
            match result {
                Err(Error::Fault { code, message }) => {
                    assert_eq!(code.as_deref(), Some("ErrorNonExistentMailbox"));
                    assert_eq!(message, "Mailbox not found");
                }
                other => panic!("expected Fault, got {other:?}"),
            }
        }
    }
}

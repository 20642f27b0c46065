//! NTLM handshake adapter.
//!
//! Implements the three-message NTLMv2 exchange described in MS-NLMP
//! (<https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-nlmp>):
//! the client opens with a Negotiate message, the server answers 401 with a
//! Challenge, and the client replies with an Authenticate message proving
//! knowledge of the password. The proof chain is MD4 for the NT one-way
//! function and HMAC-MD5 over the challenge/nonce/target-info blob.
//!
//! The handshake authenticates the *connection*, not the request: the
//! adapter must run against a transport holding a single connection to the
//! host, with execution serialized so no other exchange interleaves.

use async_trait::async_trait;
use base64::prelude::{Engine, BASE64_STANDARD};
use hmac::{Hmac, Mac};
use md4::{Digest, Md4};
use md5::Md5;
use reqwest::header::{HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{Exchange, ExchangeRequest, ExchangeResponse};
use crate::{Error, Result};

const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";
const MESSAGE_NEGOTIATE: u32 = 1;
const MESSAGE_CHALLENGE: u32 = 2;
const MESSAGE_AUTHENTICATE: u32 = 3;

const NEGOTIATE_UNICODE: u32 = 0x0000_0001;
const NEGOTIATE_OEM: u32 = 0x0000_0002;
const REQUEST_TARGET: u32 = 0x0000_0004;
const NEGOTIATE_NTLM: u32 = 0x0000_0200;
const NEGOTIATE_ALWAYS_SIGN: u32 = 0x0000_8000;
const NEGOTIATE_EXTENDED_SESSION_SECURITY: u32 = 0x0008_0000;

// Seconds between the Windows epoch (1601) and the Unix epoch (1970).
const FILETIME_UNIX_OFFSET_SECS: u64 = 11_644_473_600;

/// Account credentials for the handshake. `DOMAIN\user` names carry the
/// domain explicitly; UPN names (`user@example.com`) leave it empty.
#[derive(Clone)]
pub(crate) struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    fn split_account(&self) -> (&str, &str) {
        match self.username.split_once('\\') {
            Some((domain, user)) => (domain, user),
            None => ("", self.username.as_str()),
        }
    }
}

/// Fields extracted from a server Challenge message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Challenge {
    pub server_challenge: [u8; 8],
    pub target_info: Vec<u8>,
    pub flags: u32,
}

impl Challenge {
    /// Parses a decoded Challenge message, tolerating servers that omit the
    /// trailing target-info block.
    pub fn parse(message: &[u8]) -> Result<Self> {
        if message.len() < 32 || &message[0..8] != SIGNATURE {
            return Err(Error::Negotiation("malformed challenge message".into()));
        }
        if read_u32(message, 8) != MESSAGE_CHALLENGE {
            return Err(Error::Negotiation(
                "expected a challenge message from the server".into(),
            ));
        }

        let mut server_challenge = [0u8; 8];
        server_challenge.copy_from_slice(&message[24..32]);
        let flags = read_u32(message, 20);

        let target_info = if message.len() >= 48 {
            let len = read_u16(message, 40) as usize;
            let offset = read_u32(message, 44) as usize;
            match message.get(offset..offset + len) {
                Some(info) => info.to_vec(),
                None => {
                    return Err(Error::Negotiation(
                        "challenge target info lies outside the message".into(),
                    ))
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            server_challenge,
            target_info,
            flags,
        })
    }
}

/// Builds the opening Negotiate message (type 1).
pub(crate) fn negotiate_message() -> Vec<u8> {
    let flags = NEGOTIATE_UNICODE
        | NEGOTIATE_OEM
        | REQUEST_TARGET
        | NEGOTIATE_NTLM
        | NEGOTIATE_ALWAYS_SIGN
        | NEGOTIATE_EXTENDED_SESSION_SECURITY;

    let mut message = Vec::with_capacity(32);
    message.extend_from_slice(SIGNATURE);
    message.extend_from_slice(&MESSAGE_NEGOTIATE.to_le_bytes());
    message.extend_from_slice(&flags.to_le_bytes());
    // Empty domain and workstation fields, both pointing past the header.
    put_field(&mut message, 0, 32);
    put_field(&mut message, 0, 32);
    message
}

/// Builds the closing Authenticate message (type 3) carrying the NTLMv2
/// responses. The nonce and timestamp are injected so the construction is
/// deterministic under test.
pub(crate) fn authenticate_message(
    credentials: &Credentials,
    challenge: &Challenge,
    client_nonce: [u8; 8],
    timestamp: u64,
) -> Vec<u8> {
    let (domain, user) = credentials.split_account();

    let nt_hash = Md4::digest(utf16le(&credentials.password));
    let mut identity = user.to_uppercase();
    identity.push_str(domain);
    let ntlmv2_key = hmac_md5(nt_hash.as_slice(), &utf16le(&identity));

    // The "temp" blob: version marker, timestamp, client nonce, target info.
    let mut blob = Vec::with_capacity(28 + challenge.target_info.len());
    blob.extend_from_slice(&[0x01, 0x01, 0x00, 0x00]);
    blob.extend_from_slice(&[0u8; 4]);
    blob.extend_from_slice(&timestamp.to_le_bytes());
    blob.extend_from_slice(&client_nonce);
    blob.extend_from_slice(&[0u8; 4]);
    blob.extend_from_slice(&challenge.target_info);
    blob.extend_from_slice(&[0u8; 4]);

    let mut proof_input = Vec::with_capacity(8 + blob.len());
    proof_input.extend_from_slice(&challenge.server_challenge);
    proof_input.extend_from_slice(&blob);
    let nt_proof = hmac_md5(&ntlmv2_key, &proof_input);

    let mut nt_response = Vec::with_capacity(16 + blob.len());
    nt_response.extend_from_slice(&nt_proof);
    nt_response.extend_from_slice(&blob);

    let mut lm_input = [0u8; 16];
    lm_input[..8].copy_from_slice(&challenge.server_challenge);
    lm_input[8..].copy_from_slice(&client_nonce);
    let mut lm_response = Vec::with_capacity(24);
    lm_response.extend_from_slice(&hmac_md5(&ntlmv2_key, &lm_input));
    lm_response.extend_from_slice(&client_nonce);

    let domain_bytes = utf16le(domain);
    let user_bytes = utf16le(user);
    let workstation_bytes: Vec<u8> = Vec::new();

    // Header: signature, type, six payload fields, flags.
    const HEADER_LEN: usize = 64;
    let domain_offset = HEADER_LEN;
    let user_offset = domain_offset + domain_bytes.len();
    let workstation_offset = user_offset + user_bytes.len();
    let lm_offset = workstation_offset + workstation_bytes.len();
    let nt_offset = lm_offset + lm_response.len();
    let total_len = nt_offset + nt_response.len();

    let mut flags =
        NEGOTIATE_UNICODE | REQUEST_TARGET | NEGOTIATE_NTLM | NEGOTIATE_ALWAYS_SIGN;
    if challenge.flags & NEGOTIATE_EXTENDED_SESSION_SECURITY != 0 {
        flags |= NEGOTIATE_EXTENDED_SESSION_SECURITY;
    }

    let mut message = Vec::with_capacity(total_len);
    message.extend_from_slice(SIGNATURE);
    message.extend_from_slice(&MESSAGE_AUTHENTICATE.to_le_bytes());
    put_field(&mut message, lm_response.len(), lm_offset);
    put_field(&mut message, nt_response.len(), nt_offset);
    put_field(&mut message, domain_bytes.len(), domain_offset);
    put_field(&mut message, user_bytes.len(), user_offset);
    put_field(&mut message, workstation_bytes.len(), workstation_offset);
    put_field(&mut message, 0, total_len);
    message.extend_from_slice(&flags.to_le_bytes());
    message.extend_from_slice(&domain_bytes);
    message.extend_from_slice(&user_bytes);
    message.extend_from_slice(&workstation_bytes);
    message.extend_from_slice(&lm_response);
    message.extend_from_slice(&nt_response);
    message
}

/// Current time as a Windows FILETIME (100 ns ticks since 1601).
fn filetime_now() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now.as_secs() + FILETIME_UNIX_OFFSET_SECS) * 10_000_000 + u64::from(now.subsec_nanos() / 100)
}

fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn hmac_md5(key: &[u8], data: &[u8]) -> [u8; 16] {
    let mut mac =
        Hmac::<Md5>::new_from_slice(key).expect("HMAC-MD5 accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

fn put_field(message: &mut Vec<u8>, len: usize, offset: usize) {
    message.extend_from_slice(&(len as u16).to_le_bytes());
    message.extend_from_slice(&(len as u16).to_le_bytes());
    message.extend_from_slice(&(offset as u32).to_le_bytes());
}

fn read_u16(message: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([message[offset], message[offset + 1]])
}

fn read_u32(message: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        message[offset],
        message[offset + 1],
        message[offset + 2],
        message[offset + 3],
    ])
}

fn auth_header(message: &[u8]) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("NTLM {}", BASE64_STANDARD.encode(message)))
        .map_err(|_| Error::Negotiation("handshake token is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Extracts the server's handshake token from a 401 response, accepting both
/// the `NTLM` and `Negotiate` scheme names.
fn challenge_token(response: &ExchangeResponse) -> Option<&str> {
    for value in response.headers.get_all(WWW_AUTHENTICATE) {
        let Ok(text) = value.to_str() else { continue };
        let text = text.trim();
        for scheme in ["NTLM ", "Negotiate "] {
            if let Some(token) = text.strip_prefix(scheme) {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token);
                }
            }
        }
    }
    None
}

/// Decorator running the NTLM rounds around the wrapped exchanger.
///
/// If the server does not answer the opening message with a challenge, its
/// response is returned untouched; classification stays with the caller.
pub(crate) struct NtlmExchanger {
    inner: Box<dyn Exchange>,
    credentials: Credentials,
}

impl NtlmExchanger {
    pub fn new(inner: Box<dyn Exchange>, credentials: Credentials) -> Self {
        Self { inner, credentials }
    }
}

#[async_trait]
impl Exchange for NtlmExchanger {
    async fn execute(&self, request: &ExchangeRequest) -> Result<ExchangeResponse> {
        let mut headers = request.headers.clone();
        headers.insert(AUTHORIZATION, auth_header(&negotiate_message())?);
        let opening = ExchangeRequest {
            headers,
            body: request.body.clone(),
        };
        let response = self.inner.execute(&opening).await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let Some(token) = challenge_token(&response) else {
            return Ok(response);
        };
        let decoded = BASE64_STANDARD
            .decode(token)
            .map_err(|e| Error::Negotiation(format!("challenge is not valid base64: {e}")))?;
        let challenge = Challenge::parse(&decoded)?;

        let authenticate = authenticate_message(
            &self.credentials,
            &challenge,
            rand::random(),
            filetime_now(),
        );
        let mut headers = request.headers.clone();
        headers.insert(AUTHORIZATION, auth_header(&authenticate)?);
        let closing = ExchangeRequest {
            headers,
            body: request.body.clone(),
        };
        self.inner.execute(&closing).await
    }
}

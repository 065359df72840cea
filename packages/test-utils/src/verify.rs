//! Server-side signature verification, written independently of the SDK
//! so tests catch drift between the two sides.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::DateTime;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Outcome of checking one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid,
    Rejected(String),
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }
}

/// Parsed `Authorization: TourCMS {channel}:{marketplace}:{signature}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    pub channel: u64,
    pub marketplace_id: i64,
    pub signature: String,
}

impl AuthorizationHeader {
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.strip_prefix("TourCMS ")?;
        let mut parts = rest.splitn(3, ':');
        Some(Self {
            channel: parts.next()?.parse().ok()?,
            marketplace_id: parts.next()?.parse().ok()?,
            signature: parts.next()?.to_string(),
        })
    }
}

/// Recompute the signature the way the TourCMS server does.
pub fn expected_signature(
    channel: u64,
    marketplace_id: i64,
    method: &str,
    timestamp: i64,
    path_with_query: &str,
    private_key: &[u8],
) -> String {
    let string_to_sign = format!("{channel}/{marketplace_id}/{method}/{timestamp}{path_with_query}");
    let mut mac =
        Hmac::<Sha256>::new_from_slice(private_key).expect("HMAC can take key of any size");
    mac.update(string_to_sign.trim().as_bytes());
    let b64 = BASE64.encode(mac.finalize().into_bytes());

    let escaped: String = url::form_urlencoded::byte_serialize(b64.as_bytes()).collect();
    escaped.replace('+', "%20")
}

/// Check a received request against the account's credentials.
///
/// `now` is the server clock in unix seconds; dates further than
/// `tolerance_secs` away are rejected.
#[allow(clippy::too_many_arguments)]
pub fn verify_request(
    marketplace_id: i64,
    private_key: &[u8],
    method: &str,
    path_with_query: &str,
    authorization: Option<&str>,
    date: Option<&str>,
    now: i64,
    tolerance_secs: i64,
) -> Verification {
    let Some(auth) = authorization.and_then(AuthorizationHeader::parse) else {
        return Verification::Rejected("missing or malformed Authorization header".to_string());
    };
    if auth.marketplace_id != marketplace_id {
        return Verification::Rejected(format!("unknown marketplace {}", auth.marketplace_id));
    }

    let Some(timestamp) = date
        .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
        .map(|d| d.timestamp())
    else {
        return Verification::Rejected("missing or malformed Date header".to_string());
    };
    if (now - timestamp).abs() > tolerance_secs {
        return Verification::Rejected(format!("Date is {}s away from server time", now - timestamp));
    }

    let expected = expected_signature(
        auth.channel,
        marketplace_id,
        method,
        timestamp,
        path_with_query,
        private_key,
    );
    if expected == auth.signature {
        Verification::Valid
    } else {
        Verification::Rejected("signature mismatch".to_string())
    }
}

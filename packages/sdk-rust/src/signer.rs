//! TourCMS request signing
//!
//! The server recomputes the signature from the request line, the `Date`
//! header and the `Authorization` header, so every byte of the canonical
//! string has to match what goes out on the wire:
//!
//! 1. `"{channel}/{marketplace_id}/{verb}/{timestamp}{path_with_query}"`, trimmed
//! 2. HMAC-SHA256 keyed by the private key
//! 3. standard Base64 of the raw digest
//! 4. form-URL-encoded, then every literal `+` replaced by `%20`

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HTTP verbs accepted by the TourCMS API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            other => Err(format!("Unsupported verb: {}", other)),
        }
    }
}

/// Everything the signature binds, captured once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext<'a> {
    pub channel: u64,
    pub marketplace_id: i64,
    pub verb: Verb,
    pub timestamp_seconds: i64,
    /// Path plus query string exactly as sent on the request line
    pub path_with_query: &'a str,
}

impl SigningContext<'_> {
    /// Build the string that gets MAC-signed.
    ///
    /// There is no separator between the timestamp and the path.
    ///
    /// # Example
    /// ```
    /// use tourcms_sdk::{SigningContext, Verb};
    /// let ctx = SigningContext {
    ///     channel: 0,
    ///     marketplace_id: 12345,
    ///     verb: Verb::Get,
    ///     timestamp_seconds: 1_000_000_000,
    ///     path_with_query: "/p/tours/list.xml",
    /// };
    /// assert_eq!(ctx.canonical_string(), "0/12345/GET/1000000000/p/tours/list.xml");
    /// ```
    pub fn canonical_string(&self) -> String {
        format!(
            "{}/{}/{}/{}{}",
            self.channel, self.marketplace_id, self.verb, self.timestamp_seconds, self.path_with_query
        )
        .trim()
        .to_string()
    }

    /// Produce the URL-safe signature token for this context.
    pub fn sign(&self, secret: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
        mac.update(self.canonical_string().as_bytes());
        let digest = mac.finalize().into_bytes();

        let encoded = BASE64.encode(digest);
        escape_signature(encoded.trim_end())
    }
}

/// Sign a request from its individual parts.
///
/// Convenience wrapper over [`SigningContext::sign`].
pub fn sign(
    channel: u64,
    marketplace_id: i64,
    verb: Verb,
    timestamp_seconds: i64,
    path_with_query: &str,
    secret: &[u8],
) -> String {
    SigningContext {
        channel,
        marketplace_id,
        verb,
        timestamp_seconds,
        path_with_query,
    }
    .sign(secret)
}

/// Form-encode the Base64 text, then force `+` to `%20`.
///
/// The server decodes the token with a decoder that treats `+` as a space,
/// so no bare `+` may survive.
fn escape_signature(b64: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(b64.as_bytes()).collect();
    encoded.replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"secret";

    fn list_tours_ctx() -> SigningContext<'static> {
        SigningContext {
            channel: 0,
            marketplace_id: 12345,
            verb: Verb::Get,
            timestamp_seconds: 1_000_000_000,
            path_with_query: "/p/tours/list.xml",
        }
    }

    #[test]
    fn test_canonical_string_has_no_separator_before_path() {
        assert_eq!(
            list_tours_ctx().canonical_string(),
            "0/12345/GET/1000000000/p/tours/list.xml"
        );
    }

    #[test]
    fn test_canonical_string_is_trimmed() {
        let ctx = SigningContext {
            path_with_query: "/p/tours/list.xml  \n",
            ..list_tours_ctx()
        };
        assert_eq!(ctx.canonical_string(), "0/12345/GET/1000000000/p/tours/list.xml");
    }

    #[test]
    fn test_known_signature() {
        // Base64 of this digest contains '/', '+' and '='
        assert_eq!(
            list_tours_ctx().sign(SECRET),
            "%2FwFg0iwlq8T9Z6Sr5cmOQ%2BOY6wTmvkV010wcg1LT2%2B0%3D"
        );
        assert_eq!(
            sign(3, 12345, Verb::Get, 1_000_000_000, "/c/tour/show.xml?id=42", SECRET),
            "b69IWSVkLtrDZT3JXXLC6WTkXWNdmnyIi0mr3awMnow%3D"
        );
        assert_eq!(
            sign(3, 12345, Verb::Post, 1_282_816_800, "/c/booking/new/start.xml", b"abcdef123456"),
            "Y%2FDILHAT31%2F2eAxY3762u5Pl00M0tnVZ%2BZLmFEy5K4s%3D"
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let ctx = list_tours_ctx();
        assert_eq!(ctx.sign(SECRET), ctx.sign(SECRET));
    }

    #[test]
    fn test_every_input_changes_signature() {
        let base = list_tours_ctx();
        let reference = base.sign(SECRET);

        let variants = [
            SigningContext { channel: 1, ..base.clone() },
            SigningContext { marketplace_id: 12346, ..base.clone() },
            SigningContext { verb: Verb::Post, ..base.clone() },
            SigningContext { timestamp_seconds: 1_000_000_001, ..base.clone() },
            SigningContext { path_with_query: "/p/tours/list.xmm", ..base.clone() },
        ];
        for ctx in &variants {
            assert_ne!(ctx.sign(SECRET), reference, "unchanged for {:?}", ctx);
        }
        assert_ne!(base.sign(b"secres"), reference);
    }

    #[test]
    fn test_signature_never_contains_plus() {
        for ts in 1_000_000_000..1_000_000_200 {
            let sig = sign(7, 42, Verb::Get, ts, "/c/tours/search.xml?k=v", SECRET);
            assert!(!sig.contains('+'), "signature {} contains '+'", sig);
        }
    }

    #[test]
    fn test_escape_signature_rewrites_spaces() {
        assert_eq!(escape_signature("a b+c/="), "a%20b%2Bc%2F%3D");
    }

    #[test]
    fn test_verb_parsing() {
        assert_eq!("get".parse::<Verb>().unwrap(), Verb::Get);
        assert_eq!("POST".parse::<Verb>().unwrap(), Verb::Post);
        assert!("DELETE".parse::<Verb>().is_err());
    }
}

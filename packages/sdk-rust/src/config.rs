//! Client configuration and credentials

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};
use crate::signer::{SigningContext, Verb};

pub const DEFAULT_BASE_URL: &str = "https://api.tourcms.com";

/// What a request hands back to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    /// Untouched status, headers and body
    #[default]
    Raw,
    /// Decoded contents of the body's top-level `response` element
    Parsed,
}

impl ResultMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultMode::Raw => "raw",
            ResultMode::Parsed => "parsed",
        }
    }
}

/// API private key. Redacted in `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl From<String> for PrivateKey {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for PrivateKey {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Marketplace credentials for one API account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub marketplace_id: i64,
    pub private_key: PrivateKey,
}

impl Credentials {
    /// Validate the marketplace id and pair it with the key.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Configuration`] if `marketplace_id` is not an integer.
    pub fn new(marketplace_id: &str, private_key: impl Into<PrivateKey>) -> SdkResult<Self> {
        Ok(Self {
            marketplace_id: parse_marketplace_id(marketplace_id)?,
            private_key: private_key.into(),
        })
    }

    pub fn from_id(marketplace_id: i64, private_key: impl Into<PrivateKey>) -> Self {
        Self {
            marketplace_id,
            private_key: private_key.into(),
        }
    }

    /// Signing input for a request made under this marketplace
    pub fn signing_context<'a>(
        &self,
        channel: u64,
        verb: Verb,
        timestamp_seconds: i64,
        path_with_query: &'a str,
    ) -> SigningContext<'a> {
        SigningContext {
            channel,
            marketplace_id: self.marketplace_id,
            verb,
            timestamp_seconds,
            path_with_query,
        }
    }

    /// Sign `ctx` with the private key. The key itself never leaves this type.
    pub fn sign(&self, ctx: &SigningContext<'_>) -> String {
        ctx.sign(self.private_key.expose())
    }
}

fn parse_marketplace_id(raw: &str) -> SdkResult<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        SdkError::Configuration(format!("Marketplace ID must be an integer, got {:?}", raw))
    })
}

/// Immutable per-client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub result_mode: ResultMode,
    pub debug_trace: bool,
    pub base_url: String,
}

impl ClientConfig {
    /// Raw results, no wire trace, production base URL.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            result_mode: ResultMode::default(),
            debug_trace: false,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_result_mode(mut self, result_mode: ResultMode) -> Self {
        self.result_mode = result_mode;
        self
    }

    pub fn with_debug_trace(mut self, debug_trace: bool) -> Self {
        self.debug_trace = debug_trace;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Serializable form of [`ClientConfig`], for loading from files or the
/// environment. The marketplace id is kept as text so it goes through the
/// same validation as [`Credentials::new`].
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    pub marketplace_id: String,
    pub private_key: PrivateKey,
    #[serde(default)]
    pub result_mode: ResultMode,
    #[serde(default)]
    pub debug_trace: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl TryFrom<ClientSettings> for ClientConfig {
    type Error = SdkError;

    fn try_from(settings: ClientSettings) -> SdkResult<Self> {
        let credentials = Credentials::new(&settings.marketplace_id, settings.private_key)?;
        Ok(ClientConfig::new(credentials)
            .with_result_mode(settings.result_mode)
            .with_debug_trace(settings.debug_trace)
            .with_base_url(settings.base_url))
    }
}

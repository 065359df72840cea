//! Request description handed to the dispatcher

use crate::params::Params;
use crate::signer::Verb;

/// One API call: path, channel scope, query, optional body and verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub path: String,
    /// 0 for marketplace-level calls
    pub channel: u64,
    pub params: Params,
    pub body: Option<Vec<u8>>,
    pub verb: Verb,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            channel: 0,
            params: Params::new(),
            body: None,
            verb: Verb::Get,
        }
    }

    /// POST with a pre-serialized payload, sent unmodified
    pub fn post(path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            channel: 0,
            params: Params::new(),
            body: Some(body.into()),
            verb: Verb::Post,
        }
    }

    pub fn channel(mut self, channel: u64) -> Self {
        self.channel = channel;
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Path plus form-encoded query. Built once per request and used for
    /// both the URL and the signature.
    pub fn path_with_query(&self) -> String {
        if self.params.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.params.to_query())
        }
    }
}

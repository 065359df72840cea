//! Response types returned by the dispatcher

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{SdkError, SdkResult};
use crate::xml;

/// Transport response exactly as received
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body the way a `Parsed` client would.
    pub fn parse(&self) -> SdkResult<Value> {
        xml::decode_response(&self.body)
    }
}

/// Result of a dispatched request, shaped by the client's result mode
#[derive(Debug, Clone)]
pub enum ApiResponse {
    Raw(RawResponse),
    Parsed(Value),
}

impl ApiResponse {
    pub fn mode_name(&self) -> &'static str {
        match self {
            ApiResponse::Raw(_) => "raw",
            ApiResponse::Parsed(_) => "parsed",
        }
    }

    pub fn into_raw(self) -> SdkResult<RawResponse> {
        match self {
            ApiResponse::Raw(raw) => Ok(raw),
            other => Err(SdkError::UnexpectedMode {
                expected: "raw",
                actual: other.mode_name(),
            }),
        }
    }

    pub fn into_parsed(self) -> SdkResult<Value> {
        match self {
            ApiResponse::Parsed(value) => Ok(value),
            other => Err(SdkError::UnexpectedMode {
                expected: "parsed",
                actual: other.mode_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(body: &str) -> RawResponse {
        RawResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_raw_response_parse() {
        let response = raw("<response><error>OK</error></response>");
        assert_eq!(response.parse().unwrap(), json!({ "error": "OK" }));
        assert_eq!(response.text(), "<response><error>OK</error></response>");
    }

    #[test]
    fn test_mode_accessors() {
        let response = ApiResponse::Raw(raw(""));
        assert!(matches!(
            response.clone().into_parsed(),
            Err(SdkError::UnexpectedMode { expected: "parsed", actual: "raw" })
        ));
        assert!(response.into_raw().is_ok());

        let parsed = ApiResponse::Parsed(json!({ "status": "ok" }));
        assert_eq!(parsed.clone().into_parsed().unwrap()["status"], "ok");
        assert!(parsed.into_raw().is_err());
    }
}

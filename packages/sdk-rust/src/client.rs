use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, DATE};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::debug;

use crate::config::{ClientConfig, Credentials, PrivateKey, ResultMode};
use crate::endpoints::EndpointCall;
use crate::error::{SdkError, SdkResult};
use crate::logger::{ConsoleLogger, LogLevel, Logger, NoopLogger};
use crate::request::RequestSpec;
use crate::response::{ApiResponse, RawResponse};
use crate::signer::Verb;
use crate::xml;

/// RFC 1123 date, always in GMT
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
pub const AUTH_SCHEME: &str = "TourCMS";

/// Signed REST client for the TourCMS API
///
/// Holds only immutable configuration and a connection handle, so clones
/// can be shared freely across tasks.
#[derive(Clone)]
pub struct TourCmsClient {
    config: Arc<ClientConfig>,
    /// Path of the base URL without its trailing slash, "" for a bare host
    base_path: String,
    client: Client,
    logger: Arc<dyn Logger>,
}

/// A fully signed request, ready for the transport
#[derive(Debug)]
pub(crate) struct PreparedRequest {
    pub verb: Verb,
    pub channel: u64,
    pub url: Url,
    pub path_with_query: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl TourCmsClient {
    /// Create a Raw-mode client against the production API.
    ///
    /// # Errors
    ///
    /// [`SdkError::Configuration`] if `marketplace_id` is not an integer.
    pub fn new(marketplace_id: &str, private_key: impl Into<PrivateKey>) -> SdkResult<Self> {
        Self::with_config(ClientConfig::new(Credentials::new(marketplace_id, private_key)?))
    }

    /// Create a client from a full configuration
    pub fn with_config(config: ClientConfig) -> SdkResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| SdkError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Self::with_http_client(config, client)
    }

    /// Create a client on top of a caller-configured `reqwest::Client`
    /// (timeouts, proxies and pooling are the caller's concern).
    pub fn with_http_client(mut config: ClientConfig, client: Client) -> SdkResult<Self> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&config.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SdkError::Configuration(format!(
                "Unsupported URL scheme: {}",
                base.scheme()
            )));
        }

        let logger: Arc<dyn Logger> = if config.debug_trace {
            Arc::new(ConsoleLogger::new(LogLevel::Debug))
        } else {
            Arc::new(NoopLogger)
        };

        if base.query().is_some() || base.fragment().is_some() {
            return Err(SdkError::Configuration(format!(
                "Base URL must not carry a query or fragment: {}",
                config.base_url
            )));
        }
        let base_path = base.path().trim_end_matches('/').to_string();

        Ok(Self {
            config: Arc::new(config),
            base_path,
            client,
            logger,
        })
    }

    /// Replace the sink used for the wire trace
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ===== Dispatch =====

    /// Send a request and shape the result by the configured result mode.
    pub async fn request(&self, spec: RequestSpec) -> SdkResult<ApiResponse> {
        let raw = self.dispatch(spec).await?;
        match self.config.result_mode {
            ResultMode::Raw => Ok(ApiResponse::Raw(raw)),
            ResultMode::Parsed => Ok(ApiResponse::Parsed(xml::decode_response(&raw.body)?)),
        }
    }

    /// Send a request and return the transport response, whatever the mode.
    pub async fn request_raw(&self, spec: RequestSpec) -> SdkResult<RawResponse> {
        self.dispatch(spec).await
    }

    /// Send a request and decode the body's `response` element, whatever the mode.
    pub async fn request_parsed(&self, spec: RequestSpec) -> SdkResult<Value> {
        let raw = self.dispatch(spec).await?;
        xml::decode_response(&raw.body)
    }

    // ===== Endpoint table =====

    /// Call an endpoint from the static table.
    ///
    /// # Example
    /// ```no_run
    /// use tourcms_sdk::{Endpoint, EndpointCall, TourCmsClient};
    ///
    /// # async fn run() -> tourcms_sdk::SdkResult<()> {
    /// let client = TourCmsClient::new("126", "private-key")?;
    /// let response = client
    ///     .call(EndpointCall::new(Endpoint::ShowTour).channel(3930).id("6"))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call(&self, call: impl Into<EndpointCall>) -> SdkResult<ApiResponse> {
        self.request(call.into().into_request_spec()?).await
    }

    pub async fn call_raw(&self, call: impl Into<EndpointCall>) -> SdkResult<RawResponse> {
        self.request_raw(call.into().into_request_spec()?).await
    }

    pub async fn call_parsed(&self, call: impl Into<EndpointCall>) -> SdkResult<Value> {
        self.request_parsed(call.into().into_request_spec()?).await
    }

    // ===== Internal Helper Methods =====

    /// Build the signed request for `spec` as of `now`.
    ///
    /// The path+query string is built once; the exact same bytes become the
    /// request line and the signing input.
    pub(crate) fn prepare(&self, spec: RequestSpec, now: DateTime<Utc>) -> SdkResult<PreparedRequest> {
        let path_with_query = spec.path_with_query();
        if !path_with_query.starts_with('/') {
            return Err(SdkError::InvalidRequest(format!(
                "Request path must start with '/': {}",
                spec.path
            )));
        }

        let url = Url::parse(&format!("{}{}", self.config.base_url, path_with_query))
            .map_err(|e| {
                SdkError::InvalidRequest(format!("Invalid request URL for {}: {}", path_with_query, e))
            })?;
        let wire_path = &url[url::Position::BeforePath..url::Position::AfterQuery];
        if url.fragment().is_some() || wire_path != format!("{}{}", self.base_path, path_with_query) {
            return Err(SdkError::InvalidRequest(format!(
                "Path {} would be sent as {}",
                path_with_query, wire_path
            )));
        }

        let credentials = &self.config.credentials;
        let signature = credentials.sign(&credentials.signing_context(
            spec.channel,
            spec.verb,
            now.timestamp(),
            &path_with_query,
        ));

        let authorization = format!(
            "{} {}:{}:{}",
            AUTH_SCHEME, spec.channel, credentials.marketplace_id, signature
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/xml"));
        headers.insert(HeaderName::from_static("charset"), HeaderValue::from_static("utf-8"));
        headers.insert(DATE, header_value(&now.format(DATE_FORMAT).to_string())?);
        headers.insert(AUTHORIZATION, header_value(&authorization)?);

        let body = match spec.verb {
            Verb::Get => None,
            Verb::Post => Some(spec.body.unwrap_or_default()),
        };

        Ok(PreparedRequest {
            verb: spec.verb,
            channel: spec.channel,
            url,
            path_with_query,
            headers,
            body,
        })
    }

    /// One signed round-trip. Transport errors propagate unchanged.
    async fn dispatch(&self, spec: RequestSpec) -> SdkResult<RawResponse> {
        let prepared = self.prepare(spec, Utc::now())?;

        debug!(
            verb = %prepared.verb,
            path = %prepared.path_with_query,
            channel = prepared.channel,
            "Dispatching TourCMS request"
        );
        if self.config.debug_trace {
            self.trace_request(&prepared);
        }

        let method = match prepared.verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
        };
        let mut builder = self
            .client
            .request(method, prepared.url)
            .headers(prepared.headers);
        if let Some(body) = prepared.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        debug!(status = status.as_u16(), bytes = body.len(), "TourCMS response received");

        let raw = RawResponse {
            status,
            headers,
            body,
        };
        if self.config.debug_trace {
            self.trace_response(&raw);
        }
        Ok(raw)
    }

    fn trace_request(&self, prepared: &PreparedRequest) {
        self.logger
            .debug(&format!("-> {} {}", prepared.verb, prepared.url));
        for (name, value) in &prepared.headers {
            let shown = if *name == AUTHORIZATION {
                format!(
                    "{} {}:{}:<redacted>",
                    AUTH_SCHEME, prepared.channel, self.config.credentials.marketplace_id
                )
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            self.logger.debug(&format!("-> {}: {}", name, shown));
        }
        if let Some(body) = &prepared.body {
            self.logger
                .debug(&format!("-> body ({} bytes): {}", body.len(), String::from_utf8_lossy(body)));
        }
    }

    fn trace_response(&self, raw: &RawResponse) {
        self.logger.debug(&format!("<- {}", raw.status));
        for (name, value) in &raw.headers {
            self.logger.debug(&format!(
                "<- {}: {}",
                name,
                String::from_utf8_lossy(value.as_bytes())
            ));
        }
        self.logger
            .debug(&format!("<- body ({} bytes): {}", raw.body.len(), raw.text()));
    }
}

fn header_value(value: &str) -> SdkResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| SdkError::InvalidRequest(format!("Invalid header value {:?}: {}", value, e)))
}

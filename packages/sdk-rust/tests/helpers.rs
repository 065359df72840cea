/// Test helpers for SDK integration tests
///
/// Every fixture talks to a mock TourCMS server that verifies signatures
/// independently of the SDK.
use std::sync::{Arc, Mutex};

use tourcms_sdk::{ClientConfig, Credentials, LogLevel, Logger, ResultMode, TourCmsClient};
use tourcms_test_utils::MockTourCms;

pub const MARKETPLACE_ID: i64 = 126;
pub const PRIVATE_KEY: &str = "a1b2c3d4e5f6";

/// Test fixture that provides a mock server and a client pointed at it
pub struct TestFixture {
    pub server: MockTourCms,
    pub client: TourCmsClient,
}

impl TestFixture {
    /// Raw-mode client with matching credentials
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_mode(ResultMode::Raw).await
    }

    /// Parsed-mode client with matching credentials
    pub async fn parsed() -> anyhow::Result<Self> {
        Self::with_mode(ResultMode::Parsed).await
    }

    pub async fn with_mode(mode: ResultMode) -> anyhow::Result<Self> {
        let server = MockTourCms::start(MARKETPLACE_ID, PRIVATE_KEY).await?;
        let config = ClientConfig::new(Credentials::from_id(MARKETPLACE_ID, PRIVATE_KEY))
            .with_base_url(&server.base_url)
            .with_result_mode(mode);
        let client = TourCmsClient::with_config(config)?;
        Ok(Self { server, client })
    }

    /// Client for the same server but signing with the wrong key
    pub fn client_with_key(&self, private_key: &str) -> anyhow::Result<TourCmsClient> {
        let config = ClientConfig::new(Credentials::from_id(MARKETPLACE_ID, private_key))
            .with_base_url(&self.server.base_url);
        Ok(TourCmsClient::with_config(config)?)
    }
}

/// Logger that keeps every line, for asserting on the wire trace
#[derive(Default)]
pub struct CaptureLogger {
    pub lines: Mutex<Vec<String>>,
}

impl CaptureLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn joined(&self) -> String {
        self.lines.lock().unwrap().join("\n")
    }
}

impl Logger for CaptureLogger {
    fn log(&self, _level: LogLevel, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}

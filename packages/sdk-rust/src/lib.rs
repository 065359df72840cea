//! TourCMS SDK
//!
//! Signed-request client for the TourCMS tour and booking API.
//!
//! This SDK provides:
//! - HMAC-SHA256 request signing that matches server-side verification
//! - A dispatcher returning raw transport responses or decoded XML values
//! - A static table of the TourCMS endpoints
//! - Configurable wire tracing
//!
//! # Example
//!
//! ```no_run
//! use tourcms_sdk::{ClientConfig, Credentials, Endpoint, EndpointCall, ResultMode, TourCmsClient};
//!
//! #[tokio::main]
//! async fn main() -> tourcms_sdk::SdkResult<()> {
//!     let config = ClientConfig::new(Credentials::new("126", "my-private-key")?)
//!         .with_result_mode(ResultMode::Parsed);
//!     let client = TourCmsClient::with_config(config)?;
//!
//!     let channels = client.call_parsed(Endpoint::ListChannels).await?;
//!     println!("{}", channels);
//!
//!     let tour = client
//!         .call_parsed(EndpointCall::new(Endpoint::ShowTour).channel(3930).id("6"))
//!         .await?;
//!     println!("{}", tour["tour"]["tour_name"]);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod logger;
pub mod params;
pub mod request;
pub mod response;
pub mod signer;
pub mod xml;

pub use client::TourCmsClient;
pub use config::{ClientConfig, ClientSettings, Credentials, PrivateKey, ResultMode, DEFAULT_BASE_URL};
pub use endpoints::{Endpoint, EndpointCall, EndpointSpec, ENDPOINTS};
pub use error::{SdkError, SdkResult};
pub use logger::{ConsoleLogger, LogLevel, Logger, NoopLogger, TracingLogger};
pub use params::Params;
pub use request::RequestSpec;
pub use response::{ApiResponse, RawResponse};
pub use signer::{sign, SigningContext, Verb};

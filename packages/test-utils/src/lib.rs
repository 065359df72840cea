//! Test utilities for the TourCMS SDK
//!
//! Provides a mock TourCMS API that verifies request signatures on its own
//! and records everything it receives.

mod server;
pub mod verify;

pub use server::{unreachable_base_url, MockTourCms, RecordedRequest, CLOCK_TOLERANCE_SECS};
pub use verify::{expected_signature, AuthorizationHeader, Verification};

//! Scan failures and their mapping to wire error codes.

use a11y_protocol::{ErrorCode, ErrorPayload};
use a11y_runtime::RuntimeError;
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;

/// A scan that could not produce a report.
///
/// Analysis and enrichment problems never surface here; they degrade the
/// report instead.
#[derive(Debug, Error)]
pub enum ScanError {
	#[error("URL is required")]
	MissingUrl,

	#[error("Invalid URL format: {reason}")]
	InvalidUrl { input: String, reason: String },

	#[error("Browser launch failed: {0}")]
	Launch(String),

	#[error("Failed to load {url}: {reason}")]
	Connection { url: String, reason: String },

	#[error("Navigation to {url} timed out after {timeout_ms}ms")]
	NavigationTimeout { url: String, timeout_ms: u64 },

	#[error("Scan exceeded the overall deadline of {timeout_ms}ms")]
	DeadlineExceeded { timeout_ms: u64 },

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("Internal error: {0}")]
	Internal(String),
}

impl ScanError {
	pub fn code(&self) -> ErrorCode {
		match self {
			ScanError::MissingUrl | ScanError::InvalidUrl { .. } | ScanError::Config(_) => ErrorCode::InvalidInput,
			ScanError::Launch(_) => ErrorCode::BrowserLaunchFailed,
			ScanError::Connection { .. } => ErrorCode::NavigationFailed,
			ScanError::NavigationTimeout { .. } => ErrorCode::NavigationTimeout,
			ScanError::DeadlineExceeded { .. } => ErrorCode::Timeout,
			ScanError::Internal(_) => ErrorCode::InternalError,
		}
	}

	/// Failures caused by the caller's input or target page, as opposed to the service.
	pub fn is_client_error(&self) -> bool {
		matches!(
			self,
			ScanError::MissingUrl
				| ScanError::InvalidUrl { .. }
				| ScanError::Config(_)
				| ScanError::Connection { .. }
				| ScanError::NavigationTimeout { .. }
		)
	}

	pub fn to_payload(&self) -> ErrorPayload {
		let payload = ErrorPayload::new(self.code(), self.to_string());
		match self {
			ScanError::InvalidUrl { input, .. } => payload.with_details(json!({ "url": input })),
			ScanError::Connection { url, .. } => payload.with_details(json!({ "url": url })),
			ScanError::NavigationTimeout { url, timeout_ms } => payload.with_details(json!({ "url": url, "timeoutMs": timeout_ms })),
			ScanError::DeadlineExceeded { timeout_ms } => payload.with_details(json!({ "timeoutMs": timeout_ms })),
			_ => payload,
		}
	}
}

impl From<RuntimeError> for ScanError {
	fn from(err: RuntimeError) -> Self {
		match err {
			RuntimeError::BrowserLaunch(reason) => ScanError::Launch(reason),
			RuntimeError::LaunchTimeout { timeout_ms } => ScanError::Launch(format!("browser did not start within {timeout_ms}ms")),
			RuntimeError::Connection { url, reason } => ScanError::Connection { url, reason },
			RuntimeError::NavigationTimeout { url, timeout_ms } => ScanError::NavigationTimeout { url, timeout_ms },
			other => ScanError::Internal(other.to_string()),
		}
	}
}

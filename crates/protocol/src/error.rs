//! Error payload returned to callers of a failed scan.

use serde::{Deserialize, Serialize};

/// Standardized error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	InvalidInput,
	BrowserLaunchFailed,
	NavigationFailed,
	NavigationTimeout,
	Timeout,
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorCode::InvalidInput => write!(f, "INVALID_INPUT"),
			ErrorCode::BrowserLaunchFailed => write!(f, "BROWSER_LAUNCH_FAILED"),
			ErrorCode::NavigationFailed => write!(f, "NAVIGATION_FAILED"),
			ErrorCode::NavigationTimeout => write!(f, "NAVIGATION_TIMEOUT"),
			ErrorCode::Timeout => write!(f, "TIMEOUT"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

/// Typed failure body: `{message, code, details?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
	pub message: String,
	pub code: ErrorCode,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

impl ErrorPayload {
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			code,
			details: None,
		}
	}

	pub fn with_details(mut self, details: serde_json::Value) -> Self {
		self.details = Some(details);
		self
	}
}

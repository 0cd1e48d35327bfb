//! Error types for browser session operations.

use chromiumoxide::error::CdpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
	#[error("Browser launch failed: {0}")]
	BrowserLaunch(String),

	#[error("Browser did not start within {timeout_ms}ms")]
	LaunchTimeout { timeout_ms: u64 },

	#[error("Could not load {url}: {reason}")]
	Connection { url: String, reason: String },

	#[error("Navigation to {url} timed out after {timeout_ms}ms")]
	NavigationTimeout { url: String, timeout_ms: u64 },

	#[error("Script evaluation failed: {0}")]
	Evaluation(String),

	#[error(transparent)]
	Cdp(#[from] CdpError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

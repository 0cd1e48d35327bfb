//! Accessibility scanner: headless-browser analysis with AI-explained findings.
//!
//! A scan validates the URL, launches a dedicated browser session, navigates to
//! DOM-ready, runs axe-core, releases the session and explains the top findings.
//! The same [`orchestrator::ScanOrchestrator`] backs the CLI and the HTTP API.

pub mod analyzer;
pub mod cli;
pub mod commands;
pub mod config;
pub mod enricher;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod server;

pub use config::ScanConfig;
pub use error::ScanError;
pub use orchestrator::{ScanOrchestrator, validate_url};

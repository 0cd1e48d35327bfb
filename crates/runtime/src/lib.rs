//! Browser session runtime for the accessibility scanner.
//!
//! Each scan owns exactly one headless browser process and one page. Sessions
//! are acquired through a [`SessionProvider`], navigated with a deadline, and
//! consumed by [`NavigationSession::release`]. Nothing here is pooled or shared
//! between scans.

pub mod error;
pub mod filter;
pub mod launch;
pub mod session;

pub use error::{Result, RuntimeError};
pub use filter::{ResourceFilter, ResourceKind};
pub use launch::{ExecutablePlan, RuntimeKind, resolve_plan};
pub use session::{ChromeSessionProvider, NavigationSession, SessionOptions, SessionProvider, Viewport};

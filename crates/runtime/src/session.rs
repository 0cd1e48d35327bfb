//! Ephemeral navigation sessions: one browser process and one page per scan.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
	ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, SetUserAgentOverrideParams};
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, NavigateParams};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Result, RuntimeError};
use crate::filter::{ResourceFilter, ResourceKind};
use crate::launch::{ExecutablePlan, RuntimeKind, process_env, resolve_plan};

/// Upper bound for each individual teardown step.
const TEARDOWN_STEP: Duration = Duration::from_secs(3);

/// Page viewport applied before navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
	pub width: u32,
	pub height: u32,
}

impl Default for Viewport {
	fn default() -> Self {
		Self { width: 1280, height: 800 }
	}
}

/// Launch and page settings for sessions created by [`ChromeSessionProvider`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
	pub runtime: RuntimeKind,
	/// Explicit browser executable; discovered when absent.
	pub executable: Option<PathBuf>,
	/// Budget for process start plus page creation.
	pub launch_timeout: Duration,
	pub viewport: Viewport,
	pub user_agent: Option<String>,
	pub filter: ResourceFilter,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			runtime: RuntimeKind::Auto,
			executable: None,
			launch_timeout: Duration::from_secs(8),
			viewport: Viewport::default(),
			user_agent: None,
			filter: ResourceFilter::default(),
		}
	}
}

/// An exclusively-owned browser page scoped to a single scan.
///
/// `release` consumes the session, so it cannot be used after teardown.
#[async_trait]
pub trait NavigationSession: Send {
	/// Loads `url`, completing at DOM-ready, failing once `deadline` passes.
	async fn navigate(&mut self, url: &Url, deadline: Instant) -> Result<()>;

	/// Evaluates `expression` in the page, awaiting promises, and returns its JSON value.
	async fn evaluate(&mut self, expression: &str) -> Result<Value>;

	/// Closes the page, then the browser. Teardown errors are logged, never returned.
	async fn release(self: Box<Self>);
}

/// Source of fresh navigation sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync {
	/// Starts a session, giving up at `deadline` or the provider's own launch budget, whichever is earlier.
	async fn acquire(&self, deadline: Instant) -> Result<Box<dyn NavigationSession>>;
}

/// Launches a dedicated headless Chromium for every acquired session.
pub struct ChromeSessionProvider {
	options: SessionOptions,
}

impl ChromeSessionProvider {
	pub fn new(options: SessionOptions) -> Self {
		Self { options }
	}

	fn browser_config(&self, plan: &ExecutablePlan) -> Result<BrowserConfig> {
		BrowserConfig::builder()
			.chrome_executable(&plan.executable)
			.args(plan.args.clone())
			.window_size(self.options.viewport.width, self.options.viewport.height)
			.launch_timeout(self.options.launch_timeout)
			.build()
			.map_err(RuntimeError::BrowserLaunch)
	}

	async fn open_page(&self, browser: &Browser) -> Result<Page> {
		let page = browser.new_page("about:blank").await?;

		let viewport = self.options.viewport;
		page.execute(SetDeviceMetricsOverrideParams::new(i64::from(viewport.width), i64::from(viewport.height), 1.0, false))
			.await?;

		if let Some(user_agent) = &self.options.user_agent {
			page.execute(SetUserAgentOverrideParams::new(user_agent.clone())).await?;
		}

		Ok(page)
	}
}

#[async_trait]
impl SessionProvider for ChromeSessionProvider {
	async fn acquire(&self, deadline: Instant) -> Result<Box<dyn NavigationSession>> {
		let plan = resolve_plan(self.options.runtime, self.options.executable.as_deref(), &process_env)?;
		if plan.runtime == RuntimeKind::Managed && !plan.executable.exists() {
			return Err(RuntimeError::BrowserLaunch(format!(
				"Managed Chromium binary not found at {}",
				plan.executable.display()
			)));
		}

		debug!(
			target: "a11y.session",
			runtime = ?plan.runtime,
			executable = %plan.executable.display(),
			"launching browser"
		);

		let now = Instant::now();
		let launch_deadline = startup_deadline(now, self.options.launch_timeout, deadline);
		let timeout_ms = millis(launch_deadline.saturating_duration_since(now));
		let config = self.browser_config(&plan)?;

		let (mut browser, mut handler) = tokio::time::timeout_at(launch_deadline, Browser::launch(config))
			.await
			.map_err(|_| RuntimeError::LaunchTimeout { timeout_ms })?
			.map_err(|e| RuntimeError::BrowserLaunch(e.to_string()))?;

		let handler_task = tokio::spawn(async move {
			while let Some(event) = handler.next().await {
				if let Err(err) = event {
					trace!(target: "a11y.session", error = %err, "browser handler error");
				}
			}
		});

		let opened = tokio::time::timeout_at(launch_deadline, self.open_page(&browser)).await;
		let page = match opened {
			Ok(Ok(page)) => page,
			outcome => {
				let err = match outcome {
					Ok(Err(err)) => RuntimeError::BrowserLaunch(format!("Failed to open page: {err}")),
					_ => RuntimeError::LaunchTimeout { timeout_ms },
				};
				if let Err(close_err) = browser.close().await {
					warn!(target: "a11y.session", error = %close_err, "failed to close browser after page setup failure");
				}
				if let Some(Err(kill_err)) = browser.kill().await {
					warn!(target: "a11y.session", error = %kill_err, "failed to kill browser after page setup failure");
				}
				handler_task.abort();
				return Err(err);
			}
		};

		debug!(target: "a11y.session", "session acquired");

		Ok(Box::new(ChromeSession {
			browser,
			page,
			handler_task,
			interceptor: None,
			filter: self.options.filter.clone(),
		}))
	}
}

/// A live Chromium process with a single page.
pub struct ChromeSession {
	browser: Browser,
	page: Page,
	handler_task: JoinHandle<()>,
	interceptor: Option<JoinHandle<()>>,
	filter: ResourceFilter,
}

impl ChromeSession {
	/// Turns on request interception and resolves every paused request through the filter.
	async fn start_interception(&mut self) -> Result<()> {
		if self.interceptor.is_some() {
			return Ok(());
		}

		let mut paused = self.page.event_listener::<EventRequestPaused>().await?;
		let page = self.page.clone();
		let filter = self.filter.clone();

		self.interceptor = Some(tokio::spawn(async move {
			while let Some(event) = paused.next().await {
				let kind = ResourceKind::from(&event.resource_type);
				let outcome = if filter.should_allow(kind) {
					page.execute(ContinueRequestParams::new(event.request_id.clone())).await.map(drop)
				} else {
					trace!(target: "a11y.session", url = %event.request.url, ?kind, "aborting request");
					page.execute(FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient))
						.await
						.map(drop)
				};
				if let Err(err) = outcome {
					debug!(target: "a11y.session", error = %err, "failed to resolve paused request");
				}
			}
		}));

		self.page
			.execute(EnableParams {
				patterns: Some(vec![RequestPattern {
					url_pattern: Some("*".to_string()),
					resource_type: None,
					request_stage: Some(RequestStage::Request),
				}]),
				handle_auth_requests: None,
			})
			.await?;

		Ok(())
	}
}

#[async_trait]
impl NavigationSession for ChromeSession {
	async fn navigate(&mut self, url: &Url, deadline: Instant) -> Result<()> {
		let timeout_ms = millis(deadline.saturating_duration_since(Instant::now()));
		let target = url.to_string();
		debug!(target: "a11y.session", url = %target, timeout_ms, "navigating");

		let load = async {
			let connection = |reason: String| RuntimeError::Connection {
				url: target.clone(),
				reason,
			};

			self.start_interception().await.map_err(|e| connection(e.to_string()))?;

			let mut dom_ready = self
				.page
				.event_listener::<EventDomContentEventFired>()
				.await
				.map_err(|e| connection(e.to_string()))?;

			let response = self
				.page
				.execute(NavigateParams::new(target.clone()))
				.await
				.map_err(|e| connection(e.to_string()))?;

			if let Some(reason) = response.result.error_text.clone() {
				return Err(connection(reason));
			}

			match dom_ready.next().await {
				Some(_) => Ok(()),
				None => Err(connection("page closed before DOMContentLoaded".to_string())),
			}
		};

		let outcome = tokio::time::timeout_at(deadline, load).await;
		match outcome {
			Ok(result) => result,
			Err(_) => Err(RuntimeError::NavigationTimeout { url: target, timeout_ms }),
		}
	}

	async fn evaluate(&mut self, expression: &str) -> Result<Value> {
		let params = EvaluateParams::builder()
			.expression(expression)
			.await_promise(true)
			.return_by_value(true)
			.build()
			.map_err(RuntimeError::Evaluation)?;

		let result = self.page.evaluate_expression(params).await?;
		Ok(result.value().cloned().unwrap_or(Value::Null))
	}

	async fn release(self: Box<Self>) {
		let ChromeSession {
			mut browser,
			page,
			handler_task,
			interceptor,
			..
		} = *self;

		if let Some(task) = interceptor {
			task.abort();
		}

		match tokio::time::timeout(TEARDOWN_STEP, page.close()).await {
			Ok(Ok(())) => {}
			Ok(Err(err)) => warn!(target: "a11y.session", error = %err, "failed to close page"),
			Err(_) => warn!(target: "a11y.session", "timed out closing page"),
		}

		match tokio::time::timeout(TEARDOWN_STEP, browser.close()).await {
			Ok(Ok(_)) => {}
			Ok(Err(err)) => warn!(target: "a11y.session", error = %err, "failed to close browser"),
			Err(_) => warn!(target: "a11y.session", "timed out closing browser"),
		}

		match tokio::time::timeout(TEARDOWN_STEP, browser.wait()).await {
			Ok(Ok(status)) => debug!(target: "a11y.session", ?status, "browser exited"),
			Ok(Err(err)) => warn!(target: "a11y.session", error = %err, "failed to wait for browser exit"),
			Err(_) => {
				warn!(target: "a11y.session", "browser still running after close; killing");
				if let Some(Err(err)) = browser.kill().await {
					warn!(target: "a11y.session", error = %err, "failed to kill browser");
				}
			}
		}

		handler_task.abort();
		debug!(target: "a11y.session", "session released");
	}
}

/// The launch budget measured from `now`, cut short by the caller's deadline.
fn startup_deadline(now: Instant, launch_timeout: Duration, deadline: Instant) -> Instant {
	(now + launch_timeout).min(deadline)
}

fn millis(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

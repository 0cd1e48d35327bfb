//! Browser executable resolution.
//!
//! Two environments are supported: a constrained managed runtime (serverless
//! functions with a bundled Chromium and no user namespaces) and a full local
//! install where Chrome/Chromium is discovered on the machine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

/// Default location of the bundled Chromium binary in managed runtimes.
pub const DEFAULT_MANAGED_EXECUTABLE: &str = "/tmp/chromium";

/// Flags for sandboxless, single-process Chromium in serverless containers.
pub const MANAGED_ARGS: &[&str] = &[
	"--no-sandbox",
	"--disable-setuid-sandbox",
	"--disable-dev-shm-usage",
	"--disable-gpu",
	"--single-process",
	"--no-zygote",
	"--no-first-run",
	"--hide-scrollbars",
	"--mute-audio",
];

pub const LOCAL_ARGS: &[&str] = &[
	"--no-first-run",
	"--no-default-browser-check",
	"--disable-extensions",
	"--disable-dev-shm-usage",
	"--mute-audio",
];

/// Requested execution environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
	/// Detect from the process environment.
	#[default]
	Auto,
	Managed,
	Local,
}

impl RuntimeKind {
	/// Resolves `Auto` against environment markers set by serverless platforms.
	pub fn detect(self, env: &dyn Fn(&str) -> Option<String>) -> RuntimeKind {
		match self {
			RuntimeKind::Auto => {
				let managed = ["AWS_LAMBDA_FUNCTION_NAME", "VERCEL", "NETLIFY"]
					.iter()
					.any(|key| env(key).is_some_and(|value| !value.is_empty()));
				if managed { RuntimeKind::Managed } else { RuntimeKind::Local }
			}
			other => other,
		}
	}
}

/// Concrete executable plus launch flags for one browser start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutablePlan {
	pub runtime: RuntimeKind,
	pub executable: PathBuf,
	pub args: Vec<String>,
}

/// Builds the launch plan for `requested`, honoring an explicit executable override.
pub fn resolve_plan(requested: RuntimeKind, executable: Option<&Path>, env: &dyn Fn(&str) -> Option<String>) -> Result<ExecutablePlan> {
	match requested.detect(env) {
		RuntimeKind::Managed => {
			let path = executable
				.map(Path::to_path_buf)
				.or_else(|| env("CHROMIUM_PATH").map(PathBuf::from))
				.unwrap_or_else(|| PathBuf::from(DEFAULT_MANAGED_EXECUTABLE));
			Ok(ExecutablePlan {
				runtime: RuntimeKind::Managed,
				executable: path,
				args: MANAGED_ARGS.iter().map(|s| s.to_string()).collect(),
			})
		}
		_ => {
			let path = match executable {
				Some(path) => path.to_path_buf(),
				None => discover_executable().ok_or_else(|| {
					RuntimeError::BrowserLaunch(
						"Could not find Chrome/Chromium executable. \
						 Install Chrome or set browser.executable in the scan config."
							.into(),
					)
				})?,
			};
			Ok(ExecutablePlan {
				runtime: RuntimeKind::Local,
				executable: path,
				args: LOCAL_ARGS.iter().map(|s| s.to_string()).collect(),
			})
		}
	}
}

/// Reads the real process environment.
pub fn process_env(key: &str) -> Option<String> {
	std::env::var(key).ok()
}

/// A place a browser might be installed: a command on `PATH` or an absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidate {
	Command(&'static str),
	Path(PathBuf),
}

impl Candidate {
	fn resolve(&self) -> Option<PathBuf> {
		match self {
			Candidate::Command(name) => which::which(name).ok(),
			Candidate::Path(path) => path.is_file().then(|| path.clone()),
		}
	}
}

/// Returns the first installed Chrome, Chromium or Edge binary.
pub(crate) fn discover_executable() -> Option<PathBuf> {
	platform_candidates().iter().find_map(Candidate::resolve)
}

fn platform_candidates() -> Vec<Candidate> {
	if cfg!(target_os = "macos") {
		["Google Chrome.app/Contents/MacOS/Google Chrome", "Chromium.app/Contents/MacOS/Chromium"]
			.into_iter()
			.map(|bundle| Candidate::Path(Path::new("/Applications").join(bundle)))
			.collect()
	} else if cfg!(target_os = "windows") {
		let roots = ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"]
			.into_iter()
			.filter_map(process_env)
			.map(PathBuf::from)
			.collect();
		windows_candidates(roots)
	} else {
		let mut candidates: Vec<Candidate> = ["google-chrome-stable", "google-chrome", "chromium", "chromium-browser", "headless-shell"]
			.into_iter()
			.map(Candidate::Command)
			.collect();
		candidates.push(Candidate::Path(PathBuf::from("/snap/bin/chromium")));
		candidates
	}
}

fn windows_candidates(mut roots: Vec<PathBuf>) -> Vec<Candidate> {
	if roots.is_empty() {
		roots = vec![PathBuf::from(r"C:\Program Files"), PathBuf::from(r"C:\Program Files (x86)")];
	}
	let installs = [
		r"Google\Chrome\Application\chrome.exe",
		r"Chromium\Application\chrome.exe",
		r"Microsoft\Edge\Application\msedge.exe",
	];

	let mut candidates: Vec<Candidate> = roots
		.iter()
		.flat_map(|root| installs.iter().map(move |install| Candidate::Path(root.join(install))))
		.collect();
	candidates.extend(["chrome.exe", "msedge.exe"].map(Candidate::Command));
	candidates
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |key: &str| map.get(key).cloned()
	}

	#[test]
	fn auto_detects_lambda_as_managed() {
		let env = env_from(&[("AWS_LAMBDA_FUNCTION_NAME", "scan")]);
		assert_eq!(RuntimeKind::Auto.detect(&env), RuntimeKind::Managed);
		assert_eq!(RuntimeKind::Auto.detect(&env_from(&[])), RuntimeKind::Local);
		assert_eq!(RuntimeKind::Auto.detect(&env_from(&[("VERCEL", "")])), RuntimeKind::Local);
	}

	#[test]
	fn explicit_kind_ignores_environment() {
		let env = env_from(&[("VERCEL", "1")]);
		assert_eq!(RuntimeKind::Local.detect(&env), RuntimeKind::Local);
	}

	#[test]
	fn managed_plan_prefers_chromium_path_env() {
		let env = env_from(&[("VERCEL", "1"), ("CHROMIUM_PATH", "/opt/chromium/chrome")]);
		let plan = resolve_plan(RuntimeKind::Auto, None, &env).unwrap();
		assert_eq!(plan.runtime, RuntimeKind::Managed);
		assert_eq!(plan.executable, PathBuf::from("/opt/chromium/chrome"));
		assert!(plan.args.iter().any(|a| a == "--single-process"));
		assert!(plan.args.iter().any(|a| a == "--no-sandbox"));
	}

	#[test]
	fn managed_plan_defaults_to_tmp_binary() {
		let plan = resolve_plan(RuntimeKind::Managed, None, &env_from(&[])).unwrap();
		assert_eq!(plan.executable, PathBuf::from(DEFAULT_MANAGED_EXECUTABLE));
	}

	#[test]
	fn local_plan_uses_override_without_discovery() {
		let plan = resolve_plan(RuntimeKind::Local, Some(Path::new("/usr/local/bin/chrome")), &env_from(&[])).unwrap();
		assert_eq!(plan.runtime, RuntimeKind::Local);
		assert_eq!(plan.executable, PathBuf::from("/usr/local/bin/chrome"));
		assert!(!plan.args.iter().any(|a| a == "--single-process"));
	}

	#[test]
	fn windows_candidates_fall_back_to_program_files() {
		let candidates = windows_candidates(Vec::new());
		assert!(candidates.contains(&Candidate::Path(PathBuf::from(r"C:\Program Files").join(r"Google\Chrome\Application\chrome.exe"))));
		assert_eq!(candidates.last(), Some(&Candidate::Command("msedge.exe")));
	}

	#[test]
	fn missing_path_candidate_does_not_resolve() {
		assert_eq!(Candidate::Path(PathBuf::from("/nonexistent/chrome")).resolve(), None);
	}
}

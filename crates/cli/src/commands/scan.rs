use std::path::Path;

use a11y_protocol::{ScanReport, ScanRequest};

use super::{build_orchestrator, load_config};
use crate::cli::ScanArgs;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::orchestrator::validate_url;
use crate::output::{CommandResult, OutputFormat, print_result};

const COMMAND: &str = "scan";

pub async fn run(args: ScanArgs, config_path: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
	match execute(args, config_path).await {
		Ok(report) => {
			print_result(&CommandResult::success(COMMAND, report), format);
			Ok(())
		}
		Err(err) => {
			print_result(&CommandResult::failure(COMMAND, err.to_payload()), format);
			Err(err.into())
		}
	}
}

async fn execute(args: ScanArgs, config_path: Option<&Path>) -> Result<ScanReport, ScanError> {
	let request = ScanRequest::new(args.url.clone());
	// Reject bad input before touching the network or a browser.
	validate_url(&request)?;

	let mut config = load_config(config_path)?;
	apply_flags(&mut config, &args);
	config.validate()?;

	let orchestrator = build_orchestrator(config).await.map_err(|err| ScanError::Internal(err.to_string()))?;
	orchestrator.scan(&request).await
}

fn apply_flags(config: &mut ScanConfig, args: &ScanArgs) {
	if let Some(max) = args.max_enriched {
		config.max_enriched_findings = max;
	}
	if let Some(timeout_ms) = args.timeout_ms {
		config.overall_timeout_ms = timeout_ms;
	}
	if args.no_ai {
		config.ai.api_key = None;
		config.ai_summary = false;
	}
}

use std::process::ExitCode;

use a11y_cli::cli::Cli;
use a11y_cli::{commands, logging};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	match commands::dispatch(cli).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!(target: "a11y", error = %err, "command failed");
			ExitCode::FAILURE
		}
	}
}

use std::path::Path;
use std::sync::Arc;

use super::{build_orchestrator, load_config};
use crate::cli::ServeArgs;
use crate::server;

pub async fn run(args: ServeArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
	let config = load_config(config_path)?;
	let orchestrator = Arc::new(build_orchestrator(config).await?);
	server::serve(args.listen, orchestrator).await
}

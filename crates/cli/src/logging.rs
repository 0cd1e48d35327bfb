use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` takes precedence over `verbosity`.
pub fn init_logging(verbosity: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.try_init();
}

fn default_directives(verbosity: u8) -> String {
	let level = match verbosity {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	format!("{level},chromiumoxide=warn,hyper=warn,reqwest=warn")
}

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "a11y-scan")]
#[command(about = "Headless-browser accessibility scanner with AI explanations")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format for scan results
	#[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
	pub format: OutputFormat,

	/// JSON configuration file
	#[arg(short, long, global = true, value_name = "FILE", env = "A11Y_CONFIG")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Scan one URL and print the report
	Scan(ScanArgs),

	/// Serve the scan API over HTTP
	Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
	/// Page to scan (http or https)
	pub url: String,

	/// Number of findings to explain
	#[arg(long, value_name = "N")]
	pub max_enriched: Option<usize>,

	/// Overall scan deadline in milliseconds
	#[arg(long, value_name = "MS")]
	pub timeout_ms: Option<u64>,

	/// Skip AI explanations and the page summary
	#[arg(long)]
	pub no_ai: bool,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
	/// Address to bind
	#[arg(long, default_value = "127.0.0.1:3000", env = "A11Y_LISTEN")]
	pub listen: SocketAddr,
}

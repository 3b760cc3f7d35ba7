use clap::Parser;
use std::path::PathBuf;

/// Command-line surface. Flags left unset fall back to the config file and
/// then to the built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "volley")]
#[command(version, about = "Fire N plain-HTTP GET requests at a URL and report latency")]
pub struct Cli {
    /// Target URL (http only)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Number of requests to make [default: 1]
    #[arg(short = 'n', value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub requests: Option<u32>,

    /// Number of requests in flight at once [default: 1]
    #[arg(short = 'c', value_name = "C", value_parser = clap::value_parser!(u32).range(1..))]
    pub concurrency: Option<u32>,

    /// YAML file with target, run and metrics settings
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print Prometheus metrics to stderr after the report
    #[arg(long)]
    pub metrics: bool,
}

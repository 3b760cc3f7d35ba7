use clap::{CommandFactory, Parser};
use std::io;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use volley::cli::Cli;
use volley::{metrics, run_load, ConsoleProgress, Target};
use volley_common::FileConfig;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout is reserved for the report
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .init();

    info!("Structured logging initialized (JSON)");
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let Some(raw_url) = cli.url.clone().or_else(|| file.target.clone()) else {
        eprintln!("{}", Cli::command().render_help());
        return Ok(());
    };

    let target = Target::parse(&raw_url)?;
    let config = file.run_config(cli.requests, cli.concurrency)?;
    let print_metrics = cli.metrics || file.metrics_enabled();
    metrics::register_metrics();

    println!("Statistics for requests to {}", raw_url);

    let mut progress = ConsoleProgress::new(io::stdout());
    let report = run_load(target, config, &mut progress).await;
    print!("\n{}", report);

    if print_metrics {
        eprint!("{}", metrics::render_metrics());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run aborted");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

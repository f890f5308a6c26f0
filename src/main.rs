use anyhow::{Context, Result};
use clap::Parser;
use rice_doctor_api::ai::build_completion_client;
use rice_doctor_api::models::{AnalysisMode, Config};
use rice_doctor_api::server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "rice-doctor-api")]
#[command(about = "Serve rice leaf analysis, agriculture chat, and weather insights")]
struct CliArgs {
    /// Listen address, overriding BIND_ADDR.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Leaf analysis mode (`plain` or `rewrite`), overriding ANALYSIS_MODE.
    #[arg(long, value_name = "MODE", value_parser = parse_mode_arg)]
    mode: Option<AnalysisMode>,
}

fn parse_mode_arg(input: &str) -> std::result::Result<AnalysisMode, String> {
    input.parse().map_err(|e: rice_doctor_api::Error| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rice_doctor_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting rice-doctor-api");

    let args = CliArgs::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(mode) = args.mode {
        config.analysis_mode = mode;
    }

    let ai = build_completion_client(&config);

    if let Err(e) = server::serve(&config, ai).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

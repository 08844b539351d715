use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oracle_common::config::OracleConfig;
use oracle_node::api::{self, AppState};
use oracle_node::PriceAggregator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};

const DEFAULT_CONFIG_PATH: &str = "config/oracle.toml";

#[derive(Parser)]
#[command(name = "oracle-node")]
#[command(about = "Multi-exchange consensus price oracle")]
struct Cli {
    /// 설정 파일 경로 (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 심볼 가격 조회 (합의 가격)
    Price {
        /// Symbol, e.g. BTC
        symbol: String,

        /// Query only this source instead of aggregating
        #[arg(long)]
        source: Option<String>,
    },

    /// HTTP API 서버 실행
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// List the active price sources
    Sources,
}

/// An explicitly given file must exist; the default path is optional
fn load_config(path: Option<&Path>) -> Result<OracleConfig> {
    match path {
        Some(path) => OracleConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => OracleConfig::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH)),
        None => {
            warn!("No config file at {}, using defaults", DEFAULT_CONFIG_PATH);
            Ok(OracleConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).init();

    let config = load_config(cli.config.as_deref())?;
    let aggregator =
        PriceAggregator::from_config(&config).context("Failed to initialize price sources")?;

    match cli.command {
        Commands::Price { symbol, source } => {
            let quote = match source {
                Some(source) => aggregator.fetch_from_source(&symbol, &source).await?,
                None => aggregator.fetch_and_aggregate(&symbol).await?,
            };
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Commands::Serve { host, port } => {
            let addr = format!(
                "{}:{}",
                host.unwrap_or_else(|| config.server.host.clone()),
                port.unwrap_or(config.server.port)
            );
            info!("🚀 Starting price oracle API...");
            let state = Arc::new(AppState::new(aggregator, &config.symbols));
            api::serve(state, &addr).await?;
        }
        Commands::Sources => {
            for name in aggregator.source_names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

//! Netting node binary
//!
//! Reads a JSON batch of payment intents, submits them through the system
//! actor, runs one netting pass and prints the result as JSON.
//!
//! ```text
//! netting-node batch.json
//! NETTING_CONFIG=netting.toml netting-node batch.json
//! ```

use anyhow::Context;
use netting_core::{
    config::LogFormat, spawn_from_config, AccountId, Amount, Config, NettedLeg, NettingReport,
    PoolId,
};
use serde::{Deserialize, Serialize};

/// One entry of the input batch
#[derive(Debug, Deserialize)]
struct Intent {
    from: AccountId,
    to: AccountId,
    amount: Amount,
    #[serde(default)]
    pool: Option<PoolId>,
}

#[derive(Debug, Serialize)]
struct Output {
    pool_symbol: String,
    report: NettingReport,
    netted: Vec<NettedLeg>,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    // Logs go to stderr, stdout carries the JSON result
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn load_config() -> anyhow::Result<Config> {
    match std::env::var("NETTING_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading config {}", path)),
        Err(_) => Config::from_env().context("loading config from environment"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(config.log_format);

    let batch_path = std::env::args()
        .nth(1)
        .context("usage: netting-node <batch.json>")?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        policy = ?config.netting.output_policy,
        "Starting netting node"
    );

    let content = std::fs::read_to_string(&batch_path)
        .with_context(|| format!("reading batch {}", batch_path))?;
    let intents: Vec<Intent> =
        serde_json::from_str(&content).with_context(|| format!("parsing batch {}", batch_path))?;

    let pool_id = PoolId::new(config.pool.pool_id.clone());
    let handle = spawn_from_config(&config)?;

    for intent in intents {
        let pool = intent.pool.unwrap_or_else(|| pool_id.clone());
        handle
            .intent_to_pay(intent.from, intent.to, intent.amount, pool)
            .await?;
    }

    let report = handle.perform_netting().await?;

    let mut netted = Vec::with_capacity(report.output_legs);
    let total = handle.num_netted().await?;
    for index in total - report.output_legs..total {
        netted.push(handle.netted_payment(index).await?);
    }

    let output = Output {
        pool_symbol: config.pool.symbol.clone(),
        report,
        netted,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    handle.shutdown().await?;
    tracing::info!("Netting node finished");
    Ok(())
}

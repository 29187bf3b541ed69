/*
 * stablequote - Stablecoin DEX quoting
 * Main entry point for the command-line tool
 */

use anyhow::Context;
use chrono::Utc;
use ethers::types::Address;
use rust_decimal::Decimal;
use stablequote::{
    config::{Config, OutputFormat},
    dex::{create_adapter, DexAdapter},
    metrics::QuoteMetrics,
    rpc::{ChainClient, RpcClient},
    tokens::TokenRegistry,
    PriceQuoter, Quote, QuoterError,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct QuoteJob {
    token_in: Address,
    token_out: Address,
    pair: String,
    amount: Decimal,
    adapter: Arc<dyn DexAdapter>,
}

type JobOutcome = Result<Quote, QuoterError>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting stablequote");

    let config = Config::from_env()
        .map_err(|e| {
            error!("Failed to load configuration: {}", e);
            e
        })
        .context("Invalid configuration")?;

    info!("Configuration loaded successfully");

    let rpc = RpcClient::connect(
        &config.node.rpc_url,
        config.node.chain_id,
        config.node.call_timeout(),
    )
    .await
    .context("Cannot reach the Ethereum node")?;

    let block = rpc.block_number().await;
    match &block {
        Ok(number) => info!(block = number, "Latest block"),
        Err(e) => warn!("Could not read latest block: {}", e),
    }

    let chain: Arc<dyn ChainClient> = Arc::new(rpc);
    let registry = Arc::new(TokenRegistry::new(config.token_specs(), chain.clone())?);
    let metrics = Arc::new(QuoteMetrics::new()?);
    let quoter = Arc::new(PriceQuoter::new(registry.clone()).with_metrics(metrics.clone()));

    let jobs = build_jobs(&config, &registry, &chain)?;
    info!("Running {} quotes", jobs.len());

    match block {
        Ok(number) => println!(
            "Stablecoin quotes at block {number} ({})",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        ),
        Err(_) => println!("Stablecoin quotes ({})", Utc::now().format("%Y-%m-%d %H:%M:%S")),
    }

    let outcomes = if config.concurrent {
        run_concurrent(&quoter, &jobs).await
    } else {
        run_sequential(&quoter, &jobs).await
    };

    for (job, outcome) in jobs.iter().zip(&outcomes) {
        report(job, outcome, config.output)?;
    }

    let (ok, failed) = metrics.totals();
    info!("Finished: {} quotes succeeded, {} failed", ok, failed);

    if let Some(path) = &config.metrics_file {
        std::fs::write(path, metrics.encode_text()?)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        info!("Metrics written to {}", path.display());
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stablequote=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_jobs(
    config: &Config,
    registry: &TokenRegistry,
    chain: &Arc<dyn ChainClient>,
) -> anyhow::Result<Vec<QuoteJob>> {
    let mut jobs = Vec::new();

    for venue in &config.venues {
        let adapter = create_adapter(venue, chain.clone(), registry)
            .with_context(|| format!("Failed to set up venue {}", venue.name()))?;
        info!("{} adapter initialized", venue.name());

        for pair in &config.pairs {
            let token_in = registry
                .by_symbol(&pair.token_in)
                .with_context(|| format!("Unknown token {}", pair.token_in))?;
            let token_out = registry
                .by_symbol(&pair.token_out)
                .with_context(|| format!("Unknown token {}", pair.token_out))?;

            jobs.push(QuoteJob {
                token_in: token_in.address,
                token_out: token_out.address,
                pair: format!("{}/{}", token_in.symbol, token_out.symbol),
                amount: pair.amount()?,
                adapter: adapter.clone(),
            });
        }
    }

    Ok(jobs)
}

async fn run_sequential(quoter: &PriceQuoter, jobs: &[QuoteJob]) -> Vec<JobOutcome> {
    let mut outcomes = Vec::with_capacity(jobs.len());
    for job in jobs {
        outcomes.push(
            quoter
                .quote(job.token_in, job.token_out, job.amount, job.adapter.as_ref())
                .await,
        );
    }
    outcomes
}

async fn run_concurrent(quoter: &Arc<PriceQuoter>, jobs: &[QuoteJob]) -> Vec<JobOutcome> {
    let mut set = JoinSet::new();
    for (index, job) in jobs.iter().enumerate() {
        let quoter = quoter.clone();
        let adapter = job.adapter.clone();
        let (token_in, token_out, amount) = (job.token_in, job.token_out, job.amount);
        set.spawn(async move {
            let outcome = quoter
                .quote(token_in, token_out, amount, adapter.as_ref())
                .await;
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<JobOutcome>> = jobs.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(e) => error!("Quote task aborted: {}", e),
        }
    }

    slots
        .into_iter()
        .zip(jobs)
        .map(|(slot, job)| {
            slot.unwrap_or_else(|| {
                Err(QuoterError::TaskAborted(format!(
                    "{} quote via {} did not complete",
                    job.pair,
                    job.adapter.name()
                )))
            })
        })
        .collect()
}

fn report(job: &QuoteJob, outcome: &JobOutcome, format: OutputFormat) -> anyhow::Result<()> {
    match (format, outcome) {
        (OutputFormat::Text, Ok(quote)) => {
            println!("{quote}");
            println!(
                "  1 {} = {:.6} {}",
                quote.token_in.symbol,
                quote.rate(),
                quote.token_out.symbol
            );
        }
        (OutputFormat::Text, Err(e)) => {
            println!("{} via {}: {}", job.pair, job.adapter.name(), e);
        }
        (OutputFormat::Json, Ok(quote)) => {
            println!("{}", serde_json::to_string(quote)?);
        }
        (OutputFormat::Json, Err(e)) => {
            let line = serde_json::json!({
                "dex": job.adapter.name(),
                "pair": job.pair,
                "error": e.to_string(),
            });
            println!("{line}");
        }
    }
    Ok(())
}

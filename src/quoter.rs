/*
 * Price quoter: decimal normalization around a DEX adapter call
 */

use chrono::Utc;
use ethers::types::Address;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use crate::{
    dex::DexAdapter,
    metrics::QuoteMetrics,
    models::{Quote, QuoterError, Result},
    tokens::TokenRegistry,
    utils::{scale_amount, unscale_amount},
};

pub struct PriceQuoter {
    registry: Arc<TokenRegistry>,
    metrics: Option<Arc<QuoteMetrics>>,
}

impl PriceQuoter {
    #[must_use]
    pub fn new(registry: Arc<TokenRegistry>) -> Self {
        Self {
            registry,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<QuoteMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub async fn quote(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: Decimal,
        adapter: &dyn DexAdapter,
    ) -> Result<Quote> {
        let started = Instant::now();
        let result = self.quote_inner(token_in, token_out, amount_in, adapter).await;

        if let Some(metrics) = &self.metrics {
            metrics.observe(adapter.name(), result.is_ok(), started.elapsed().as_secs_f64());
        }

        match &result {
            Ok(quote) => info!(
                dex = adapter.name(),
                amount_in = %quote.amount_in,
                amount_out = %quote.amount_out,
                "{}/{} quoted",
                quote.token_in.symbol,
                quote.token_out.symbol
            ),
            Err(e) => warn!(dex = adapter.name(), ?token_in, ?token_out, "Quote failed: {e}"),
        }

        result
    }

    async fn quote_inner(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: Decimal,
        adapter: &dyn DexAdapter,
    ) -> Result<Quote> {
        if amount_in <= Decimal::ZERO {
            return Err(QuoterError::InvalidAmount(format!(
                "Amount must be positive, got {amount_in}"
            )));
        }
        if token_in == token_out {
            return Err(QuoterError::InvalidPair(format!(
                "Cannot quote {token_in:?} against itself"
            )));
        }

        let token_in = self.registry.resolve(token_in).await?;
        let token_out = self.registry.resolve(token_out).await?;

        let amount_in_raw = scale_amount(amount_in, token_in.decimals)?;
        debug!(
            dex = adapter.name(),
            %amount_in_raw,
            decimals_in = token_in.decimals,
            decimals_out = token_out.decimals,
            "Requesting amount out"
        );

        let amount_out_raw = adapter
            .get_amount_out(token_in.address, token_out.address, amount_in_raw)
            .await?;
        let amount_out = unscale_amount(amount_out_raw, token_out.decimals)?;

        Ok(Quote {
            timestamp_utc: Utc::now(),
            dex: adapter.name().to_string(),
            token_in,
            token_out,
            amount_in,
            amount_in_raw,
            amount_out_raw,
            amount_out,
        })
    }
}

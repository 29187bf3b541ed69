/*
 * DEX adapters: one quoting capability, three protocol families
 */

pub mod concentrated;
pub mod constant_product;
pub mod stable_swap;

use async_trait::async_trait;
use ethers::types::{Address, U256};
use std::sync::Arc;
use crate::config::VenueConfig;
use crate::models::{QuoterError, Result};
use crate::rpc::ChainClient;
use crate::tokens::TokenRegistry;

pub use concentrated::{ConcentratedLiquidityQuoterAdapter, FeeTier, QuoterVersion};
pub use constant_product::ConstantProductRouterAdapter;
pub use stable_swap::{CoinIndexMap, CoinIndexType, StableSwapPoolAdapter};

#[async_trait]
pub trait DexAdapter: Send + Sync {
    /// Display name, e.g. "Uniswap V2".
    fn name(&self) -> &str;

    /// Raw output for a raw input, both in the tokens' smallest units.
    async fn get_amount_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in_raw: U256,
    ) -> Result<U256>;
}

pub fn create_adapter(
    venue: &VenueConfig,
    chain: Arc<dyn ChainClient>,
    registry: &TokenRegistry,
) -> Result<Arc<dyn DexAdapter>> {
    let adapter: Arc<dyn DexAdapter> = match venue {
        VenueConfig::ConstantProductRouter { name, router } => Arc::new(
            ConstantProductRouterAdapter::new(name.clone(), *router, chain)?,
        ),
        VenueConfig::ConcentratedLiquidityQuoter {
            name,
            quoter,
            fee,
            version,
        } => Arc::new(ConcentratedLiquidityQuoterAdapter::new(
            name.clone(),
            *quoter,
            *fee,
            *version,
            chain,
        )?),
        VenueConfig::StableSwapPool {
            name,
            pool,
            coins,
            coin_index_type,
        } => {
            let mut indices = CoinIndexMap::default();
            for (symbol, index) in coins {
                let spec = registry.by_symbol(symbol).ok_or_else(|| {
                    QuoterError::ConfigError(format!(
                        "Venue {name} lists coin {symbol}, which is not a configured token"
                    ))
                })?;
                if !indices.insert(spec.address, *index) {
                    return Err(QuoterError::ConfigError(format!(
                        "Venue {name} lists coin {symbol} twice"
                    )));
                }
            }
            Arc::new(StableSwapPoolAdapter::new(
                name.clone(),
                *pool,
                *coin_index_type,
                indices,
                registry.addresses(),
                chain,
            )?)
        }
    };
    Ok(adapter)
}

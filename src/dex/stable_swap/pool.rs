/*
 * StableSwap pool adapter quoting through get_dy
 */

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::types::{Address, U256};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use crate::abi;
use crate::dex::DexAdapter;
use crate::models::{QuoterError, Result, Unavailable};
use crate::rpc::{ChainClient, ChainError};
use super::index::{discover_coin_indices, CoinIndexMap, CoinIndexType};

/// Outcome of the latest discovery pass and the tokens it searched for.
#[derive(Debug)]
struct DiscoveryPass {
    targets: Vec<Address>,
    coins: CoinIndexMap,
}

impl DiscoveryPass {
    /// A token the pass neither found nor searched for may still be in the pool.
    fn answers(&self, token: &Address) -> bool {
        self.coins.get(token).is_some() || self.targets.contains(token)
    }
}

pub struct StableSwapPoolAdapter {
    name: String,
    pool: Address,
    index_type: CoinIndexType,
    static_indices: CoinIndexMap,
    discovery_targets: Vec<Address>,
    discovered: Mutex<Option<DiscoveryPass>>,
    chain: Arc<dyn ChainClient>,
    abi: Abi,
}

impl StableSwapPoolAdapter {
    /// `discovery_targets` are the tokens probed for when the static table
    /// misses. A pass is shared by later quotes until one asks for a token
    /// that pass never searched for.
    pub fn new(
        name: impl Into<String>,
        pool: Address,
        index_type: CoinIndexType,
        static_indices: CoinIndexMap,
        discovery_targets: Vec<Address>,
        chain: Arc<dyn ChainClient>,
    ) -> Result<Self> {
        let abi = match index_type {
            CoinIndexType::Uint256 => abi::load(abi::STABLE_SWAP_POOL_UINT_COINS)?,
            CoinIndexType::Int128 => abi::load(abi::STABLE_SWAP_POOL_INT_COINS)?,
        };

        Ok(Self {
            name: name.into(),
            pool,
            index_type,
            static_indices,
            discovery_targets,
            discovered: Mutex::new(None),
            chain,
            abi,
        })
    }

    async fn resolve_indices(&self, token_in: Address, token_out: Address) -> Result<(u32, u32)> {
        if let (Some(i), Some(j)) = (
            self.static_indices.get(&token_in),
            self.static_indices.get(&token_out),
        ) {
            return Ok((i, j));
        }

        let mut cached = self.discovered.lock().await;

        let unanswered = [token_in, token_out].into_iter().any(|token| {
            self.static_indices.get(&token).is_none()
                && !cached.as_ref().is_some_and(|pass| pass.answers(&token))
        });

        if unanswered {
            debug!(dex = %self.name, "Coin indices unknown, discovering");

            let mut targets = cached
                .as_ref()
                .map_or_else(|| self.discovery_targets.clone(), |pass| pass.targets.clone());
            for token in [token_in, token_out] {
                if !targets.contains(&token) {
                    targets.push(token);
                }
            }

            let coins = discover_coin_indices(
                self.chain.as_ref(),
                self.pool,
                &self.abi,
                self.index_type,
                &targets,
            )
            .await
            .map_err(|e: ChainError| QuoterError::unavailable(&self.name, e.into()))?;

            info!(dex = %self.name, coins = coins.len(), "Discovered pool coin indices");
            *cached = Some(DiscoveryPass { targets, coins });
        }

        let lookup = |token: Address| {
            self.static_indices
                .get(&token)
                .or_else(|| cached.as_ref().and_then(|pass| pass.coins.get(&token)))
                .ok_or(QuoterError::IndexResolutionFailed {
                    pool: self.pool,
                    token,
                })
        };

        Ok((lookup(token_in)?, lookup(token_out)?))
    }
}

#[async_trait]
impl DexAdapter for StableSwapPoolAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_amount_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in_raw: U256,
    ) -> Result<U256> {
        let (i, j) = self.resolve_indices(token_in, token_out).await?;

        let args = [
            Token::Int(U256::from(i)),
            Token::Int(U256::from(j)),
            Token::Uint(amount_in_raw),
        ];

        let output = self
            .chain
            .call(self.pool, &self.abi, "get_dy", &args)
            .await
            .map_err(|e| QuoterError::unavailable(&self.name, e.into()))?;

        let amount_out = match output.first() {
            Some(Token::Uint(amount)) => *amount,
            other => {
                return Err(QuoterError::unavailable(
                    &self.name,
                    Unavailable::Decode(format!("get_dy returned {other:?}")),
                ))
            }
        };

        if amount_out.is_zero() {
            return Err(QuoterError::unavailable(
                &self.name,
                Unavailable::NoLiquidity("get_dy quoted zero output".to_string()),
            ));
        }

        debug!(dex = %self.name, i, j, %amount_in_raw, %amount_out, "get_dy");
        Ok(amount_out)
    }
}

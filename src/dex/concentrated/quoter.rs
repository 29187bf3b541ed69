/*
 * Single-hop quoter adapter for fee-tiered concentrated-liquidity pools
 */

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::types::{Address, U256};
use std::sync::Arc;
use tracing::{debug, warn};
use crate::abi;
use crate::dex::DexAdapter;
use crate::models::{QuoterError, Result, Unavailable};
use crate::rpc::{ChainClient, ChainError};
use super::types::{FeeTier, QuoterVersion};

const QUOTE_FUNCTION: &str = "quoteExactInputSingle";

pub struct ConcentratedLiquidityQuoterAdapter {
    name: String,
    quoter: Address,
    fee: FeeTier,
    version: QuoterVersion,
    chain: Arc<dyn ChainClient>,
    abi: Abi,
}

impl ConcentratedLiquidityQuoterAdapter {
    pub fn new(
        name: impl Into<String>,
        quoter: Address,
        fee: FeeTier,
        version: QuoterVersion,
        chain: Arc<dyn ChainClient>,
    ) -> Result<Self> {
        let abi = match version {
            QuoterVersion::V1 => abi::load(abi::CONCENTRATED_QUOTER_V1)?,
            QuoterVersion::V2 => abi::load(abi::CONCENTRATED_QUOTER_V2)?,
        };

        Ok(Self {
            name: name.into(),
            quoter,
            fee,
            version,
            chain,
            abi,
        })
    }

    #[must_use]
    pub fn fee(&self) -> FeeTier {
        self.fee
    }

    /// Same quoter at another fee tier, for callers that retry on a missing pool.
    pub fn with_fee(&self, fee: FeeTier) -> Self {
        Self {
            name: self.name.clone(),
            quoter: self.quoter,
            fee,
            version: self.version,
            chain: self.chain.clone(),
            abi: self.abi.clone(),
        }
    }

    fn encode_args(&self, token_in: Address, token_out: Address, amount_in_raw: U256) -> Vec<Token> {
        let fee = Token::Uint(U256::from(self.fee.raw()));
        // A zero sqrtPriceLimitX96 disables the price limit.
        let no_price_limit = Token::Uint(U256::zero());

        match self.version {
            QuoterVersion::V1 => vec![
                Token::Address(token_in),
                Token::Address(token_out),
                fee,
                Token::Uint(amount_in_raw),
                no_price_limit,
            ],
            QuoterVersion::V2 => vec![Token::Tuple(vec![
                Token::Address(token_in),
                Token::Address(token_out),
                Token::Uint(amount_in_raw),
                fee,
                no_price_limit,
            ])],
        }
    }

    fn fee_tier_unavailable(&self, detail: String) -> QuoterError {
        QuoterError::unavailable(
            &self.name,
            Unavailable::FeeTierUnavailable {
                fee: self.fee.raw(),
                detail,
            },
        )
    }
}

#[async_trait]
impl DexAdapter for ConcentratedLiquidityQuoterAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_amount_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in_raw: U256,
    ) -> Result<U256> {
        let args = self.encode_args(token_in, token_out, amount_in_raw);

        let output = match self.chain.call(self.quoter, &self.abi, QUOTE_FUNCTION, &args).await {
            Ok(output) => output,
            Err(ChainError::Revert(msg)) => {
                warn!(dex = %self.name, fee = self.fee.raw(), "Quoter reverted: {msg}");
                return Err(self.fee_tier_unavailable(msg));
            }
            Err(other) => return Err(QuoterError::unavailable(&self.name, other.into())),
        };

        let amount_out = match output.first() {
            Some(Token::Uint(amount)) => *amount,
            other => {
                return Err(QuoterError::unavailable(
                    &self.name,
                    Unavailable::Decode(format!("{QUOTE_FUNCTION} returned {other:?}")),
                ))
            }
        };

        if amount_out.is_zero() {
            return Err(self.fee_tier_unavailable("quoted zero output".to_string()));
        }

        debug!(dex = %self.name, fee = %self.fee, %amount_in_raw, %amount_out, "{QUOTE_FUNCTION}");
        Ok(amount_out)
    }
}

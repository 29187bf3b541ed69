/*
 * Router adapter quoting through getAmountsOut over a direct two-token path
 */

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::types::{Address, U256};
use std::sync::Arc;
use tracing::debug;
use crate::abi;
use crate::dex::DexAdapter;
use crate::models::{QuoterError, Result, Unavailable};
use crate::rpc::ChainClient;

pub struct ConstantProductRouterAdapter {
    name: String,
    router: Address,
    chain: Arc<dyn ChainClient>,
    abi: Abi,
}

impl ConstantProductRouterAdapter {
    pub fn new(name: impl Into<String>, router: Address, chain: Arc<dyn ChainClient>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            router,
            chain,
            abi: abi::load(abi::CONSTANT_PRODUCT_ROUTER)?,
        })
    }

    fn unavailable(&self, reason: Unavailable) -> QuoterError {
        QuoterError::unavailable(&self.name, reason)
    }
}

#[async_trait]
impl DexAdapter for ConstantProductRouterAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_amount_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in_raw: U256,
    ) -> Result<U256> {
        let path = vec![Token::Address(token_in), Token::Address(token_out)];
        let args = [Token::Uint(amount_in_raw), Token::Array(path)];

        let output = self
            .chain
            .call(self.router, &self.abi, "getAmountsOut", &args)
            .await
            .map_err(|e| self.unavailable(e.into()))?;

        let amounts = match output.into_iter().next() {
            Some(Token::Array(amounts)) => amounts,
            other => {
                return Err(self.unavailable(Unavailable::Decode(format!(
                    "getAmountsOut returned {other:?}"
                ))))
            }
        };

        let amount_out = match amounts.last() {
            Some(Token::Uint(amount)) => *amount,
            Some(other) => {
                return Err(self.unavailable(Unavailable::Decode(format!(
                    "getAmountsOut element {other:?} is not an integer"
                ))))
            }
            None => {
                return Err(self.unavailable(Unavailable::NoLiquidity(
                    "router returned an empty amounts array".to_string(),
                )))
            }
        };

        if amount_out.is_zero() {
            return Err(self.unavailable(Unavailable::NoLiquidity(
                "router quoted zero output".to_string(),
            )));
        }

        debug!(dex = %self.name, %amount_in_raw, %amount_out, "getAmountsOut");
        Ok(amount_out)
    }
}

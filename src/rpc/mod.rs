/*
 * Read-only chain access: the ChainClient seam and its JSON-RPC implementation
 */

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::{Address, Bytes, TransactionRequest};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{QuoterError, Result, Unavailable};

/// JSON-RPC error code geth and most providers use for `execution reverted`.
const REVERT_ERROR_CODE: i64 = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("network error: {0}")]
    Network(String),

    #[error("execution reverted: {0}")]
    Revert(String),

    #[error("failed to decode return data: {0}")]
    Decode(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("function not present in interface: {0}")]
    UnknownFunction(String),
}

impl From<ChainError> for Unavailable {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Network(msg) => Unavailable::Network(msg),
            ChainError::Revert(msg) => Unavailable::Reverted(msg),
            ChainError::Decode(msg) | ChainError::UnknownFunction(msg) => Unavailable::Decode(msg),
            ChainError::Timeout(after) => Unavailable::Timeout(after),
        }
    }
}

/// Read-only contract calls against some chain backend.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn call(
        &self,
        contract: Address,
        abi: &Abi,
        function: &str,
        args: &[Token],
    ) -> std::result::Result<Vec<Token>, ChainError>;
}

pub struct RpcClient {
    provider: Arc<Provider<Http>>,
    chain_id: u64,
    call_timeout: Duration,
}

impl RpcClient {
    /// Connects and checks the node serves the expected chain.
    pub async fn connect(rpc_url: &str, chain_id: u64, call_timeout: Duration) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| QuoterError::ConnectionError(format!("Failed to create provider: {e}")))?;

        let chain = tokio::time::timeout(call_timeout, provider.get_chainid())
            .await
            .map_err(|_| {
                QuoterError::ConnectionError(format!(
                    "Node did not answer within {}ms",
                    call_timeout.as_millis()
                ))
            })?
            .map_err(|e| QuoterError::ConnectionError(format!("Failed to get chain ID: {e}")))?;

        if chain.as_u64() != chain_id {
            return Err(QuoterError::ConnectionError(format!(
                "Chain ID mismatch: expected {}, got {}",
                chain_id,
                chain.as_u64()
            )));
        }

        info!(chain_id, "Connected to node");

        Ok(Self {
            provider: Arc::new(provider),
            chain_id,
            call_timeout,
        })
    }

    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub async fn block_number(&self) -> Result<u64> {
        let block = tokio::time::timeout(self.call_timeout, self.provider.get_block_number())
            .await
            .map_err(|_| QuoterError::ConnectionError("Timed out reading block number".to_string()))?
            .map_err(|e| QuoterError::ConnectionError(format!("Failed to get block number: {e}")))?;
        Ok(block.as_u64())
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn call(
        &self,
        contract: Address,
        abi: &Abi,
        function: &str,
        args: &[Token],
    ) -> std::result::Result<Vec<Token>, ChainError> {
        let func = abi
            .function(function)
            .map_err(|_| ChainError::UnknownFunction(function.to_string()))?;
        let call_data = func
            .encode_input(args)
            .map_err(|e| ChainError::Decode(format!("cannot encode {function} arguments: {e}")))?;

        let tx = TransactionRequest::new()
            .to(contract)
            .data(Bytes::from(call_data));

        debug!(?contract, function, "eth_call");

        let result = tokio::time::timeout(self.call_timeout, self.provider.call(&tx.into(), None))
            .await
            .map_err(|_| ChainError::Timeout(self.call_timeout))?
            .map_err(classify_provider_error)?;

        if result.is_empty() {
            return Err(ChainError::Revert(format!("{function} returned no data")));
        }

        func.decode_output(&result)
            .map_err(|e| ChainError::Decode(format!("{function}: {e}")))
    }
}

fn classify_provider_error(err: ProviderError) -> ChainError {
    if let Some(rpc_err) = err.as_error_response() {
        if rpc_err.code == REVERT_ERROR_CODE || rpc_err.message.to_lowercase().contains("revert") {
            return ChainError::Revert(rpc_err.message.clone());
        }
        return ChainError::Network(format!("{} (code {})", rpc_err.message, rpc_err.code));
    }
    ChainError::Network(err.to_string())
}

/*
 * Token metadata: the static token table plus a read-through decimals cache
 */

use ethers::abi::{Abi, Token as AbiToken};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::abi;
use crate::models::{QuoterError, Result};
use crate::rpc::{ChainClient, ChainError};

/// Reported as the source of transient `decimals()` failures.
const DECIMALS_SOURCE: &str = "token registry";

/// A token with its decimal count resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

/// A configured token whose decimals may still need to be read from chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpec {
    pub symbol: String,
    pub address: Address,
    pub decimals: Option<u8>,
}

pub struct TokenRegistry {
    chain: Arc<dyn ChainClient>,
    erc20: Abi,
    known: HashMap<Address, TokenSpec>,
    fetched_decimals: RwLock<HashMap<Address, u8>>,
}

impl TokenRegistry {
    pub fn new(specs: Vec<TokenSpec>, chain: Arc<dyn ChainClient>) -> Result<Self> {
        let mut known = HashMap::with_capacity(specs.len());
        for spec in specs {
            if let Some(previous) = known.insert(spec.address, spec.clone()) {
                return Err(QuoterError::ConfigError(format!(
                    "Token {:?} configured twice ({} and {})",
                    spec.address, previous.symbol, spec.symbol
                )));
            }
        }

        Ok(Self {
            chain,
            erc20: abi::load(abi::ERC20)?,
            known,
            fetched_decimals: RwLock::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenSpec> {
        self.known
            .values()
            .find(|spec| spec.symbol.eq_ignore_ascii_case(symbol))
    }

    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        self.known.keys().copied().collect()
    }

    pub async fn resolve(&self, address: Address) -> Result<Token> {
        let decimals = self.decimals(address).await?;
        let symbol = self
            .known
            .get(&address)
            .map_or_else(|| format!("{address:?}"), |spec| spec.symbol.clone());

        Ok(Token {
            symbol,
            address,
            decimals,
        })
    }

    /// Static table first, then a `decimals()` call cached for the process lifetime.
    pub async fn decimals(&self, address: Address) -> Result<u8> {
        if let Some(decimals) = self.known.get(&address).and_then(|spec| spec.decimals) {
            return Ok(decimals);
        }

        if let Some(decimals) = self.fetched_decimals.read().await.get(&address) {
            return Ok(*decimals);
        }

        let fetched = self.fetch_decimals(address).await?;

        // Concurrent fetches may race here; the first published value wins.
        let mut cache = self.fetched_decimals.write().await;
        Ok(*cache.entry(address).or_insert(fetched))
    }

    async fn fetch_decimals(&self, address: Address) -> Result<u8> {
        debug!(?address, "Fetching token decimals from chain");

        let output = self
            .chain
            .call(address, &self.erc20, "decimals", &[])
            .await
            .map_err(|e| {
                warn!(?address, error = %e, "decimals() call failed");
                match e {
                    ChainError::Timeout(_) | ChainError::Network(_) => {
                        QuoterError::unavailable(DECIMALS_SOURCE, e.into())
                    }
                    ChainError::Revert(_) | ChainError::Decode(_) | ChainError::UnknownFunction(_) => {
                        QuoterError::UnknownToken(format!("{address:?}: decimals() failed: {e}"))
                    }
                }
            })?;

        match output.first() {
            Some(AbiToken::Uint(value)) if *value <= U256::from(u8::MAX) => Ok(value.as_u32() as u8),
            other => Err(QuoterError::UnknownToken(format!(
                "{address:?}: unexpected decimals() result {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unavailable;
    use async_trait::async_trait;
    use std::time::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DecimalsChain {
        decimals: Option<u8>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChainClient for DecimalsChain {
        async fn call(
            &self,
            _contract: Address,
            _abi: &Abi,
            function: &str,
            _args: &[AbiToken],
        ) -> std::result::Result<Vec<AbiToken>, ChainError> {
            assert_eq!(function, "decimals");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.decimals
                .map(|d| vec![AbiToken::Uint(U256::from(d))])
                .ok_or_else(|| ChainError::Revert("not a token".to_string()))
        }
    }

    fn registry(chain: Arc<DecimalsChain>, specs: Vec<TokenSpec>) -> TokenRegistry {
        TokenRegistry::new(specs, chain).unwrap()
    }

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[tokio::test]
    async fn static_decimals_skip_the_chain() {
        let chain = Arc::new(DecimalsChain { decimals: Some(99), calls: AtomicUsize::new(0) });
        let reg = registry(
            chain.clone(),
            vec![TokenSpec { symbol: "USDT".into(), address: addr(1), decimals: Some(6) }],
        );

        let token = reg.resolve(addr(1)).await.unwrap();
        assert_eq!(token.decimals, 6);
        assert_eq!(token.symbol, "USDT");
        assert_eq!(chain.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetched_decimals_are_cached() {
        let chain = Arc::new(DecimalsChain { decimals: Some(18), calls: AtomicUsize::new(0) });
        let reg = registry(
            chain.clone(),
            vec![TokenSpec { symbol: "DAI".into(), address: addr(2), decimals: None }],
        );

        assert_eq!(reg.decimals(addr(2)).await.unwrap(), 18);
        assert_eq!(reg.decimals(addr(2)).await.unwrap(), 18);
        assert_eq!(chain.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unresolvable_decimals_are_unknown_token() {
        let chain = Arc::new(DecimalsChain { decimals: None, calls: AtomicUsize::new(0) });
        let reg = registry(chain, vec![]);

        assert!(matches!(
            reg.resolve(addr(3)).await,
            Err(QuoterError::UnknownToken(_))
        ));
    }

    /// Times out until `healthy` is set, then answers 18.
    struct FlakyChain {
        healthy: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl ChainClient for FlakyChain {
        async fn call(
            &self,
            _contract: Address,
            _abi: &Abi,
            _function: &str,
            _args: &[AbiToken],
        ) -> std::result::Result<Vec<AbiToken>, ChainError> {
            if self.healthy.load(Ordering::SeqCst) {
                Ok(vec![AbiToken::Uint(U256::from(18))])
            } else {
                Err(ChainError::Timeout(Duration::from_millis(10)))
            }
        }
    }

    #[tokio::test]
    async fn decimals_timeout_is_transient_and_not_cached() {
        let chain = Arc::new(FlakyChain { healthy: false.into() });
        let reg = TokenRegistry::new(vec![], chain.clone()).unwrap();

        match reg.resolve(addr(6)).await {
            Err(QuoterError::QuoteUnavailable { reason, .. }) => {
                assert!(matches!(reason, Unavailable::Timeout(_)));
                assert!(reason.is_transient());
            }
            other => panic!("unexpected result {other:?}"),
        }

        chain.healthy.store(true, Ordering::SeqCst);
        assert_eq!(reg.decimals(addr(6)).await.unwrap(), 18);
    }

    #[test]
    fn duplicate_addresses_are_rejected() {
        let chain = Arc::new(DecimalsChain { decimals: None, calls: AtomicUsize::new(0) });
        let specs = vec![
            TokenSpec { symbol: "A".into(), address: addr(4), decimals: Some(6) },
            TokenSpec { symbol: "B".into(), address: addr(4), decimals: Some(6) },
        ];
        assert!(TokenRegistry::new(specs, chain).is_err());
    }

    #[test]
    fn symbol_lookup_ignores_case() {
        let chain = Arc::new(DecimalsChain { decimals: None, calls: AtomicUsize::new(0) });
        let reg = registry(
            chain,
            vec![TokenSpec { symbol: "USDC".into(), address: addr(5), decimals: Some(6) }],
        );
        assert_eq!(reg.by_symbol("usdc").map(|s| s.address), Some(addr(5)));
        assert!(reg.by_symbol("DAI").is_none());
    }
}

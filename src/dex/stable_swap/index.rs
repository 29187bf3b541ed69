/*
 * Pool-internal coin indices and their discovery by probing coins(i)
 */

use ethers::abi::{Abi, Token};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use crate::rpc::{ChainClient, ChainError};
use super::DISCOVERY_SLACK;

/// Argument type of the pool's `coins` accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinIndexType {
    #[default]
    Uint256,
    Int128,
}

impl CoinIndexType {
    fn encode(self, index: u32) -> Token {
        match self {
            Self::Uint256 => Token::Uint(U256::from(index)),
            Self::Int128 => Token::Int(U256::from(index)),
        }
    }
}

/// Token address to coin index. Each token holds exactly one index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinIndexMap {
    indices: HashMap<Address, u32>,
}

impl CoinIndexMap {
    /// Returns false, leaving the map untouched, if the token already has an index.
    pub fn insert(&mut self, token: Address, index: u32) -> bool {
        if self.indices.contains_key(&token) {
            return false;
        }
        self.indices.insert(token, index);
        true
    }

    #[must_use]
    pub fn get(&self, token: &Address) -> Option<u32> {
        self.indices.get(token).copied()
    }

    #[must_use]
    pub fn contains_all(&self, tokens: &[Address]) -> bool {
        tokens.iter().all(|token| self.indices.contains_key(token))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl FromIterator<(Address, u32)> for CoinIndexMap {
    fn from_iter<I: IntoIterator<Item = (Address, u32)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (token, index) in iter {
            map.insert(token, index);
        }
        map
    }
}

/// Probes `coins(0)`, `coins(1)`, ... until every wanted token is found, the
/// accessor reverts (end of the coin list), or `wanted + DISCOVERY_SLACK`
/// probes were spent. Every coin seen is recorded, wanted or not, so the
/// result may hold extra coins and may miss wanted ones.
///
/// Transport failures abort discovery instead of ending it, so the caller can
/// tell "not in this pool" apart from "could not ask".
pub async fn discover_coin_indices(
    chain: &dyn ChainClient,
    pool: Address,
    abi: &Abi,
    index_type: CoinIndexType,
    wanted: &[Address],
) -> Result<CoinIndexMap, ChainError> {
    let mut found = CoinIndexMap::default();
    let max_probes = wanted.len() + DISCOVERY_SLACK;

    for index in (0u32..).take(max_probes) {
        if found.contains_all(wanted) {
            break;
        }

        let output = match chain.call(pool, abi, "coins", &[index_type.encode(index)]).await {
            Ok(output) => output,
            Err(ChainError::Revert(_) | ChainError::Decode(_)) => {
                debug!(?pool, index, "coins() ended");
                break;
            }
            Err(other) => return Err(other),
        };

        match output.first() {
            Some(Token::Address(coin)) => {
                found.insert(*coin, index);
            }
            _ => break,
        }
    }

    debug!(?pool, found = found.len(), wanted = wanted.len(), "Coin index discovery finished");
    Ok(found)
}

/*
 * Configuration management for the quoter
 */

use crate::dex::concentrated::UNISWAP_V3_QUOTER_V2_ADDRESS;
use crate::dex::constant_product::{SUSHISWAP_ROUTER_ADDRESS, UNISWAP_V2_ROUTER_ADDRESS};
use crate::dex::stable_swap::CURVE_3POOL_ADDRESS;
use crate::dex::{CoinIndexType, FeeTier, QuoterVersion};
use crate::models::{QuoterError, Result};
use crate::tokens::TokenSpec;
use crate::utils::{parse_address, parse_amount};
use config::{Environment, File};
use ethers::types::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const USDT_ADDRESS: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
pub const USDC_ADDRESS: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const DAI_ADDRESS: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";

const DEFAULT_CONFIG_FILE: &str = "stablequote";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub node: NodeConfig,
    #[serde(default = "default_tokens")]
    pub tokens: Vec<TokenConfig>,
    #[serde(default = "default_venues")]
    pub venues: Vec<VenueConfig>,
    #[serde(default = "default_pairs")]
    pub pairs: Vec<PairConfig>,
    #[serde(default)]
    pub concurrent: bool,
    #[serde(default)]
    pub output: OutputFormat,
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl NodeConfig {
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    pub symbol: String,
    #[serde(deserialize_with = "deserialize_address")]
    pub address: Address,
    #[serde(default)]
    pub decimals: Option<u8>,
}

impl From<&TokenConfig> for TokenSpec {
    fn from(token: &TokenConfig) -> Self {
        TokenSpec {
            symbol: token.symbol.clone(),
            address: token.address,
            decimals: token.decimals,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VenueConfig {
    ConstantProductRouter {
        name: String,
        #[serde(deserialize_with = "deserialize_address")]
        router: Address,
    },
    ConcentratedLiquidityQuoter {
        name: String,
        #[serde(deserialize_with = "deserialize_address")]
        quoter: Address,
        #[serde(default)]
        fee: FeeTier,
        #[serde(default)]
        version: QuoterVersion,
    },
    StableSwapPool {
        name: String,
        #[serde(deserialize_with = "deserialize_address")]
        pool: Address,
        /// Token symbol to coin index; tokens missing here are discovered.
        #[serde(default)]
        coins: BTreeMap<String, u32>,
        #[serde(default)]
        coin_index_type: CoinIndexType,
    },
}

impl VenueConfig {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::ConstantProductRouter { name, .. }
            | Self::ConcentratedLiquidityQuoter { name, .. }
            | Self::StableSwapPool { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PairConfig {
    pub token_in: String,
    pub token_out: String,
    #[serde(default = "default_amount")]
    pub amount: String,
}

impl PairConfig {
    pub fn amount(&self) -> Result<Decimal> {
        parse_amount(&self.amount)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    /// Layers `.env`, an optional config file, `STABLEQUOTE_*` variables and
    /// `ETHEREUM_RPC_URL`, in increasing precedence.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let file = env::var("STABLEQUOTE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let settings = config::Config::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::with_prefix("STABLEQUOTE").separator("__"))
            .set_override_option("node.rpc_url", env::var("ETHEREUM_RPC_URL").ok())
            .map_err(|e| QuoterError::ConfigError(e.to_string()))?
            .build()
            .map_err(|e| QuoterError::ConfigError(e.to_string()))?;

        Self::from_settings(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(File::from_str(text, config::FileFormat::Toml))
            .build()
            .map_err(|e| QuoterError::ConfigError(e.to_string()))?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: config::Config) -> Result<Self> {
        let config: Config = settings
            .try_deserialize()
            .map_err(|e| QuoterError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn token_specs(&self) -> Vec<TokenSpec> {
        self.tokens.iter().map(TokenSpec::from).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.node.rpc_url.trim().is_empty() {
            return Err(QuoterError::ConfigError("node.rpc_url is empty".to_string()));
        }
        if self.node.call_timeout_ms == 0 {
            return Err(QuoterError::ConfigError("node.call_timeout_ms must be positive".to_string()));
        }

        let mut symbols = HashSet::new();
        for token in &self.tokens {
            if !symbols.insert(token.symbol.to_uppercase()) {
                return Err(QuoterError::ConfigError(format!(
                    "Token symbol {} configured twice",
                    token.symbol
                )));
            }
        }

        let mut venue_names = HashSet::new();
        for venue in &self.venues {
            if !venue_names.insert(venue.name()) {
                return Err(QuoterError::ConfigError(format!(
                    "Venue {} configured twice",
                    venue.name()
                )));
            }
            if let VenueConfig::StableSwapPool { name, coins, .. } = venue {
                for symbol in coins.keys() {
                    if !symbols.contains(&symbol.to_uppercase()) {
                        return Err(QuoterError::ConfigError(format!(
                            "Venue {name} lists unknown coin {symbol}"
                        )));
                    }
                }
            }
        }

        for pair in &self.pairs {
            for symbol in [&pair.token_in, &pair.token_out] {
                if !symbols.contains(&symbol.to_uppercase()) {
                    return Err(QuoterError::ConfigError(format!(
                        "Pair {}/{} uses unknown token {symbol}",
                        pair.token_in, pair.token_out
                    )));
                }
            }
            if pair.token_in.eq_ignore_ascii_case(&pair.token_out) {
                return Err(QuoterError::ConfigError(format!(
                    "Pair {}/{} quotes a token against itself",
                    pair.token_in, pair.token_out
                )));
            }
            pair.amount()
                .map_err(|e| QuoterError::ConfigError(format!("Pair {}/{}: {e}", pair.token_in, pair.token_out)))?;
        }

        Ok(())
    }
}

fn deserialize_address<'de, D>(deserializer: D) -> std::result::Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_address(&text).map_err(serde::de::Error::custom)
}

fn default_chain_id() -> u64 {
    1
}

fn default_call_timeout_ms() -> u64 {
    10_000
}

fn default_amount() -> String {
    "100".to_string()
}

fn builtin_address(text: &str) -> Address {
    parse_address(text).unwrap_or_default()
}

fn default_tokens() -> Vec<TokenConfig> {
    [("USDT", USDT_ADDRESS, 6), ("USDC", USDC_ADDRESS, 6), ("DAI", DAI_ADDRESS, 18)]
        .into_iter()
        .map(|(symbol, address, decimals)| TokenConfig {
            symbol: symbol.to_string(),
            address: builtin_address(address),
            decimals: Some(decimals),
        })
        .collect()
}

fn default_venues() -> Vec<VenueConfig> {
    vec![
        VenueConfig::StableSwapPool {
            name: "Curve 3pool".to_string(),
            pool: builtin_address(CURVE_3POOL_ADDRESS),
            coins: BTreeMap::from([
                ("DAI".to_string(), 0),
                ("USDC".to_string(), 1),
                ("USDT".to_string(), 2),
            ]),
            coin_index_type: CoinIndexType::Uint256,
        },
        VenueConfig::ConstantProductRouter {
            name: "SushiSwap".to_string(),
            router: builtin_address(SUSHISWAP_ROUTER_ADDRESS),
        },
        VenueConfig::ConstantProductRouter {
            name: "Uniswap V2".to_string(),
            router: builtin_address(UNISWAP_V2_ROUTER_ADDRESS),
        },
        VenueConfig::ConcentratedLiquidityQuoter {
            name: "Uniswap V3".to_string(),
            quoter: builtin_address(UNISWAP_V3_QUOTER_V2_ADDRESS),
            fee: FeeTier::Lowest,
            version: QuoterVersion::V2,
        },
    ]
}

fn default_pairs() -> Vec<PairConfig> {
    [("USDT", "USDC"), ("USDT", "DAI"), ("USDC", "DAI")]
        .into_iter()
        .map(|(token_in, token_out)| PairConfig {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount: default_amount(),
        })
        .collect()
}

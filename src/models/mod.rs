/*
 * Data models and error types for the stablecoin quoter
 */

use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::tokens::Token;

/// Result of a single quoting operation. Valid only for the block it was read at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub timestamp_utc: DateTime<Utc>,
    pub dex: String,
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: Decimal,
    pub amount_in_raw: U256,
    pub amount_out_raw: U256,
    pub amount_out: Decimal,
}

impl Quote {
    /// Output tokens received per one unit of input.
    #[must_use]
    pub fn rate(&self) -> Decimal {
        if self.amount_in.is_zero() {
            return Decimal::ZERO;
        }
        self.amount_out / self.amount_in
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} = {:.6} {} (via {})",
            self.amount_in.normalize(),
            self.token_in.symbol,
            self.amount_out,
            self.token_out.symbol,
            self.dex
        )
    }
}

/// Why a venue could not produce a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    Reverted(String),
    /// The pool for this fee tier does not exist or lacks liquidity.
    FeeTierUnavailable { fee: u32, detail: String },
    NoLiquidity(String),
    Decode(String),
    Timeout(Duration),
    Network(String),
}

impl Unavailable {
    /// Network hiccups and timeouts may succeed on a later attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
    }

    #[must_use]
    pub fn is_retryable_with_other_fee(&self) -> bool {
        matches!(self, Self::FeeTierUnavailable { .. })
    }
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reverted(msg) => write!(f, "call reverted: {msg}"),
            Self::FeeTierUnavailable { fee, detail } => {
                write!(f, "no usable pool at fee tier {fee}: {detail}")
            }
            Self::NoLiquidity(msg) => write!(f, "no liquidity: {msg}"),
            Self::Decode(msg) => write!(f, "undecodable result: {msg}"),
            Self::Timeout(after) => write!(f, "timed out after {}ms", after.as_millis()),
            Self::Network(msg) => write!(f, "network failure: {msg}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum QuoterError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid pair: {0}")]
    InvalidPair(String),

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Coin index resolution failed for {token:?} in pool {pool:?}")]
    IndexResolutionFailed { pool: Address, token: Address },

    #[error("Quote unavailable from {dex}: {reason}")]
    QuoteUnavailable { dex: String, reason: Unavailable },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Quote task aborted: {0}")]
    TaskAborted(String),
}

impl QuoterError {
    pub fn unavailable(dex: impl Into<String>, reason: Unavailable) -> Self {
        Self::QuoteUnavailable {
            dex: dex.into(),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, QuoterError>;

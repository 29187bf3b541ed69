/*
 * Concentrated-liquidity (Uniswap V3 style) quoter integration
 */

mod quoter;
mod types;

pub use quoter::ConcentratedLiquidityQuoterAdapter;
pub use types::{FeeTier, QuoterVersion};

pub const UNISWAP_V3_QUOTER_V2_ADDRESS: &str = "0x61fFE014bA17989E743c5F6cB21bF9697530B21e";

/*
 * StableSwap (Curve style) pool integration
 */

mod index;
mod pool;

pub use index::{discover_coin_indices, CoinIndexMap, CoinIndexType};
pub use pool::StableSwapPoolAdapter;

pub const CURVE_3POOL_ADDRESS: &str = "0xbEbc44782C7dB0a1A60Cb6fe97d0b483032FF1C7";

/// Probes allowed beyond the number of requested tokens.
pub const DISCOVERY_SLACK: usize = 2;

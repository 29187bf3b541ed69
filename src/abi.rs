/*
 * Minimal contract interfaces for every call the quoter makes
 */

use ethers::abi::{parse_abi, Abi};

use crate::models::{QuoterError, Result};

pub const ERC20: &[&str] = &["function decimals() external view returns (uint8)"];

pub const CONSTANT_PRODUCT_ROUTER: &[&str] = &[
    "function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts)",
];

/// QuoterV1 takes flat arguments.
pub const CONCENTRATED_QUOTER_V1: &[&str] = &[
    "function quoteExactInputSingle(address tokenIn, address tokenOut, uint24 fee, uint256 amountIn, uint160 sqrtPriceLimitX96) external returns (uint256 amountOut)",
];

/// QuoterV2 takes one struct and returns the post-swap price alongside the amount.
pub const CONCENTRATED_QUOTER_V2: &[&str] = &[
    "function quoteExactInputSingle(tuple(address tokenIn, address tokenOut, uint256 amountIn, uint24 fee, uint160 sqrtPriceLimitX96) params) external returns (uint256 amountOut, uint160 sqrtPriceX96After, uint32 initializedTicksCrossed, uint256 gasEstimate)",
];

pub const STABLE_SWAP_POOL_UINT_COINS: &[&str] = &[
    "function coins(uint256 arg0) external view returns (address)",
    "function get_dy(int128 i, int128 j, uint256 dx) external view returns (uint256)",
];

/// Pre-0.2 Vyper pools index `coins` with int128.
pub const STABLE_SWAP_POOL_INT_COINS: &[&str] = &[
    "function coins(int128 arg0) external view returns (address)",
    "function get_dy(int128 i, int128 j, uint256 dx) external view returns (uint256)",
];

pub fn load(signatures: &[&str]) -> Result<Abi> {
    parse_abi(signatures).map_err(|e| QuoterError::ConfigError(format!("Invalid ABI fragment: {e}")))
}

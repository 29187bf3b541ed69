/*
 * stablequote - Stablecoin DEX quoting
 * Core library exports and module declarations
 */

pub mod abi;
pub mod config;
pub mod dex;
pub mod metrics;
pub mod models;
pub mod quoter;
pub mod rpc;
pub mod tokens;
pub mod utils;

pub use config::Config;
pub use models::*;
pub use quoter::PriceQuoter;

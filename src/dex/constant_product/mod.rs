/*
 * Constant-product (Uniswap V2 style) router integration
 */

mod router;

pub use router::ConstantProductRouterAdapter;

pub const UNISWAP_V2_ROUTER_ADDRESS: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";
pub const SUSHISWAP_ROUTER_ADDRESS: &str = "0xd9e1cE17f2641f24aE83637ab66a2cca9C378B9F";

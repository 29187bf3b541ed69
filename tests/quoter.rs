mod common;

use common::*;
use ethers::abi::Token;
use ethers::types::U256;
use rust_decimal::Decimal;
use stablequote::dex::ConstantProductRouterAdapter;
use stablequote::metrics::{QuoteMetrics, OUTCOME_ERROR, OUTCOME_OK};
use stablequote::rpc::ChainError;
use stablequote::tokens::TokenSpec;
use stablequote::utils::amount_from_f64;
use stablequote::{PriceQuoter, QuoterError, Unavailable};
use std::str::FromStr;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn router_stub(amount_out: &'static str) -> Arc<StubChain> {
    StubChain::new(move |_, function, args| match function {
        "getAmountsOut" => {
            let amount_out = U256::from_dec_str(amount_out).unwrap();
            Ok(vec![Token::Array(vec![args[0].clone(), Token::Uint(amount_out)])])
        }
        "decimals" => Ok(vec![uint(18)]),
        other => panic!("unexpected call {other}"),
    })
}

fn router(chain: &Arc<StubChain>) -> ConstantProductRouterAdapter {
    ConstantProductRouterAdapter::new("Uniswap V2", ethers::types::Address::repeat_byte(0xaa), chain.clone())
        .unwrap()
}

#[tokio::test]
async fn usdt_to_dai_rescales_both_sides() {
    let chain = router_stub("99850000000000000000");
    let quoter = PriceQuoter::new(registry(chain.clone(), stable_tokens()));

    let quote = assert_ok!(
        quoter
            .quote(usdt(), dai(), Decimal::from(100), &router(&chain))
            .await
    );

    assert_eq!(quote.amount_in_raw, U256::from(100_000_000u64));
    assert_eq!(quote.amount_out_raw, U256::from_dec_str("99850000000000000000").unwrap());
    assert_eq!(quote.amount_out, Decimal::from_str("99.85").unwrap());
    assert_eq!(quote.rate(), Decimal::from_str("0.9985").unwrap());
    assert_eq!(quote.to_string(), "100 USDT = 99.850000 DAI (via Uniswap V2)");

    let calls = chain.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args[0], uint(100_000_000));
    assert_eq!(
        calls[0].args[1],
        Token::Array(vec![Token::Address(usdt()), Token::Address(dai())])
    );
}

#[tokio::test]
async fn non_positive_amounts_never_reach_the_chain() {
    let chain = router_stub("1");
    let quoter = PriceQuoter::new(registry(chain.clone(), stable_tokens()));
    let adapter = router(&chain);

    for amount in [Decimal::ZERO, Decimal::from(-5), Decimal::from_str("-0.000001").unwrap()] {
        let err = assert_err!(quoter.quote(usdt(), usdc(), amount, &adapter).await);
        assert!(matches!(err, QuoterError::InvalidAmount(_)), "{amount}: {err}");
    }

    assert!(matches!(amount_from_f64(f64::NAN), Err(QuoterError::InvalidAmount(_))));
    assert!(matches!(amount_from_f64(f64::NEG_INFINITY), Err(QuoterError::InvalidAmount(_))));
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn identical_tokens_are_rejected() {
    let chain = router_stub("1");
    let quoter = PriceQuoter::new(registry(chain.clone(), stable_tokens()));

    let err = assert_err!(quoter.quote(usdc(), usdc(), Decimal::ONE, &router(&chain)).await);
    assert!(matches!(err, QuoterError::InvalidPair(_)));
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn unresolvable_decimals_fail_before_quoting() {
    let chain = StubChain::new(|_, function, _| match function {
        "decimals" => Err(ChainError::Revert("no decimals".into())),
        other => panic!("unexpected call {other}"),
    });
    let stranger = ethers::types::Address::repeat_byte(0x99);
    let quoter = PriceQuoter::new(registry(chain.clone(), stable_tokens()));

    let err = assert_err!(quoter.quote(usdt(), stranger, Decimal::ONE, &router(&chain)).await);
    assert!(matches!(err, QuoterError::UnknownToken(_)));
    assert_eq!(chain.count("getAmountsOut"), 0);
}

#[tokio::test]
async fn on_chain_decimals_are_read_once() {
    let chain = router_stub("1000000000000000000");
    let specs = vec![
        TokenSpec { symbol: "USDT".into(), address: usdt(), decimals: Some(6) },
        TokenSpec { symbol: "DAI".into(), address: dai(), decimals: None },
    ];
    let quoter = PriceQuoter::new(registry(chain.clone(), specs));
    let adapter = router(&chain);

    for _ in 0..3 {
        let quote = assert_ok!(quoter.quote(usdt(), dai(), Decimal::ONE, &adapter).await);
        assert_eq!(quote.amount_out, Decimal::ONE);
        assert_eq!(quote.token_out.decimals, 18);
    }
    assert_eq!(chain.count("decimals"), 1);
    assert_eq!(chain.count("getAmountsOut"), 3);
}

#[tokio::test]
async fn adapter_failures_are_reported_and_counted() {
    let chain = StubChain::new(|_, _, _| Err(ChainError::Revert("UniswapV2Library: INSUFFICIENT_LIQUIDITY".into())));
    let metrics = Arc::new(QuoteMetrics::new().unwrap());
    let quoter = PriceQuoter::new(registry(chain.clone(), stable_tokens())).with_metrics(metrics.clone());
    let adapter = router(&chain);

    let err = assert_err!(quoter.quote(usdt(), dai(), Decimal::from(100), &adapter).await);
    match err {
        QuoterError::QuoteUnavailable { dex, reason: Unavailable::Reverted(msg) } => {
            assert_eq!(dex, "Uniswap V2");
            assert!(msg.contains("INSUFFICIENT_LIQUIDITY"));
        }
        other => panic!("unexpected error {other}"),
    }

    assert_eq!(metrics.count("Uniswap V2", OUTCOME_ERROR), 1);
    assert_eq!(metrics.count("Uniswap V2", OUTCOME_OK), 0);
}

#[tokio::test]
async fn independent_quotes_do_not_affect_each_other() {
    let chain = StubChain::new(|_, _, args| match &args[1] {
        Token::Array(path) if path[1] == Token::Address(usdc()) => {
            Err(ChainError::Revert("no pair".into()))
        }
        _ => Ok(vec![Token::Array(vec![args[0].clone(), uint(1_000_000_000_000_000_000)])]),
    });
    let quoter = PriceQuoter::new(registry(chain.clone(), stable_tokens()));
    let adapter = router(&chain);

    assert_err!(quoter.quote(usdt(), usdc(), Decimal::ONE, &adapter).await);
    let quote = assert_ok!(quoter.quote(usdt(), dai(), Decimal::ONE, &adapter).await);
    assert_eq!(quote.amount_out, Decimal::ONE);
}

#[tokio::test]
async fn decimals_timeout_is_reported_as_transient() {
    let chain = StubChain::new(|_, function, _| match function {
        "decimals" => Err(ChainError::Timeout(std::time::Duration::from_millis(10))),
        other => panic!("unexpected call {other}"),
    });
    let stranger = ethers::types::Address::repeat_byte(0x99);
    let quoter = PriceQuoter::new(registry(chain.clone(), stable_tokens()));

    match assert_err!(quoter.quote(usdt(), stranger, Decimal::ONE, &router(&chain)).await) {
        QuoterError::QuoteUnavailable { reason, .. } => {
            assert!(matches!(reason, Unavailable::Timeout(_)));
            assert!(reason.is_transient());
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(chain.count("getAmountsOut"), 0);
}

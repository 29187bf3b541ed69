#![allow(dead_code)]

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::types::{Address, U256};
use stablequote::rpc::{ChainClient, ChainError};
use stablequote::tokens::{TokenRegistry, TokenSpec};
use std::sync::{Arc, Mutex};

type Handler = dyn Fn(Address, &str, &[Token]) -> Result<Vec<Token>, ChainError> + Send + Sync;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub contract: Address,
    pub function: String,
    pub args: Vec<Token>,
}

/// Scripted chain: every call is recorded and answered by the handler.
pub struct StubChain {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubChain {
    pub fn new(
        handler: impl Fn(Address, &str, &[Token]) -> Result<Vec<Token>, ChainError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, function: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.function == function)
            .count()
    }
}

#[async_trait]
impl ChainClient for StubChain {
    async fn call(
        &self,
        contract: Address,
        abi: &Abi,
        function: &str,
        args: &[Token],
    ) -> Result<Vec<Token>, ChainError> {
        assert!(abi.function(function).is_ok(), "{function} missing from the adapter's ABI");
        self.calls.lock().unwrap().push(RecordedCall {
            contract,
            function: function.to_string(),
            args: args.to_vec(),
        });
        (self.handler)(contract, function, args)
    }
}

pub fn usdt() -> Address {
    Address::repeat_byte(0x11)
}

pub fn usdc() -> Address {
    Address::repeat_byte(0x22)
}

pub fn dai() -> Address {
    Address::repeat_byte(0x33)
}

pub fn uint(value: u128) -> Token {
    Token::Uint(U256::from(value))
}

pub fn stable_tokens() -> Vec<TokenSpec> {
    vec![
        TokenSpec { symbol: "USDT".into(), address: usdt(), decimals: Some(6) },
        TokenSpec { symbol: "USDC".into(), address: usdc(), decimals: Some(6) },
        TokenSpec { symbol: "DAI".into(), address: dai(), decimals: Some(18) },
    ]
}

pub fn registry(chain: Arc<StubChain>, specs: Vec<TokenSpec>) -> Arc<TokenRegistry> {
    Arc::new(TokenRegistry::new(specs, chain).unwrap())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scripted collaborators shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::api::{
    AggregatedBalance, ApiError, ChainOperation, ExecutionReceipt, OperationRecord, Quote,
    QuoteRequest, QuoteToken, SwapApi, TransactionStatus,
};
use crate::wallet::{EmbeddedWallet, WalletError};

pub const SIGNER_ADDRESS: &str = "0x1111111111111111111111111111111111111111";
pub const ACCOUNT_ADDRESS: &str = "0x2222222222222222222222222222222222222222";

pub fn operation(chain_id: u64) -> ChainOperation {
    ChainOperation {
        user_op: Map::from_iter([("sender".to_string(), json!(ACCOUNT_ADDRESS))]),
        typed_data_to_sign: json!({
            "domain": { "name": "Kernel", "chainId": chain_id },
            "types": {},
            "primaryType": "Kernel",
            "message": {}
        }),
        extra: Map::new(),
    }
}

pub fn quote(id: &str, destination_amount: &str, origin_chains: &[u64], destination: Option<u64>) -> Quote {
    Quote {
        id: id.to_string(),
        destination_token: QuoteToken {
            amount: destination_amount.to_string(),
            extra: Map::new(),
        },
        origin_chains_operations: origin_chains.iter().copied().map(operation).collect(),
        destination_chain_operation: destination.map(operation),
        extra: Map::new(),
    }
}

pub fn balance(asset_id: &str, atomic: u64) -> AggregatedBalance {
    AggregatedBalance {
        aggregated_asset_id: asset_id.to_string(),
        balance: U256::from(atomic),
        fiat_value: None,
    }
}

pub fn status(raw: &str) -> TransactionStatus {
    TransactionStatus {
        status: Some(raw.to_string()),
        ..TransactionStatus::default()
    }
}

pub fn completed_with_explorers() -> TransactionStatus {
    TransactionStatus {
        status: Some("COMPLETED".to_string()),
        origin_chain_operations: vec![OperationRecord {
            hash: Some("0xaaa".to_string()),
            chain_id: Some(42161),
            explorer_url: "https://arbiscan.io/tx/0xaaa".to_string(),
        }],
        destination_chain_operations: vec![OperationRecord {
            hash: Some("0xbbb".to_string()),
            chain_id: Some(8453),
            explorer_url: "https://basescan.org/tx/0xbbb".to_string(),
        }],
    }
}

/// A scripted response: optional latency then a result.
pub struct Scripted<T> {
    pub delay: Duration,
    pub result: Result<T, String>,
}

impl<T> Scripted<T> {
    pub fn ok(value: T) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(message.to_string()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

async fn play<T>(script: Scripted<T>) -> Result<T, ApiError> {
    if !script.delay.is_zero() {
        tokio::time::sleep(script.delay).await;
    }
    script.result.map_err(ApiError::Request)
}

/// In-memory [`SwapApi`] answering from per-endpoint scripts.
pub struct MockApi {
    pub predict: Mutex<Result<String, String>>,
    pub balances: Mutex<Result<Vec<AggregatedBalance>, String>>,
    pub balance_calls: AtomicUsize,
    pub quotes: Mutex<VecDeque<Scripted<Quote>>>,
    pub default_quote: Mutex<Option<Quote>>,
    pub quote_requests: Mutex<Vec<QuoteRequest>>,
    pub execute: Mutex<Result<(), String>>,
    pub executed: Mutex<Vec<Quote>>,
    pub statuses: Mutex<VecDeque<Scripted<TransactionStatus>>>,
    pub status_calls: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            predict: Mutex::new(Ok(ACCOUNT_ADDRESS.to_string())),
            balances: Mutex::new(Ok(vec![
                balance("ds:usdc", 10_000_000),
                balance("ds:eth", 0),
            ])),
            balance_calls: AtomicUsize::new(0),
            quotes: Mutex::new(VecDeque::new()),
            default_quote: Mutex::new(Some(quote("q-default", "2000000000000000", &[42161], Some(8453)))),
            quote_requests: Mutex::new(Vec::new()),
            execute: Mutex::new(Ok(())),
            executed: Mutex::new(Vec::new()),
            statuses: Mutex::new(VecDeque::new()),
            status_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_quote(&self, script: Scripted<Quote>) {
        self.quotes.lock().unwrap().push_back(script);
    }

    pub fn push_status(&self, script: Scripted<TransactionStatus>) {
        self.statuses.lock().unwrap().push_back(script);
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> Vec<String> {
        self.status_calls.lock().unwrap().clone()
    }

    pub fn quote_requests(&self) -> Vec<QuoteRequest> {
        self.quote_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapApi for MockApi {
    async fn predict_account_address(&self, _: &str, _: &str) -> Result<String, ApiError> {
        self.predict.lock().unwrap().clone().map_err(ApiError::Request)
    }

    async fn get_aggregated_balance(&self, _: &str) -> Result<Vec<AggregatedBalance>, ApiError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balances.lock().unwrap().clone().map_err(ApiError::Request)
    }

    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError> {
        self.quote_requests.lock().unwrap().push(request.clone());
        let script = self.quotes.lock().unwrap().pop_front();
        match script {
            Some(script) => play(script).await,
            None => self
                .default_quote
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ApiError::Request("no quote scripted".to_string())),
        }
    }

    async fn execute_quote(&self, quote: &Quote) -> Result<ExecutionReceipt, ApiError> {
        self.execute.lock().unwrap().clone().map_err(ApiError::Request)?;
        self.executed.lock().unwrap().push(quote.clone());
        Ok(ExecutionReceipt::default())
    }

    async fn check_transaction_status(&self, quote_id: &str) -> Result<TransactionStatus, ApiError> {
        self.status_calls.lock().unwrap().push(quote_id.to_string());
        let script = self.statuses.lock().unwrap().pop_front();
        match script {
            Some(script) => play(script).await,
            None => Ok(status("PENDING")),
        }
    }
}

/// How a scripted chain switch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchFailure {
    /// The user declined the prompt
    Rejected,
    /// The wallet does not know the chain
    Unsupported,
}

/// [`EmbeddedWallet`] that records every call in order.
pub struct ScriptedWallet {
    pub chain: Mutex<u64>,
    pub log: Mutex<Vec<String>>,
    pub switch_failure: Option<SwitchFailure>,
    pub fail_sign_on_call: Option<(usize, String)>,
    sign_calls: AtomicUsize,
}

impl ScriptedWallet {
    pub fn new(chain: u64) -> Self {
        Self {
            chain: Mutex::new(chain),
            log: Mutex::new(Vec::new()),
            switch_failure: None,
            fail_sign_on_call: None,
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting_switch(mut self) -> Self {
        self.switch_failure = Some(SwitchFailure::Rejected);
        self
    }

    pub fn unsupported_switch(mut self) -> Self {
        self.switch_failure = Some(SwitchFailure::Unsupported);
        self
    }

    /// Fail the `n`th signature (0-based) with `message`.
    pub fn failing_sign(mut self, n: usize, message: &str) -> Self {
        self.fail_sign_on_call = Some((n, message.to_string()));
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddedWallet for ScriptedWallet {
    fn address(&self) -> String {
        SIGNER_ADDRESS.to_string()
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(*self.chain.lock().unwrap())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        self.log.lock().unwrap().push(format!("switch:{chain_id}"));
        match self.switch_failure {
            Some(SwitchFailure::Rejected) => {
                return Err(WalletError::Signing("User rejected the request.".to_string()));
            }
            Some(SwitchFailure::Unsupported) => return Err(WalletError::UnsupportedChain(chain_id)),
            None => {}
        }
        // Yield so overlapping signing passes would interleave visibly.
        tokio::task::yield_now().await;
        *self.chain.lock().unwrap() = chain_id;
        Ok(())
    }

    async fn sign_typed_data(&self, typed_data: &Value) -> Result<String, WalletError> {
        let n = self.sign_calls.fetch_add(1, Ordering::SeqCst);
        let chain = *self.chain.lock().unwrap();
        self.log.lock().unwrap().push(format!("sign:{chain}"));
        if let Some((fail_at, message)) = &self.fail_sign_on_call {
            if *fail_at == n {
                return Err(WalletError::Signing(message.clone()));
            }
        }
        let domain_chain = typed_data
            .pointer("/domain/chainId")
            .and_then(Value::as_u64)
            .unwrap_or_default();
        Ok(format!("0xsig-{domain_chain}-{n}"))
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OneBalance API integration.
//!
//! - `types` - wire types and boundary validation
//! - `client` - reqwest HTTP client

pub mod client;
pub mod types;

use async_trait::async_trait;

pub use client::{ApiError, OneBalanceClient};
pub use types::*;

/// Balance, quote and execution operations the swap session depends on.
#[async_trait]
pub trait SwapApi: Send + Sync {
    /// Deterministically derive the smart-account address for a signer.
    async fn predict_account_address(
        &self,
        session_address: &str,
        admin_address: &str,
    ) -> Result<String, ApiError>;

    /// Aggregated balance snapshot of an account.
    async fn get_aggregated_balance(&self, address: &str)
        -> Result<Vec<AggregatedBalance>, ApiError>;

    /// Price a swap.
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError>;

    /// Submit a fully signed quote.
    async fn execute_quote(&self, quote: &Quote) -> Result<ExecutionReceipt, ApiError>;

    /// Settlement status of a submitted quote.
    async fn check_transaction_status(&self, quote_id: &str) -> Result<TransactionStatus, ApiError>;
}

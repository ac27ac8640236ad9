// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the OneBalance chain-abstraction API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use crate::config::SwapConfig;

use super::types::{
    AggregatedBalance, AggregatedBalanceResponse, ExecutionReceipt, PredictAddressRequest,
    PredictAddressResponse, Quote, QuoteRequest, TransactionStatus, TransactionStatusResponse,
};
use super::SwapApi;

const PREDICT_ADDRESS_PATH: &str = "/account/predict-address";
const AGGREGATED_BALANCE_PATH: &str = "/v2/balances/aggregated-balance";
const QUOTE_PATH: &str = "/v1/quote";
const EXECUTE_QUOTE_PATH: &str = "/quotes/execute-quote";
const EXECUTION_STATUS_PATH: &str = "/status/get-execution-status";

/// Errors returned by the OneBalance API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("OneBalance client configuration invalid: {0}")]
    Config(String),

    #[error("OneBalance request failed: {0}")]
    Request(String),

    #[error("OneBalance returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("OneBalance response was invalid: {0}")]
    InvalidResponse(String),
}

/// reqwest-backed [`SwapApi`] implementation.
#[derive(Debug, Clone)]
pub struct OneBalanceClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl OneBalanceClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        Url::parse(&base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL {base_url}: {e}")))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    pub fn from_config(config: &SwapConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, &config.api_key, config.http_timeout)
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url, path);
        if query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, query)
        }
        .map_err(|e| ApiError::Config(format!("invalid URL for {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        let response = self
            .http
            .get(url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ApiError::Request(format!("GET {path} failed: {e}")))?;

        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("GET {path} invalid JSON: {e}")))
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response, ApiError> {
        let url = self.url(path, &[])?;
        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Request(format!("POST {path} failed: {e}")))?;

        ensure_success(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.post(path, body)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { status, body })
}

#[async_trait]
impl SwapApi for OneBalanceClient {
    async fn predict_account_address(
        &self,
        session_address: &str,
        admin_address: &str,
    ) -> Result<String, ApiError> {
        let response: PredictAddressResponse = self
            .post_json(
                PREDICT_ADDRESS_PATH,
                &PredictAddressRequest {
                    session_address,
                    admin_address,
                },
            )
            .await?;

        if response.predicted_address.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "predicted address is empty".to_string(),
            ));
        }
        Ok(response.predicted_address)
    }

    async fn get_aggregated_balance(
        &self,
        address: &str,
    ) -> Result<Vec<AggregatedBalance>, ApiError> {
        let response: AggregatedBalanceResponse = self
            .get_json(AGGREGATED_BALANCE_PATH, &[("address", address)])
            .await?;
        response.validate()
    }

    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError> {
        debug!(
            from = %request.from.asset.asset_id,
            to = %request.to.asset.asset_id,
            amount = %request.from.amount,
            "Requesting quote"
        );
        let quote: Quote = self.post_json(QUOTE_PATH, request).await?;
        quote.validate()
    }

    async fn execute_quote(&self, quote: &Quote) -> Result<ExecutionReceipt, ApiError> {
        let response = self.post(EXECUTE_QUOTE_PATH, quote).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Request(format!("POST {EXECUTE_QUOTE_PATH} body: {e}")))?;

        if body.trim().is_empty() {
            return Ok(ExecutionReceipt::default());
        }
        serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("POST {EXECUTE_QUOTE_PATH} invalid JSON: {e}"))
        })
    }

    async fn check_transaction_status(&self, quote_id: &str) -> Result<TransactionStatus, ApiError> {
        let response: TransactionStatusResponse = self
            .get_json(EXECUTION_STATUS_PATH, &[("quoteId", quote_id)])
            .await?;
        Ok(response.into())
    }
}

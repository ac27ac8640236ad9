// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire types for the OneBalance API.
//!
//! Responses are decoded into these structs and then validated before they
//! leave the `api` module, so the rest of the crate never inspects untyped
//! JSON. Fields the crate does not interpret are kept in `extra` maps: a
//! quote must be sent back for execution exactly as it was issued, plus
//! signatures.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::assets::chain_name;
use crate::units::parse_atomic;

use super::ApiError;

// =============================================================================
// Account
// =============================================================================

/// Smart-account identity used in quote requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRef {
    pub session_address: String,
    pub admin_address: String,
    pub account_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PredictAddressRequest<'a> {
    pub session_address: &'a str,
    pub admin_address: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PredictAddressResponse {
    pub predicted_address: String,
}

// =============================================================================
// Balances
// =============================================================================

/// One aggregated asset bucket of an account's balance.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedBalance {
    pub aggregated_asset_id: String,
    /// Balance in smallest unit
    pub balance: U256,
    pub fiat_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AggregatedBalanceResponse {
    #[serde(default)]
    pub balance_by_aggregated_asset: Vec<AggregatedBalanceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AggregatedBalanceEntry {
    pub aggregated_asset_id: String,
    pub balance: String,
    #[serde(default)]
    pub fiat_value: Option<f64>,
}

impl AggregatedBalanceResponse {
    pub(crate) fn validate(self) -> Result<Vec<AggregatedBalance>, ApiError> {
        self.balance_by_aggregated_asset
            .into_iter()
            .map(|entry| {
                let balance = parse_atomic(&entry.balance).ok_or_else(|| {
                    ApiError::InvalidResponse(format!(
                        "balance for {} is not an atomic amount: {:?}",
                        entry.aggregated_asset_id, entry.balance
                    ))
                })?;
                Ok(AggregatedBalance {
                    aggregated_asset_id: entry.aggregated_asset_id,
                    balance,
                    fiat_value: entry.fiat_value,
                })
            })
            .collect()
    }
}

// =============================================================================
// Quotes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub asset_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteSource {
    pub account: AccountRef,
    pub asset: AssetRef,
    /// Atomic amount as a decimal string
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteTarget {
    pub asset: AssetRef,
}

/// Body of a quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteRequest {
    pub from: QuoteSource,
    pub to: QuoteTarget,
}

impl QuoteRequest {
    pub fn new(account: AccountRef, from_asset: &str, amount: U256, to_asset: &str) -> Self {
        Self {
            from: QuoteSource {
                account,
                asset: AssetRef {
                    asset_id: from_asset.to_string(),
                },
                amount: amount.to_string(),
            },
            to: QuoteTarget {
                asset: AssetRef {
                    asset_id: to_asset.to_string(),
                },
            },
        }
    }
}

/// Token leg of a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteToken {
    /// Atomic amount as a decimal string
    pub amount: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A priced offer, valid only for the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub destination_token: QuoteToken,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origin_chains_operations: Vec<ChainOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_chain_operation: Option<ChainOperation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Quote {
    /// Destination amount in smallest unit.
    ///
    /// Always succeeds for quotes returned by the client, which validates it.
    pub fn destination_amount(&self) -> Result<U256, ApiError> {
        parse_atomic(&self.destination_token.amount).ok_or_else(|| {
            ApiError::InvalidResponse(format!(
                "quote {} destination amount is not an atomic amount: {:?}",
                self.id, self.destination_token.amount
            ))
        })
    }

    pub(crate) fn validate(self) -> Result<Self, ApiError> {
        if self.id.trim().is_empty() {
            return Err(ApiError::InvalidResponse("quote id is empty".to_string()));
        }
        self.destination_amount()?;
        Ok(self)
    }
}

/// A signable unit of work within a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainOperation {
    #[serde(default)]
    pub user_op: Map<String, Value>,
    /// EIP-712 typed data (`domain`, `types`, `primaryType`, `message`)
    pub typed_data_to_sign: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct TypedDataHeader {
    domain: TypedDataDomain,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedDataDomain {
    chain_id: Option<u64>,
}

impl ChainOperation {
    /// Chain id the operation must be signed on, from its typed-data domain.
    pub fn required_chain_id(&self) -> Option<u64> {
        TypedDataHeader::deserialize(&self.typed_data_to_sign)
            .ok()
            .and_then(|header| header.domain.chain_id)
    }

    /// Copy of this operation with `signature` attached to its user operation.
    pub fn with_signature(&self, signature: String) -> Self {
        let mut signed = self.clone();
        signed
            .user_op
            .insert("signature".to_string(), Value::String(signature));
        signed
    }

    /// Signature attached to the user operation, if any.
    pub fn signature(&self) -> Option<&str> {
        self.user_op.get("signature").and_then(Value::as_str)
    }
}

/// Response of the execution endpoint. Most deployments return an empty body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecutionReceipt {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Status
// =============================================================================

/// Per-chain record of a settled leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub explorer_url: String,
}

impl OperationRecord {
    /// Display name of the chain the leg executed on.
    pub fn chain_name(&self) -> Option<String> {
        self.chain_id.map(chain_name)
    }
}

/// Execution status as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionStatus {
    /// Raw status string; normalised by the tracker
    pub status: Option<String>,
    pub origin_chain_operations: Vec<OperationRecord>,
    pub destination_chain_operations: Vec<OperationRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionStatusResponse {
    #[serde(default)]
    pub status: Option<StatusField>,
    #[serde(default)]
    pub origin_chain_operations: Vec<OperationRecord>,
    #[serde(default)]
    pub destination_chain_operations: Vec<OperationRecord>,
}

/// The status field is a plain string on most responses and `{ "status": .. }`
/// on some.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum StatusField {
    Plain(String),
    Nested { status: String },
}

impl From<TransactionStatusResponse> for TransactionStatus {
    fn from(response: TransactionStatusResponse) -> Self {
        Self {
            status: response.status.map(|field| match field {
                StatusField::Plain(status) | StatusField::Nested { status } => status,
            }),
            origin_chain_operations: response.origin_chain_operations,
            destination_chain_operations: response.destination_chain_operations,
        }
    }
}

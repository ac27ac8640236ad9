// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Quote fetching.
//!
//! A quote is only valid for the exact inputs that produced it. Those inputs
//! are captured in a [`QuoteKey`]; the session compares keys before reusing a
//! cached quote and tags each fetch with an intent number so that a response
//! for superseded inputs is discarded on arrival.

use alloy::primitives::U256;
use tracing::{debug, warn};

use crate::api::{AccountRef, ApiError, Quote, QuoteRequest, SwapApi};
use crate::units::{from_atomic, pow10};

/// The inputs a quote is priced for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteKey {
    pub account: AccountRef,
    pub from_asset: String,
    pub to_asset: String,
    /// Source amount in smallest unit
    pub amount: U256,
    /// Decimals of the destination asset, used to format the estimate
    pub to_decimals: u8,
}

impl QuoteKey {
    /// Build a key, or `None` when a quote cannot be requested: missing
    /// identity, identical assets or a non-positive amount.
    pub fn new(
        signer_address: Option<&str>,
        account_address: Option<&str>,
        from_asset: &str,
        to_asset: &str,
        amount: U256,
        to_decimals: u8,
    ) -> Option<Self> {
        let signer = signer_address.filter(|s| !s.is_empty())?;
        let account = account_address.filter(|s| !s.is_empty())?;
        if amount.is_zero() || from_asset == to_asset {
            return None;
        }
        Some(Self {
            account: AccountRef {
                session_address: signer.to_string(),
                admin_address: signer.to_string(),
                account_address: account.to_string(),
            },
            from_asset: from_asset.to_string(),
            to_asset: to_asset.to_string(),
            amount,
            to_decimals,
        })
    }

    pub fn request(&self) -> QuoteRequest {
        QuoteRequest::new(
            self.account.clone(),
            &self.from_asset,
            self.amount,
            &self.to_asset,
        )
    }
}

/// A quote together with the inputs it was priced for.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveQuote {
    pub key: QuoteKey,
    pub quote: Quote,
    /// Destination amount in smallest unit
    pub destination_amount: U256,
    /// Destination amount formatted for display
    pub estimate: String,
}

impl LiveQuote {
    /// Whether this quote may be submitted for `key`.
    pub fn matches(&self, key: &QuoteKey) -> bool {
        &self.key == key
    }
}

/// Request a quote for `key`.
pub async fn fetch_quote(api: &dyn SwapApi, key: &QuoteKey) -> Result<LiveQuote, ApiError> {
    let quote = api.get_quote(&key.request()).await.inspect_err(|e| {
        warn!(
            from = %key.from_asset,
            to = %key.to_asset,
            amount = %key.amount,
            error = %e,
            "Quote request failed"
        );
    })?;

    let destination_amount = quote.destination_amount()?;
    let estimate = from_atomic(destination_amount, key.to_decimals);
    debug!(quote_id = %quote.id, estimate = %estimate, "Received quote");

    Ok(LiveQuote {
        key: key.clone(),
        quote,
        destination_amount,
        estimate,
    })
}

/// Price of one source unit in destination units, formatted at the
/// destination's display precision.
///
/// Computed on exact integers: `dest * 10^from_decimals / from`, which is the
/// rate expressed in destination atomic units.
pub fn estimated_rate(
    from_amount: U256,
    from_decimals: u8,
    destination_amount: U256,
    to_decimals: u8,
) -> Option<String> {
    if from_amount.is_zero() || destination_amount.is_zero() {
        return None;
    }
    let rate = destination_amount.checked_mul(pow10(from_decimals))? / from_amount;
    Some(from_atomic(rate, to_decimals))
}

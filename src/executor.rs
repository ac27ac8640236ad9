// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Swap execution.

use tracing::{info, warn};

use crate::api::{Quote, SwapApi};
use crate::error::SwapError;

/// Submit a fully signed quote and return the id to track settlement by.
///
/// No retry happens here: a failed submission is final and the user starts a
/// new swap attempt.
pub async fn execute_swap(api: &dyn SwapApi, signed: &Quote) -> Result<String, SwapError> {
    info!(quote_id = %signed.id, "Submitting signed quote");

    let receipt = api
        .execute_quote(signed)
        .await
        .map_err(SwapError::execution)
        .inspect_err(|e| warn!(quote_id = %signed.id, error = %e, "Quote execution failed"))?;

    if receipt.success == Some(false) {
        let message = receipt
            .error
            .unwrap_or_else(|| "Quote execution was rejected".to_string());
        warn!(quote_id = %signed.id, error = %message, "Quote execution rejected");
        return Err(SwapError::Execution(message));
    }

    Ok(signed.id.clone())
}

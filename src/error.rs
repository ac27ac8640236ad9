// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors surfaced by the swap session.
//!
//! Every external-call failure is converted into one of these at the session
//! boundary and recorded in the published state. Polling failures and
//! timeouts are not errors: they end tracking with an `UNKNOWN` status.

use crate::api::ApiError;
use crate::wallet::WalletError;

/// User-facing message for a failed account setup.
pub const SETUP_FAILED_MESSAGE: &str = "Failed to set up OneBalance account";

/// User-facing message when the session is not ready to swap.
pub const NOT_READY_MESSAGE: &str = "Wallet not connected or OneBalance account not set up";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwapError {
    /// Signer or smart account missing
    #[error("Wallet not connected or OneBalance account not set up")]
    NotReady,

    /// Token pair or amount rejected before any network call
    #[error("{0}")]
    InvalidInput(String),

    /// Account prediction or balance fetch failed
    #[error("Failed to set up OneBalance account")]
    Setup(String),

    #[error("{0}")]
    Quote(String),

    #[error("{0}")]
    Signing(String),

    #[error("{0}")]
    Execution(String),
}

impl SwapError {
    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SwapError::NotReady => "not_ready",
            SwapError::InvalidInput(_) => "invalid_input",
            SwapError::Setup(_) => "setup",
            SwapError::Quote(_) => "quote",
            SwapError::Signing(_) => "signing",
            SwapError::Execution(_) => "execution",
        }
    }

    pub(crate) fn quote(err: ApiError) -> Self {
        SwapError::Quote(err.to_string())
    }

    pub(crate) fn execution(err: ApiError) -> Self {
        SwapError::Execution(err.to_string())
    }
}

impl From<WalletError> for SwapError {
    fn from(err: WalletError) -> Self {
        SwapError::Signing(err.to_string())
    }
}

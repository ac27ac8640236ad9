// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded-wallet integration.
//!
//! This module provides:
//! - The [`EmbeddedWallet`] contract the swap session signs through
//! - A local alloy-backed wallet implementation
//! - Quote signing across origin and destination chain operations

pub mod local;
pub mod signer;

use async_trait::async_trait;
use serde_json::Value;

pub use local::LocalWallet;
pub use signer::sign_quote;

/// An in-app signer able to switch networks and sign EIP-712 typed data.
///
/// The active chain is shared mutable state of the wallet session; callers
/// must not run two switch-then-sign sequences concurrently.
#[async_trait]
pub trait EmbeddedWallet: Send + Sync {
    /// Signer address (EIP-55 checksummed).
    fn address(&self) -> String;

    /// Currently active chain id.
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// Request a switch of the active chain.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    /// Sign EIP-712 typed data, returning a 0x-prefixed 65-byte signature.
    async fn sign_typed_data(&self, typed_data: &Value) -> Result<String, WalletError>;
}

/// Errors that can occur while signing with an embedded wallet.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("typedDataToSign.domain.chainId is missing.")]
    MissingChainId,

    #[error("Chain {0} is not supported by this wallet")]
    UnsupportedChain(u64),

    #[error("Please switch network to chainId {0}.")]
    SwitchRejected(u64),

    #[error("Invalid typed data: {0}")]
    InvalidTypedData(String),

    #[error("{0}")]
    Signing(String),
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local embedded wallet backed by an alloy private-key signer.

use std::collections::BTreeSet;
use std::sync::Mutex;

use alloy::{
    dyn_abi::TypedData,
    signers::{local::PrivateKeySigner, SignerSync},
};
use async_trait::async_trait;
use serde_json::Value;

use super::{EmbeddedWallet, WalletError};

/// Chains the local wallet accepts switching to by default.
pub const DEFAULT_SUPPORTED_CHAINS: &[u64] = &[1, 10, 137, 8453, 42161, 43114, 59144];

/// Embedded wallet holding a secp256k1 key in process memory.
#[derive(Debug)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    supported_chains: BTreeSet<u64>,
    active_chain: Mutex<u64>,
}

impl LocalWallet {
    /// Create a wallet from a hex private key (with or without 0x prefix).
    ///
    /// The wallet starts on the first supported chain.
    pub fn from_hex(private_key_hex: &str) -> Result<Self, WalletError> {
        let key_bytes = alloy::hex::decode(private_key_hex.trim())
            .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;

        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;

        Ok(Self::new(signer, DEFAULT_SUPPORTED_CHAINS.iter().copied()))
    }

    pub fn new(signer: PrivateKeySigner, supported_chains: impl IntoIterator<Item = u64>) -> Self {
        let supported_chains: BTreeSet<u64> = supported_chains.into_iter().collect();
        let initial = supported_chains.first().copied().unwrap_or(1);
        Self {
            signer,
            supported_chains,
            active_chain: Mutex::new(initial),
        }
    }

    fn active_chain(&self) -> Result<u64, WalletError> {
        self.active_chain
            .lock()
            .map(|chain| *chain)
            .map_err(|_| WalletError::Signing("wallet chain state poisoned".to_string()))
    }
}

#[async_trait]
impl EmbeddedWallet for LocalWallet {
    fn address(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        self.active_chain()
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        if !self.supported_chains.contains(&chain_id) {
            return Err(WalletError::UnsupportedChain(chain_id));
        }
        let mut active = self
            .active_chain
            .lock()
            .map_err(|_| WalletError::Signing("wallet chain state poisoned".to_string()))?;
        *active = chain_id;
        Ok(())
    }

    async fn sign_typed_data(&self, typed_data: &Value) -> Result<String, WalletError> {
        let typed: TypedData = serde_json::from_value(typed_data.clone())
            .map_err(|e| WalletError::InvalidTypedData(e.to_string()))?;

        let hash = typed
            .eip712_signing_hash()
            .map_err(|e| WalletError::InvalidTypedData(e.to_string()))?;

        let signature = self
            .signer
            .sign_hash_sync(&hash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;

        Ok(alloy::hex::encode_prefixed(signature.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Well-known development key (anvil account #0)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn mail_typed_data(chain_id: u64) -> Value {
        json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "chainId", "type": "uint256" }
                ],
                "Mail": [
                    { "name": "contents", "type": "string" }
                ]
            },
            "primaryType": "Mail",
            "domain": { "name": "Ether Mail", "chainId": chain_id },
            "message": { "contents": "Hello, Bob!" }
        })
    }

    #[test]
    fn address_from_hex_key() {
        let wallet = LocalWallet::from_hex(TEST_KEY).unwrap();
        assert_eq!(wallet.address(), TEST_ADDRESS);
    }

    #[test]
    fn rejects_invalid_key() {
        assert!(matches!(
            LocalWallet::from_hex("not-hex"),
            Err(WalletError::InvalidPrivateKey(_))
        ));
    }

    #[tokio::test]
    async fn switches_only_to_supported_chains() {
        let wallet = LocalWallet::from_hex(TEST_KEY).unwrap();
        assert_eq!(wallet.chain_id().await.unwrap(), 1);

        wallet.switch_chain(42161).await.unwrap();
        assert_eq!(wallet.chain_id().await.unwrap(), 42161);

        assert!(matches!(
            wallet.switch_chain(999).await,
            Err(WalletError::UnsupportedChain(999))
        ));
        assert_eq!(wallet.chain_id().await.unwrap(), 42161);
    }

    #[tokio::test]
    async fn signs_typed_data_deterministically() {
        let wallet = LocalWallet::from_hex(TEST_KEY).unwrap();
        let first = wallet.sign_typed_data(&mail_typed_data(1)).await.unwrap();
        let second = wallet.sign_typed_data(&mail_typed_data(1)).await.unwrap();
        let other_chain = wallet.sign_typed_data(&mail_typed_data(10)).await.unwrap();

        assert!(first.starts_with("0x"));
        assert_eq!(first.len(), 2 + 65 * 2);
        assert_eq!(first, second);
        assert_ne!(first, other_chain);
    }

    #[tokio::test]
    async fn rejects_malformed_typed_data() {
        let wallet = LocalWallet::from_hex(TEST_KEY).unwrap();
        let result = wallet.sign_typed_data(&json!({ "domain": {} })).await;
        assert!(matches!(result, Err(WalletError::InvalidTypedData(_))));
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Quote signing.
//!
//! Every chain operation of a quote is signed on the chain named in its
//! typed-data domain. Origin operations are signed strictly in order, one at a
//! time, then the destination operation. Switching networks mutates wallet
//! state, so operations are never signed concurrently.

use tracing::{debug, info, warn};

use crate::api::{ChainOperation, Quote};

use super::{EmbeddedWallet, WalletError};

/// Produce a copy of `quote` with every chain operation signed.
///
/// The input quote is left untouched. Any failure aborts the whole pass and
/// the partially signed copy is dropped.
pub async fn sign_quote(quote: &Quote, wallet: &dyn EmbeddedWallet) -> Result<Quote, WalletError> {
    info!(
        quote_id = %quote.id,
        origin_operations = quote.origin_chains_operations.len(),
        has_destination = quote.destination_chain_operation.is_some(),
        "Signing quote"
    );

    let mut origin = Vec::with_capacity(quote.origin_chains_operations.len());
    for operation in &quote.origin_chains_operations {
        origin.push(sign_operation(operation, wallet).await?);
    }

    let destination = match &quote.destination_chain_operation {
        Some(operation) => Some(sign_operation(operation, wallet).await?),
        None => None,
    };

    Ok(Quote {
        origin_chains_operations: origin,
        destination_chain_operation: destination,
        ..quote.clone()
    })
}

/// Sign a single operation on its required chain.
pub async fn sign_operation(
    operation: &ChainOperation,
    wallet: &dyn EmbeddedWallet,
) -> Result<ChainOperation, WalletError> {
    let chain_id = operation
        .required_chain_id()
        .ok_or(WalletError::MissingChainId)?;

    ensure_chain(wallet, chain_id).await?;

    let signature = wallet.sign_typed_data(&operation.typed_data_to_sign).await?;
    debug!(chain_id, "Signed chain operation");

    Ok(operation.with_signature(signature))
}

/// Switch the wallet to `chain_id` unless it is already active.
async fn ensure_chain(wallet: &dyn EmbeddedWallet, chain_id: u64) -> Result<(), WalletError> {
    let current = wallet.chain_id().await?;
    if current == chain_id {
        return Ok(());
    }

    debug!(from = current, to = chain_id, "Switching wallet chain");
    wallet.switch_chain(chain_id).await.map_err(|e| match e {
        WalletError::UnsupportedChain(id) => WalletError::UnsupportedChain(id),
        other => {
            warn!(chain_id, error = %other, "Chain switch rejected");
            WalletError::SwitchRejected(chain_id)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{quote, ScriptedWallet};

    #[tokio::test]
    async fn signs_origin_in_order_then_destination() {
        let wallet = ScriptedWallet::new(1);
        let unsigned = quote("q-1", "1", &[42161, 42161, 10], Some(8453));

        let signed = sign_quote(&unsigned, &wallet).await.unwrap();

        assert_eq!(
            wallet.log(),
            vec![
                "switch:42161",
                "sign:42161",
                "sign:42161",
                "switch:10",
                "sign:10",
                "switch:8453",
                "sign:8453",
            ]
        );
        let signatures: Vec<_> = signed
            .origin_chains_operations
            .iter()
            .map(|op| op.signature().unwrap().to_string())
            .collect();
        assert_eq!(signatures, vec!["0xsig-42161-0", "0xsig-42161-1", "0xsig-10-2"]);
        assert_eq!(
            signed.destination_chain_operation.unwrap().signature(),
            Some("0xsig-8453-3")
        );
    }

    #[tokio::test]
    async fn leaves_input_quote_unsigned() {
        let wallet = ScriptedWallet::new(42161);
        let unsigned = quote("q-1", "1", &[42161], None);

        let signed = sign_quote(&unsigned, &wallet).await.unwrap();

        assert_eq!(unsigned.origin_chains_operations[0].signature(), None);
        assert!(signed.origin_chains_operations[0].signature().is_some());
        assert_eq!(signed.id, unsigned.id);
        assert!(signed.destination_chain_operation.is_none());
    }

    #[tokio::test]
    async fn signing_failure_aborts_remaining_operations() {
        let wallet = ScriptedWallet::new(42161).failing_sign(1, "user rejected");
        let unsigned = quote("q-1", "1", &[42161, 42161], Some(8453));

        let err = sign_quote(&unsigned, &wallet).await.unwrap_err();

        assert_eq!(err.to_string(), "user rejected");
        assert_eq!(wallet.log(), vec!["sign:42161", "sign:42161"]);
    }

    #[tokio::test]
    async fn rejected_switch_is_descriptive() {
        let wallet = ScriptedWallet::new(1).rejecting_switch();
        let unsigned = quote("q-1", "1", &[137], None);

        let err = sign_quote(&unsigned, &wallet).await.unwrap_err();

        assert!(matches!(err, WalletError::SwitchRejected(137)));
        assert_eq!(err.to_string(), "Please switch network to chainId 137.");
    }

    #[tokio::test]
    async fn unsupported_chain_keeps_its_own_message() {
        let wallet = ScriptedWallet::new(1).unsupported_switch();
        let unsigned = quote("q-1", "1", &[137], None);

        let err = sign_quote(&unsigned, &wallet).await.unwrap_err();

        assert!(matches!(err, WalletError::UnsupportedChain(137)));
        assert_eq!(err.to_string(), "Chain 137 is not supported by this wallet");
    }

    #[tokio::test]
    async fn missing_chain_id_fails_before_signing() {
        let wallet = ScriptedWallet::new(1);
        let mut unsigned = quote("q-1", "1", &[1], None);
        unsigned.origin_chains_operations[0].typed_data_to_sign =
            serde_json::json!({ "domain": {} });

        let err = sign_quote(&unsigned, &wallet).await.unwrap_err();

        assert!(matches!(err, WalletError::MissingChainId));
        assert!(wallet.log().is_empty());
    }
}

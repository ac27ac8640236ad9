// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token types and asset metadata.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::api::AggregatedBalance;
use crate::units::from_atomic;

/// Default source asset when the selection needs to be re-established.
pub const DEFAULT_FROM_ASSET: &str = "ds:usdc";

/// Default destination asset when the selection needs to be re-established.
pub const DEFAULT_TO_ASSET: &str = "ds:eth";

/// Default amount pre-filled when the source is a stable coin.
pub const DEFAULT_STABLE_AMOUNT: &str = "5.00";

/// Default amount pre-filled when the source is a volatile asset.
pub const DEFAULT_VOLATILE_AMOUNT: &str = "0.001";

/// Symbols treated as 6-decimal stable coins when metadata is otherwise unknown.
const STABLE_SYMBOLS: &[&str] = &["USDC", "USDT", "EURC", "PYUSD", "USDS"];

/// Known aggregated assets: (asset id, display name, decimals).
const KNOWN_ASSETS: &[(&str, &str, u8)] = &[
    ("ds:usdc", "USD Coin", 6),
    ("ds:usdt", "Tether USD", 6),
    ("ds:eth", "Ether", 18),
    ("ds:weth", "Wrapped Ether", 18),
    ("ds:dai", "Dai Stablecoin", 18),
];

/// A swappable aggregated asset with the account's current balance.
///
/// Tokens are built from a balance snapshot and replaced wholesale on every
/// refresh; they are never mutated individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Aggregated asset id, e.g. `ds:usdc`
    pub id: String,
    /// Display symbol, e.g. `USDC`
    pub symbol: String,
    /// Display name
    pub name: String,
    /// Number of decimals
    pub decimals: u8,
    /// Balance in smallest unit
    pub balance_atomic: U256,
    /// Balance formatted at display precision
    pub balance: String,
    /// Fiat valuation of the balance, if the API reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiat_value: Option<f64>,
}

impl Token {
    /// Build a token from an aggregated balance entry.
    pub fn from_balance(entry: &AggregatedBalance) -> Self {
        let decimals = asset_decimals(&entry.aggregated_asset_id);
        Self {
            id: entry.aggregated_asset_id.clone(),
            symbol: asset_symbol(&entry.aggregated_asset_id),
            name: asset_name(&entry.aggregated_asset_id),
            decimals,
            balance_atomic: entry.balance,
            balance: from_atomic(entry.balance, decimals),
            fiat_value: entry.fiat_value,
        }
    }

    /// Whether the token is a stable coin by symbol.
    pub fn is_stable(&self) -> bool {
        is_stable_symbol(&self.symbol)
    }

    /// Default amount to pre-fill when this token becomes the swap source.
    pub fn default_amount(&self) -> &'static str {
        if self.is_stable() {
            DEFAULT_STABLE_AMOUNT
        } else {
            DEFAULT_VOLATILE_AMOUNT
        }
    }
}

/// Display symbol of a namespaced asset id (`ds:usdc` -> `USDC`).
pub fn asset_symbol(asset_id: &str) -> String {
    asset_id
        .rsplit_once(':')
        .map_or(asset_id, |(_, symbol)| symbol)
        .to_ascii_uppercase()
}

/// Display name of an asset, falling back to its symbol.
pub fn asset_name(asset_id: &str) -> String {
    KNOWN_ASSETS
        .iter()
        .find(|(id, _, _)| id.eq_ignore_ascii_case(asset_id))
        .map(|(_, name, _)| (*name).to_string())
        .unwrap_or_else(|| asset_symbol(asset_id))
}

/// Decimal precision of an asset.
///
/// Unknown assets default to 6 for stable-coin-like symbols and 18 otherwise.
pub fn asset_decimals(asset_id: &str) -> u8 {
    if let Some((_, _, decimals)) = KNOWN_ASSETS
        .iter()
        .find(|(id, _, _)| id.eq_ignore_ascii_case(asset_id))
    {
        return *decimals;
    }
    if is_stable_symbol(&asset_symbol(asset_id)) {
        6
    } else {
        18
    }
}

fn is_stable_symbol(symbol: &str) -> bool {
    STABLE_SYMBOLS.iter().any(|s| s.eq_ignore_ascii_case(symbol))
}

/// Human-readable name for an EVM chain id.
pub fn chain_name(chain_id: u64) -> String {
    let name = match chain_id {
        1 => "Ethereum",
        10 => "Optimism",
        137 => "Polygon",
        8453 => "Base",
        42161 => "Arbitrum",
        43114 => "Avalanche",
        59144 => "Linea",
        11155111 => "Sepolia Testnet",
        other => return format!("Chain {other}"),
    };
    name.to_string()
}

/// Shorten an address for display: `0x1234…abcd`.
pub fn truncate_address(address: &str) -> String {
    let address = address.trim();
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_and_decimals() {
        assert_eq!(asset_symbol("ds:usdc"), "USDC");
        assert_eq!(asset_symbol("plain"), "PLAIN");
        assert_eq!(asset_decimals("ds:usdc"), 6);
        assert_eq!(asset_decimals("ds:eth"), 18);
        assert_eq!(asset_decimals("ds:dai"), 18);
        // Unknown stable-like symbol
        assert_eq!(asset_decimals("ds:pyusd"), 6);
        assert_eq!(asset_decimals("ds:sol"), 18);
    }

    #[test]
    fn names_fall_back_to_symbol() {
        assert_eq!(asset_name("ds:usdc"), "USD Coin");
        assert_eq!(asset_name("ds:arb"), "ARB");
    }

    #[test]
    fn token_from_balance_formats_at_display_precision() {
        let entry = AggregatedBalance {
            aggregated_asset_id: "ds:usdc".to_string(),
            balance: U256::from(10_000_000u64),
            fiat_value: Some(10.0),
        };
        let token = Token::from_balance(&entry);
        assert_eq!(token.symbol, "USDC");
        assert_eq!(token.balance, "10.00");
        assert_eq!(token.default_amount(), DEFAULT_STABLE_AMOUNT);
    }

    #[test]
    fn chain_names() {
        assert_eq!(chain_name(42161), "Arbitrum");
        assert_eq!(chain_name(11155111), "Sepolia Testnet");
        assert_eq!(chain_name(999), "Chain 999");
    }

    #[test]
    fn truncates_long_addresses_only() {
        assert_eq!(
            truncate_address("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234…5678"
        );
        assert_eq!(truncate_address("0x1234"), "0x1234");
        assert_eq!(truncate_address(""), "");
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Swap - chain-abstracted token swap client
//!
//! Takes a user-entered amount through quoting, embedded-wallet signing and
//! execution on the OneBalance API, then tracks cross-chain settlement until
//! it reaches a terminal state.
//!
//! ## Modules
//!
//! - `api` - OneBalance HTTP client and wire types
//! - `assets` - Token metadata and display helpers
//! - `units` - Decimal text to atomic unit conversion
//! - `quote` - Quote fetching and staleness keys
//! - `wallet` - Embedded wallet contract and quote signing
//! - `executor` - Signed quote submission
//! - `tracker` - Settlement status polling
//! - `state` - Session state machine
//! - `session` - Orchestration of the whole swap lifecycle

pub mod api;
pub mod assets;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod quote;
pub mod session;
pub mod state;
pub mod tracker;
pub mod units;
pub mod wallet;

#[cfg(test)]
mod test_support;

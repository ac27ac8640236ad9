// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Swap Session State Machine
//!
//! All session state lives in one [`SessionState`] value. It changes only
//! through [`SessionState::apply`], which takes a named [`Action`] and
//! deterministically produces the next state. Async work (network calls,
//! timers) happens in the session and tracker; they report back by
//! dispatching actions.
//!
//! ## Transitions of the swap status
//!
//! ```text
//! StartSubmission ──► PENDING ──► (SubmissionAccepted) PENDING ─┬─► PROCESSING ─┐
//!        │                                                      ├─► COMPLETED   │
//!        └─► (SubmissionFailed) FAILED                          ├─► FAILED   ◄──┘
//!                                                               └─► UNKNOWN (timeout / poll error)
//! ```
//!
//! `COMPLETED` and `FAILED` are terminal: later status, timeout and poll-error
//! actions for the same swap are ignored.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::api::{OperationRecord, TransactionStatus};
use crate::assets::{truncate_address, Token, DEFAULT_FROM_ASSET, DEFAULT_TO_ASSET};
use crate::error::SETUP_FAILED_MESSAGE;
use crate::quote::{estimated_rate, LiveQuote, QuoteKey};
use crate::units::{is_amount_input, to_atomic};

/// Reason recorded when tracking gives up without a terminal state.
pub const TIMEOUT_REASON: &str = "Timeout while waiting for completion";

/// Reason recorded when a status poll fails.
pub const POLLING_ERROR_REASON: &str = "Polling error";

/// Amount pre-filled before the user types anything.
pub const INITIAL_AMOUNT: &str = "5.00";

/// Observable state of a submitted swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Tracking ended without a terminal state
    Unknown,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TxStatus::Completed | TxStatus::Failed)
    }

    /// Whether a swap is still in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, TxStatus::Pending | TxStatus::Processing)
    }

    /// Map a raw API status onto the local set. Anything that is not
    /// `COMPLETED`, `FAILED` or `PROCESSING` counts as `PENDING`.
    pub fn from_remote(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("COMPLETED") => TxStatus::Completed,
            Some(s) if s.eq_ignore_ascii_case("FAILED") => TxStatus::Failed,
            Some(s) if s.eq_ignore_ascii_case("PROCESSING") => TxStatus::Processing,
            _ => TxStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::Pending => "PENDING",
            TxStatus::Processing => "PROCESSING",
            TxStatus::Completed => "COMPLETED",
            TxStatus::Failed => "FAILED",
            TxStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Status of the current swap plus per-chain settlement records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapStatus {
    pub status: TxStatus,
    pub quote_id: Option<String>,
    /// Failure message, or why tracking ended in `UNKNOWN`
    pub reason: Option<String>,
    pub origin_chain_operations: Vec<OperationRecord>,
    pub destination_chain_operations: Vec<OperationRecord>,
}

impl SwapStatus {
    fn new(status: TxStatus, quote_id: Option<String>, reason: Option<String>) -> Self {
        Self {
            status,
            quote_id,
            reason,
            origin_chain_operations: Vec::new(),
            destination_chain_operations: Vec::new(),
        }
    }

    /// Explorer link of the first origin-chain leg.
    pub fn origin_explorer_url(&self) -> Option<&str> {
        self.origin_chain_operations
            .first()
            .map(|op| op.explorer_url.as_str())
    }

    /// Explorer link of the first destination-chain leg.
    pub fn destination_explorer_url(&self) -> Option<&str> {
        self.destination_chain_operations
            .first()
            .map(|op| op.explorer_url.as_str())
    }
}

/// Which side of the pair a token selection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    From,
    To,
}

/// Named session transitions.
#[derive(Debug, Clone)]
pub enum Action {
    /// An embedded signer became available
    SignerReady { address: String },
    /// The smart-account address was derived
    AccountReady { address: String },
    /// Account prediction or the initial balance fetch failed
    SetupFailed,
    /// A fresh balance snapshot replaces the token set
    BalancesLoaded { tokens: Vec<Token> },
    SelectToken { side: Side, asset_id: String },
    /// Swap the from/to tokens and pre-fill the new source's default amount
    ToggleDirection,
    SetAmount { text: String },
    StartQuoteFetch,
    ReceiveQuote {
        intent: u64,
        result: Result<LiveQuote, String>,
    },
    /// A submission was refused before any network call
    Rejected { message: String },
    StartSubmission,
    SubmissionAccepted { quote_id: String },
    SubmissionFailed { message: String },
    ReceiveStatus {
        quote_id: String,
        status: TransactionStatus,
    },
    PollFailed { quote_id: String },
    Timeout { quote_id: String },
    /// Clear quote and swap progress, keep account and tokens
    Reset,
    /// Signer went away (logout); clear everything
    Disconnected,
}

/// Result of applying an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// Action was invalid or stale in the current state; nothing changed
    Ignored,
}

/// Why a swap cannot be submitted right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapBlocker {
    /// A swap is being submitted or settled
    Busy,
    /// Signer or smart account missing
    NotReady,
    /// Two distinct tokens are not selected
    NoPair,
    /// Amount is empty, incomplete or zero
    InvalidAmount,
    /// Amount is positive but smaller than one atomic unit
    BelowMinimum,
    ExceedsBalance,
    ZeroBalance,
}

/// The whole observable state of a swap session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub signer_address: Option<String>,
    pub account_address: Option<String>,
    pub tokens: Vec<Token>,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub amount: String,
    pub quote: Option<LiveQuote>,
    pub estimate: Option<String>,
    pub fetching_quote: bool,
    pub submitting: bool,
    pub status: Option<SwapStatus>,
    pub error: Option<String>,
    /// Last submission was accepted and tracking started
    pub success: bool,
    pub is_polling: bool,
    /// Quote id of the swap currently being tracked
    pub active_quote_id: Option<String>,
    latest_intent: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            signer_address: None,
            account_address: None,
            tokens: Vec::new(),
            from_token: Some(DEFAULT_FROM_ASSET.to_string()),
            to_token: Some(DEFAULT_TO_ASSET.to_string()),
            amount: INITIAL_AMOUNT.to_string(),
            quote: None,
            estimate: None,
            fetching_quote: false,
            submitting: false,
            status: None,
            error: None,
            success: false,
            is_polling: false,
            active_quote_id: None,
            latest_intent: 0,
        }
    }
}

impl SessionState {
    /// Apply `action` and report whether anything changed.
    pub fn apply(&mut self, action: Action) -> Transition {
        match action {
            Action::SignerReady { address } => {
                self.signer_address = Some(address);
            }
            Action::AccountReady { address } => {
                self.account_address = Some(address);
            }
            Action::SetupFailed => {
                self.error = Some(SETUP_FAILED_MESSAGE.to_string());
            }
            Action::BalancesLoaded { tokens } => {
                self.tokens = tokens;
                self.ensure_selection();
                if self.error.as_deref() == Some(SETUP_FAILED_MESSAGE) {
                    self.error = None;
                }
            }
            Action::SelectToken { side, asset_id } => {
                return self.select_token(side, asset_id);
            }
            Action::ToggleDirection => {
                if self.from_token.is_none() && self.to_token.is_none() {
                    return Transition::Ignored;
                }
                std::mem::swap(&mut self.from_token, &mut self.to_token);
                if let Some(amount) = self.from().map(Token::default_amount) {
                    self.amount = amount.to_string();
                }
                self.invalidate_quote();
            }
            Action::SetAmount { text } => {
                if !is_amount_input(&text) {
                    return Transition::Ignored;
                }
                if text != self.amount {
                    self.amount = text;
                    self.invalidate_quote();
                }
            }
            Action::StartQuoteFetch => {
                self.latest_intent += 1;
                self.fetching_quote = true;
            }
            Action::ReceiveQuote { intent, result } => {
                if intent != self.latest_intent {
                    return Transition::Ignored;
                }
                self.fetching_quote = false;
                match result {
                    Ok(live) => {
                        self.estimate = Some(live.estimate.clone());
                        self.quote = Some(live);
                    }
                    Err(_) => {
                        self.estimate = None;
                        self.quote = None;
                    }
                }
            }
            Action::Rejected { message } => {
                self.error = Some(message);
            }
            Action::StartSubmission => {
                self.submitting = true;
                self.error = None;
                self.success = false;
                self.is_polling = false;
                self.active_quote_id = None;
                self.status = Some(SwapStatus::new(TxStatus::Pending, None, None));
            }
            Action::SubmissionAccepted { quote_id } => {
                self.submitting = false;
                self.success = true;
                self.is_polling = true;
                self.quote = None;
                self.estimate = None;
                self.status = Some(SwapStatus::new(
                    TxStatus::Pending,
                    Some(quote_id.clone()),
                    None,
                ));
                self.active_quote_id = Some(quote_id);
            }
            Action::SubmissionFailed { message } => {
                self.submitting = false;
                self.success = false;
                self.is_polling = false;
                self.active_quote_id = None;
                self.quote = None;
                self.status = Some(SwapStatus::new(
                    TxStatus::Failed,
                    None,
                    Some(message.clone()),
                ));
                self.error = Some(message);
            }
            Action::ReceiveStatus { quote_id, status } => {
                if !self.is_tracking(&quote_id) {
                    return Transition::Ignored;
                }
                let next = TxStatus::from_remote(status.status.as_deref());
                self.status = Some(SwapStatus {
                    status: next,
                    quote_id: Some(quote_id),
                    reason: None,
                    origin_chain_operations: status.origin_chain_operations,
                    destination_chain_operations: status.destination_chain_operations,
                });
                if next.is_terminal() {
                    self.is_polling = false;
                }
            }
            Action::PollFailed { quote_id } => {
                return self.end_tracking_unknown(&quote_id, POLLING_ERROR_REASON);
            }
            Action::Timeout { quote_id } => {
                return self.end_tracking_unknown(&quote_id, TIMEOUT_REASON);
            }
            Action::Reset => {
                self.reset_swap();
            }
            Action::Disconnected => {
                let amount = std::mem::take(&mut self.amount);
                let latest_intent = self.latest_intent;
                *self = SessionState {
                    amount,
                    latest_intent,
                    ..SessionState::default()
                };
                self.invalidate_quote();
            }
        }
        Transition::Applied
    }

    /// Intent number of the most recent quote fetch.
    pub fn latest_intent(&self) -> u64 {
        self.latest_intent
    }

    pub fn from(&self) -> Option<&Token> {
        self.token(self.from_token.as_deref()?)
    }

    pub fn to(&self) -> Option<&Token> {
        self.token(self.to_token.as_deref()?)
    }

    pub fn token(&self, asset_id: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == asset_id)
    }

    /// Signer and smart account are both known.
    pub fn is_ready(&self) -> bool {
        self.signer_address.is_some() && self.account_address.is_some()
    }

    /// A swap is being submitted or has not settled yet.
    pub fn is_busy(&self) -> bool {
        self.submitting || self.status.as_ref().is_some_and(|s| s.status.is_busy())
    }

    /// Source amount in atomic units, or zero while the input is incomplete
    /// (empty or ending in a decimal point).
    pub fn amount_atomic(&self) -> U256 {
        let Some(from) = self.from() else {
            return U256::ZERO;
        };
        if self.amount.ends_with('.') {
            return U256::ZERO;
        }
        to_atomic(&self.amount, from.decimals)
    }

    /// Inputs for a quote request, if the current state allows one.
    pub fn quote_key(&self) -> Option<QuoteKey> {
        let from = self.from()?;
        let to = self.to()?;
        QuoteKey::new(
            self.signer_address.as_deref(),
            self.account_address.as_deref(),
            &from.id,
            &to.id,
            self.amount_atomic(),
            to.decimals,
        )
    }

    /// Cached quote, if it was priced for the current inputs.
    pub fn live_quote(&self) -> Option<&LiveQuote> {
        let key = self.quote_key()?;
        self.quote.as_ref().filter(|q| q.matches(&key))
    }

    /// First reason a swap cannot be submitted, or `None` when it can.
    pub fn swap_blocker(&self) -> Option<SwapBlocker> {
        if self.is_busy() {
            return Some(SwapBlocker::Busy);
        }
        if !self.is_ready() {
            return Some(SwapBlocker::NotReady);
        }
        let (Some(from), Some(to)) = (self.from(), self.to()) else {
            return Some(SwapBlocker::NoPair);
        };
        if from.id == to.id {
            return Some(SwapBlocker::NoPair);
        }
        if from.balance_atomic.is_zero() {
            return Some(SwapBlocker::ZeroBalance);
        }
        let amount = self.amount_atomic();
        if amount.is_zero() {
            let has_nonzero_digit = self.amount.bytes().any(|b| (b'1'..=b'9').contains(&b));
            return Some(if has_nonzero_digit && !self.amount.ends_with('.') {
                SwapBlocker::BelowMinimum
            } else {
                SwapBlocker::InvalidAmount
            });
        }
        if amount > from.balance_atomic {
            return Some(SwapBlocker::ExceedsBalance);
        }
        None
    }

    pub fn swap_disabled(&self) -> bool {
        self.swap_blocker().is_some()
    }

    /// Price of one source unit, from the cached quote.
    pub fn estimated_rate(&self) -> Option<String> {
        let live = self.live_quote()?;
        let from = self.from()?;
        let to = self.to()?;
        estimated_rate(
            live.key.amount,
            from.decimals,
            live.destination_amount,
            to.decimals,
        )
    }

    /// Error to show the user. A setup failure stays visible until a balance
    /// snapshot has been loaded.
    pub fn visible_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Shortened signer address for display.
    pub fn connected_label(&self) -> String {
        truncate_address(self.signer_address.as_deref().unwrap_or_default())
    }

    fn is_tracking(&self, quote_id: &str) -> bool {
        self.active_quote_id.as_deref() == Some(quote_id)
            && !self
                .status
                .as_ref()
                .is_some_and(|s| s.status.is_terminal() || s.status == TxStatus::Unknown)
    }

    fn end_tracking_unknown(&mut self, quote_id: &str, reason: &str) -> Transition {
        if !self.is_tracking(quote_id) {
            return Transition::Ignored;
        }
        self.is_polling = false;
        self.status = Some(SwapStatus::new(
            TxStatus::Unknown,
            Some(quote_id.to_string()),
            Some(reason.to_string()),
        ));
        Transition::Applied
    }

    fn select_token(&mut self, side: Side, asset_id: String) -> Transition {
        if self.token(&asset_id).is_none() {
            return Transition::Ignored;
        }
        let (this, other) = match side {
            Side::From => (&mut self.from_token, &mut self.to_token),
            Side::To => (&mut self.to_token, &mut self.from_token),
        };
        if this.as_deref() == Some(asset_id.as_str()) {
            return Transition::Ignored;
        }
        if other.as_deref() == Some(asset_id.as_str()) {
            std::mem::swap(this, other);
        } else {
            *this = Some(asset_id);
        }
        self.invalidate_quote();
        Transition::Applied
    }

    /// Keep the current pair if still valid against the token set, otherwise
    /// fall back to the default pair, then to the first two distinct tokens.
    fn ensure_selection(&mut self) {
        let valid = |id: &Option<String>| id.as_deref().is_some_and(|id| self.token(id).is_some());
        if valid(&self.from_token) && valid(&self.to_token) && self.from_token != self.to_token {
            return;
        }

        let has = |id: &str| self.token(id).is_some();
        let (from, to) = if has(DEFAULT_FROM_ASSET) && has(DEFAULT_TO_ASSET) {
            (
                Some(DEFAULT_FROM_ASSET.to_string()),
                Some(DEFAULT_TO_ASSET.to_string()),
            )
        } else {
            let mut ids = self.tokens.iter().map(|t| t.id.clone());
            let first = ids.next();
            let second = ids.find(|id| Some(id) != first.as_ref());
            (first, second)
        };

        if (from.clone(), to.clone()) != (self.from_token.clone(), self.to_token.clone()) {
            self.from_token = from;
            self.to_token = to;
            self.invalidate_quote();
        }
    }

    /// Drop the cached quote and supersede any fetch in flight.
    fn invalidate_quote(&mut self) {
        self.quote = None;
        self.estimate = None;
        self.fetching_quote = false;
        self.latest_intent += 1;
    }

    fn reset_swap(&mut self) {
        self.invalidate_quote();
        self.submitting = false;
        self.status = None;
        self.error = None;
        self.success = false;
        self.is_polling = false;
        self.active_quote_id = None;
    }
}

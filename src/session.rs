// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Swap Session
//!
//! Orchestrates a swap from amount input to settlement: account setup,
//! debounced quote refresh, signing, execution and status tracking.
//!
//! The session owns a single [`SessionState`] held in a `watch` channel.
//! Every change goes through [`SessionState::apply`]; subscribers receive a
//! new snapshot whenever an action is applied.
//!
//! ## Concurrency
//!
//! Network calls and timers run as tokio tasks. Their results come back as
//! actions and are checked against the state on arrival:
//!
//! - quote responses carry the intent number they were requested under
//! - status results carry the quote id they were polled for
//!
//! ## Shutdown
//!
//! [`SwapSession::close`] cancels the session's root `CancellationToken`.
//! Tracking and debounce tokens are children of it, so every timer stops and
//! no action is applied afterwards.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::SwapApi;
use crate::assets::Token;
use crate::config::SwapConfig;
use crate::error::SwapError;
use crate::executor::execute_swap;
use crate::quote::{fetch_quote, LiveQuote, QuoteKey};
use crate::state::{Action, SessionState, Side, SwapBlocker, Transition, TxStatus};
use crate::tracker::{self, Flow, StatusSink, TrackerEvent, TrackingContext};
use crate::wallet::{sign_quote, EmbeddedWallet};

/// Handle to a swap session. Clones share the same session.
#[derive(Clone)]
pub struct SwapSession {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn SwapApi>,
    config: SwapConfig,
    wallet: Mutex<Option<Arc<dyn EmbeddedWallet>>>,
    updates: watch::Sender<SessionState>,
    alive: CancellationToken,
    tracking: Mutex<Option<CancellationToken>>,
    debounce: Mutex<Option<CancellationToken>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SwapSession {
    pub fn new(api: Arc<dyn SwapApi>, config: SwapConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                config,
                wallet: Mutex::new(None),
                updates: watch::Sender::new(SessionState::default()),
                alive: CancellationToken::new(),
                tracking: Mutex::new(None),
                debounce: Mutex::new(None),
            }),
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionState {
        self.inner.updates.borrow().clone()
    }

    /// Receive a snapshot after every applied action.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.updates.subscribe()
    }

    /// Apply `action` unless the session has been closed.
    fn dispatch(&self, action: Action) -> Transition {
        if self.inner.alive.is_cancelled() {
            return Transition::Ignored;
        }
        let mut outcome = Transition::Ignored;
        self.inner.updates.send_if_modified(|state| {
            outcome = state.apply(action);
            outcome == Transition::Applied
        });
        outcome
    }

    fn wallet(&self) -> Option<Arc<dyn EmbeddedWallet>> {
        lock(&self.inner.wallet).clone()
    }

    /// Attach an embedded wallet, derive its smart account and load balances.
    ///
    /// Ends with a quote refresh for the pre-filled amount.
    pub async fn connect(&self, wallet: Arc<dyn EmbeddedWallet>) -> Result<(), SwapError> {
        let signer = wallet.address();
        *lock(&self.inner.wallet) = Some(wallet);
        self.dispatch(Action::SignerReady {
            address: signer.clone(),
        });
        info!(signer = %signer, "Setting up swap account");

        let account = match self
            .inner
            .api
            .predict_account_address(&signer, &signer)
            .await
        {
            Ok(account) => account,
            Err(e) => {
                warn!(signer = %signer, error = %e, "Account prediction failed");
                self.dispatch(Action::SetupFailed);
                return Err(SwapError::Setup(e.to_string()));
            }
        };
        self.dispatch(Action::AccountReady {
            address: account.clone(),
        });
        info!(account = %account, "Swap account ready");

        if let Err(e) = self.refresh_balances().await {
            self.dispatch(Action::SetupFailed);
            return Err(e);
        }

        self.refresh_quote().await;
        Ok(())
    }

    /// Replace the token set with a fresh balance snapshot.
    ///
    /// On failure the previous snapshot is kept.
    pub async fn refresh_balances(&self) -> Result<(), SwapError> {
        let account = self
            .snapshot()
            .account_address
            .ok_or(SwapError::NotReady)?;

        let balances = self
            .inner
            .api
            .get_aggregated_balance(&account)
            .await
            .map_err(|e| {
                warn!(account = %account, error = %e, "Balance fetch failed");
                SwapError::Setup(e.to_string())
            })?;

        let tokens: Vec<Token> = balances.iter().map(Token::from_balance).collect();
        debug!(account = %account, tokens = tokens.len(), "Balances loaded");
        self.dispatch(Action::BalancesLoaded { tokens });
        Ok(())
    }

    pub fn select_from(&self, asset_id: &str) -> bool {
        self.select(Side::From, asset_id)
    }

    pub fn select_to(&self, asset_id: &str) -> bool {
        self.select(Side::To, asset_id)
    }

    fn select(&self, side: Side, asset_id: &str) -> bool {
        let applied = self.dispatch(Action::SelectToken {
            side,
            asset_id: asset_id.to_string(),
        }) == Transition::Applied;
        if applied {
            self.schedule_quote_refresh();
        }
        applied
    }

    /// Swap source and destination, pre-filling the new source's default amount.
    pub fn toggle_direction(&self) {
        if self.dispatch(Action::ToggleDirection) == Transition::Applied {
            self.schedule_quote_refresh();
        }
    }

    /// Update the amount text. Returns `false` when the text is not a valid
    /// decimal amount; the state is then unchanged.
    pub fn set_amount(&self, text: &str) -> bool {
        let applied = self.dispatch(Action::SetAmount {
            text: text.to_string(),
        }) == Transition::Applied;
        if applied {
            self.schedule_quote_refresh();
        }
        applied
    }

    /// Refresh the quote after the debounce delay, superseding any pending
    /// refresh.
    pub fn schedule_quote_refresh(&self) {
        let token = self.inner.alive.child_token();
        if let Some(previous) = lock(&self.inner.debounce).replace(token.clone()) {
            previous.cancel();
        }

        let session = self.clone();
        let delay = self.inner.config.quote_debounce;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => session.refresh_quote().await,
            }
        });
    }

    /// Fetch a quote for the current inputs, if they allow one.
    ///
    /// The response is applied only if no newer fetch or input change
    /// happened meanwhile. A failure clears the estimate.
    pub async fn refresh_quote(&self) {
        let Some((key, intent)) = self.begin_quote_fetch() else {
            return;
        };

        let result = fetch_quote(self.inner.api.as_ref(), &key)
            .await
            .map_err(|e| e.to_string());

        if self.dispatch(Action::ReceiveQuote { intent, result }) == Transition::Ignored {
            debug!(intent, "Discarded superseded quote");
        }
    }

    fn begin_quote_fetch(&self) -> Option<(QuoteKey, u64)> {
        if self.inner.alive.is_cancelled() {
            return None;
        }
        let mut started = None;
        self.inner.updates.send_if_modified(|state| {
            let Some(key) = state.quote_key() else {
                return false;
            };
            state.apply(Action::StartQuoteFetch);
            started = Some((key, state.latest_intent()));
            true
        });
        started
    }

    /// Sign and submit a swap for the current inputs, then start tracking it.
    ///
    /// Reuses the cached quote when it was priced for exactly these inputs,
    /// otherwise fetches a fresh one. Returns the quote id being tracked.
    pub async fn submit_swap(&self) -> Result<String, SwapError> {
        let wallet = self.wallet();
        let (key, cached) = self.begin_submission(wallet.is_some())?;
        let Some(wallet) = wallet else {
            return Err(SwapError::NotReady);
        };

        match self.run_submission(&key, cached, wallet.as_ref()).await {
            Ok(quote_id) => {
                self.start_tracking(&quote_id);
                Ok(quote_id)
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Swap submission failed");
                self.stop_tracking();
                self.dispatch(Action::SubmissionFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Check the swap gate and enter `submitting` in one step.
    fn begin_submission(
        &self,
        has_wallet: bool,
    ) -> Result<(QuoteKey, Option<LiveQuote>), SwapError> {
        if self.inner.alive.is_cancelled() {
            return Err(SwapError::NotReady);
        }

        let mut outcome = Err(SwapError::NotReady);
        self.inner.updates.send_if_modified(|state| {
            let blocker = if has_wallet {
                state.swap_blocker()
            } else {
                Some(SwapBlocker::NotReady)
            };
            if let Some(blocker) = blocker {
                let err = rejection(blocker);
                if blocker == SwapBlocker::Busy {
                    outcome = Err(err);
                    return false;
                }
                state.apply(Action::Rejected {
                    message: err.to_string(),
                });
                outcome = Err(err);
                return true;
            }
            let Some(key) = state.quote_key() else {
                return false;
            };
            let cached = state.live_quote().cloned();
            state.apply(Action::StartSubmission);
            outcome = Ok((key, cached));
            true
        });

        if outcome.is_ok() {
            self.stop_tracking();
        }
        outcome
    }

    async fn run_submission(
        &self,
        key: &QuoteKey,
        cached: Option<LiveQuote>,
        wallet: &dyn EmbeddedWallet,
    ) -> Result<String, SwapError> {
        let live = match cached {
            Some(live) => {
                debug!(quote_id = %live.quote.id, "Reusing cached quote");
                live
            }
            None => fetch_quote(self.inner.api.as_ref(), key)
                .await
                .map_err(SwapError::quote)?,
        };

        let signed = sign_quote(&live.quote, wallet).await?;
        execute_swap(self.inner.api.as_ref(), &signed).await
    }

    /// Start tracking `quote_id`, cancelling any previous tracking run first.
    fn start_tracking(&self, quote_id: &str) {
        let cancel = self.inner.alive.child_token();
        if let Some(previous) = lock(&self.inner.tracking).replace(cancel.clone()) {
            previous.cancel();
        }

        if self.dispatch(Action::SubmissionAccepted {
            quote_id: quote_id.to_string(),
        }) == Transition::Ignored
        {
            cancel.cancel();
            return;
        }

        let ctx = TrackingContext::new(quote_id, cancel, &self.inner.config);
        let sink: Arc<dyn StatusSink> = Arc::new(self.clone());
        tokio::spawn(tracker::track(ctx, self.inner.api.clone(), sink));
    }

    /// Stop local status tracking. The remote swap is unaffected.
    pub fn stop_tracking(&self) {
        if let Some(token) = lock(&self.inner.tracking).take() {
            token.cancel();
        }
    }

    /// Clear quote and swap progress, keeping the account and balances.
    pub fn reset(&self) {
        self.stop_tracking();
        self.dispatch(Action::Reset);
    }

    /// Detach the wallet (logout). The session can be connected again.
    pub fn disconnect(&self) {
        self.stop_tracking();
        if let Some(token) = lock(&self.inner.debounce).take() {
            token.cancel();
        }
        *lock(&self.inner.wallet) = None;
        self.dispatch(Action::Disconnected);
        info!("Swap session disconnected");
    }

    /// Tear the session down. Every timer is cancelled and no further state
    /// change is published.
    pub fn close(&self) {
        self.inner.alive.cancel();
        debug!("Swap session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.alive.is_cancelled()
    }
}

#[async_trait]
impl StatusSink for SwapSession {
    async fn deliver(&self, quote_id: &str, event: TrackerEvent) -> Flow {
        let action = match event {
            TrackerEvent::Polled(status) => Action::ReceiveStatus {
                quote_id: quote_id.to_string(),
                status,
            },
            TrackerEvent::PollFailed(_) => Action::PollFailed {
                quote_id: quote_id.to_string(),
            },
            TrackerEvent::TimedOut => Action::Timeout {
                quote_id: quote_id.to_string(),
            },
        };

        if self.dispatch(action) == Transition::Ignored {
            debug!(quote_id = %quote_id, "Discarded stale status");
            return Flow::Stop;
        }

        let current = self
            .inner
            .updates
            .borrow()
            .status
            .as_ref()
            .filter(|s| s.quote_id.as_deref() == Some(quote_id))
            .map(|s| s.status);

        match current {
            Some(TxStatus::Completed) => {
                info!(quote_id = %quote_id, "Swap completed");
                match self.refresh_balances().await {
                    Ok(()) => self.refresh_quote().await,
                    Err(e) => warn!(error = %e, "Balance refresh after swap failed"),
                }
                Flow::Stop
            }
            Some(TxStatus::Failed) => {
                warn!(quote_id = %quote_id, "Swap failed");
                Flow::Stop
            }
            Some(TxStatus::Pending | TxStatus::Processing) => Flow::Continue,
            Some(TxStatus::Unknown) | None => Flow::Stop,
        }
    }
}

fn rejection(blocker: SwapBlocker) -> SwapError {
    let message = match blocker {
        SwapBlocker::NotReady => return SwapError::NotReady,
        SwapBlocker::Busy => "A swap is already in progress",
        SwapBlocker::NoPair => "Select two different tokens",
        SwapBlocker::InvalidAmount => "Enter an amount greater than zero",
        SwapBlocker::BelowMinimum => "Amount is below the minimum transferable unit",
        SwapBlocker::ExceedsBalance => "Amount exceeds available balance",
        SwapBlocker::ZeroBalance => "Insufficient balance",
    };
    SwapError::InvalidInput(message.to_string())
}

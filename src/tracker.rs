// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Status Tracker
//!
//! Polls the settlement status of one submitted quote until the session says
//! stop, the deadline passes, or a poll fails.
//!
//! ## Strategy
//!
//! Every `poll_interval` (default 3 s) the tracker asks the API for the
//! status of its quote and hands the result to a [`StatusSink`]. The sink
//! decides whether tracking continues. A poll that fails is reported once and
//! ends tracking; it is not retried.
//!
//! The next tick is only awaited after the previous poll has returned, so two
//! polls for the same quote are never in flight together.
//!
//! ## Shutdown
//!
//! Each tracking run owns a [`TrackingContext`] with its own
//! `CancellationToken`. Cancelling it stops both the interval and the
//! deadline; nothing is delivered to the sink afterwards.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{SwapApi, TransactionStatus};
use crate::config::SwapConfig;

/// Everything a tracking run needs, fixed when it starts.
#[derive(Debug, Clone)]
pub struct TrackingContext {
    pub quote_id: String,
    pub cancel: CancellationToken,
    /// Give up with a timeout at this instant
    pub deadline: Instant,
    pub poll_interval: Duration,
}

impl TrackingContext {
    pub fn new(quote_id: impl Into<String>, cancel: CancellationToken, config: &SwapConfig) -> Self {
        Self {
            quote_id: quote_id.into(),
            cancel,
            deadline: Instant::now() + config.poll_timeout,
            poll_interval: config.poll_interval,
        }
    }
}

/// What a tracking run reports.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    Polled(TransactionStatus),
    /// The status request failed; tracking has ended
    PollFailed(String),
    /// The deadline passed; tracking has ended
    TimedOut,
}

/// Whether the tracker should keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Receiver of tracking events, tagged with the quote they belong to.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn deliver(&self, quote_id: &str, event: TrackerEvent) -> Flow;
}

/// Run a tracking loop until it ends by itself or `ctx.cancel` fires.
///
/// Should be spawned as a background task:
/// ```rust,ignore
/// tokio::spawn(tracker::track(ctx, api, sink));
/// ```
pub async fn track(ctx: TrackingContext, api: Arc<dyn SwapApi>, sink: Arc<dyn StatusSink>) {
    info!(
        quote_id = %ctx.quote_id,
        interval_secs = ctx.poll_interval.as_secs(),
        "Status tracking started"
    );

    let mut ticker = tokio::time::interval_at(Instant::now() + ctx.poll_interval, ctx.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = tokio::time::sleep_until(ctx.deadline);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                debug!(quote_id = %ctx.quote_id, "Status tracking cancelled");
                return;
            }
            _ = &mut deadline => {
                warn!(quote_id = %ctx.quote_id, "Status tracking timed out");
                sink.deliver(&ctx.quote_id, TrackerEvent::TimedOut).await;
                return;
            }
            _ = ticker.tick() => {}
        }

        let polled = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                debug!(quote_id = %ctx.quote_id, "Status tracking cancelled during poll");
                return;
            }
            result = api.check_transaction_status(&ctx.quote_id) => result,
            _ = &mut deadline => {
                warn!(quote_id = %ctx.quote_id, "Status tracking timed out during poll");
                sink.deliver(&ctx.quote_id, TrackerEvent::TimedOut).await;
                return;
            }
        };

        if ctx.cancel.is_cancelled() {
            return;
        }

        let flow = match polled {
            Ok(status) => {
                debug!(
                    quote_id = %ctx.quote_id,
                    status = ?status.status,
                    "Polled swap status"
                );
                sink.deliver(&ctx.quote_id, TrackerEvent::Polled(status)).await
            }
            Err(e) => {
                warn!(quote_id = %ctx.quote_id, error = %e, "Status poll failed");
                sink.deliver(&ctx.quote_id, TrackerEvent::PollFailed(e.to_string()))
                    .await;
                Flow::Stop
            }
        };

        if flow == Flow::Stop {
            info!(quote_id = %ctx.quote_id, "Status tracking finished");
            return;
        }
    }
}

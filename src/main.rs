// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Command-line swap runner.
//!
//! ```text
//! relational-swap [AMOUNT] [--reverse] [--submit]
//! ```
//!
//! Connects the embedded wallet from `EMBEDDED_WALLET_KEY`, prices a swap of
//! `AMOUNT` (default: the pre-filled amount) and, with `--submit`, signs and
//! executes it and waits for settlement.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use relational_swap::api::{ApiError, OneBalanceClient};
use relational_swap::config::{ConfigError, SwapConfig, WALLET_KEY_ENV};
use relational_swap::error::SwapError;
use relational_swap::logging;
use relational_swap::session::SwapSession;
use relational_swap::state::{SessionState, TxStatus};
use relational_swap::wallet::{LocalWallet, WalletError};
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error("swap ended with status {0}")]
    Unsettled(&'static str),
}

#[derive(Debug, Default)]
struct Args {
    amount: Option<String>,
    reverse: bool,
    submit: bool,
}

impl Args {
    fn parse(args: impl Iterator<Item = String>) -> Self {
        let mut parsed = Args::default();
        for arg in args {
            match arg.as_str() {
                "--reverse" => parsed.reverse = true,
                "--submit" => parsed.submit = true,
                _ => parsed.amount = Some(arg),
            }
        }
        parsed
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    match run(Args::parse(env::args().skip(1))).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Swap run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = SwapConfig::from_env()?;
    let key = env::var(WALLET_KEY_ENV).map_err(|_| ConfigError::Missing(WALLET_KEY_ENV))?;
    let wallet = Arc::new(LocalWallet::from_hex(&key)?);
    let api = Arc::new(OneBalanceClient::from_config(&config)?);

    let session = SwapSession::new(api, config);
    let result = drive(&session, wallet, args).await;
    session.close();
    result
}

async fn drive(session: &SwapSession, wallet: Arc<LocalWallet>, args: Args) -> Result<(), CliError> {
    session.connect(wallet).await?;
    info!(connected = %session.snapshot().connected_label(), "Wallet connected");

    if args.reverse {
        session.toggle_direction();
    }
    if let Some(amount) = &args.amount {
        if !session.set_amount(amount) {
            return Err(SwapError::InvalidInput(format!("Invalid amount {amount:?}")).into());
        }
    }
    session.refresh_quote().await;
    log_quote(&session.snapshot());

    if !args.submit {
        return Ok(());
    }

    let quote_id = session.submit_swap().await?;
    info!(quote_id = %quote_id, "Swap submitted, waiting for settlement");

    let mut updates = session.subscribe();
    loop {
        let current = settled(&updates.borrow_and_update());
        if let Some(status) = current {
            return report(session, status);
        }
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!(quote_id = %quote_id, "Interrupted; the submitted swap continues remotely");
                return Ok(());
            }
        }
    }
}

fn settled(state: &SessionState) -> Option<TxStatus> {
    state
        .status
        .as_ref()
        .map(|s| s.status)
        .filter(|s| !s.is_busy())
}

fn log_quote(state: &SessionState) {
    let symbol = |token: Option<&relational_swap::assets::Token>| {
        token.map(|t| t.symbol.clone()).unwrap_or_default()
    };
    info!(
        from = %symbol(state.from()),
        to = %symbol(state.to()),
        amount = %state.amount,
        balance = %state.from().map(|t| t.balance.as_str()).unwrap_or("0"),
        estimate = ?state.estimate,
        rate = ?state.estimated_rate(),
        blocked = ?state.swap_blocker(),
        "Quote"
    );
}

fn report(session: &SwapSession, status: TxStatus) -> Result<(), CliError> {
    let state = session.snapshot();
    let Some(swap) = state.status.as_ref() else {
        return Ok(());
    };
    info!(
        status = status.as_str(),
        reason = ?swap.reason,
        origin_tx = ?swap.origin_explorer_url(),
        destination_tx = ?swap.destination_explorer_url(),
        "Swap settled"
    );
    match status {
        TxStatus::Completed => Ok(()),
        other => Err(CliError::Unsettled(other.as_str())),
    }
}

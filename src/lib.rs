//! Walletier is the backend for a personal finance web app built around
//! shared wallets: users record transactions against wallets they own or
//! share, and recurring subscriptions materialize into ledger transactions
//! on a schedule.
//!
//! This library provides a JSON REST API plus the subscription processing
//! engine that turns due subscriptions into transactions exactly once.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod currency;
mod database_id;
mod db;
mod endpoints;
mod routing;
mod scheduler;
mod subscription;
mod transaction;
mod user;
mod wallet;

pub use app_state::AppState;
pub use currency::{Currency, ExchangeRates};
pub use db::initialize as initialize_db;
pub use routing::build_router;
pub use scheduler::run_subscription_scheduler;
pub use user::UserId;
pub use wallet::WalletId;

use crate::database_id::DatabaseId;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The wallet ID did not resolve to a wallet in the database.
    #[error("wallet with ID {0} does not exist")]
    WalletNotFound(WalletId),

    /// The subscription ID did not resolve to a subscription in the database.
    #[error("subscription with ID {0} does not exist")]
    SubscriptionNotFound(DatabaseId),

    /// The user ID did not resolve to a registered user.
    #[error("user with ID {0} does not exist")]
    UserNotFound(UserId),

    /// The acting user is neither the owner nor a shared user of the wallet,
    /// or lacks the role required for an administrative operation.
    #[error("user is not authorized to perform this operation")]
    Unauthorized,

    /// An expense transaction would overdraw the wallet.
    ///
    /// The transaction is not created and the wallet balance is left
    /// untouched.
    #[error("insufficient wallet balance for this transaction")]
    InsufficientFunds,

    /// The exchange rate table has no entry for the requested currency pair.
    #[error("no exchange rate from {0} to {1}")]
    UnknownCurrencyPair(Currency, Currency),

    /// The string is not one of the supported subscription frequencies
    /// (daily, weekly, monthly, yearly).
    #[error("unsupported frequency: {0}")]
    UnsupportedFrequency(String),

    /// The string is not one of the supported currency codes.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// A transaction or subscription was given a zero or negative amount.
    #[error("{0} is not a positive amount")]
    InvalidAmount(f64),

    /// A subscription was given an end date earlier than its start date.
    #[error("the end date must not be before the start date")]
    InvalidDateRange,

    /// The email address already belongs to a registered user.
    #[error("a user with this email address already exists")]
    DuplicateEmail,

    /// Tried to share a wallet with a user who is already a shared user.
    #[error("user is already sharing this wallet")]
    AlreadyShared,

    /// Tried to remove a shared user who is not sharing the wallet.
    #[error("user is not sharing this wallet")]
    NotShared,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::WalletNotFound(_) | Error::SubscriptionNotFound(_) | Error::UserNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Error::Unauthorized => StatusCode::FORBIDDEN,
            Error::InsufficientFunds
            | Error::UnknownCurrencyPair(_, _)
            | Error::UnsupportedFrequency(_)
            | Error::UnsupportedCurrency(_)
            | Error::InvalidAmount(_)
            | Error::InvalidDateRange
            | Error::DuplicateEmail
            | Error::AlreadyShared
            | Error::NotShared => StatusCode::BAD_REQUEST,
            Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        // SQL errors are not intended to be shown to the client.
        let message = match self {
            Error::SqlError(error) => {
                tracing::error!("An unexpected error occurred: {}", error);
                "an internal server error occurred".to_owned()
            }
            error => error.to_string(),
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

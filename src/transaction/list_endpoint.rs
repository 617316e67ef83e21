//! Defines the endpoint for listing a wallet's transactions.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState, Error, transaction::core::get_transactions_for_wallet, user::UserId,
    wallet::core::WalletId,
};

/// The query parameters identifying the acting user.
#[derive(Debug, Deserialize)]
pub struct ActingUser {
    /// The ID of the user making the request.
    pub user_id: i64,
}

/// A route handler for listing the transactions recorded against a wallet,
/// oldest first. Only the wallet's owner and shared users may list them.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_wallet_transactions_endpoint(
    State(state): State<AppState>,
    Path(wallet_id): Path<i64>,
    Query(acting_user): Query<ActingUser>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.db_connection.lock().unwrap();

    let transactions = get_transactions_for_wallet(
        WalletId::new(wallet_id),
        UserId::new(acting_user.user_id),
        &connection,
    )?;

    Ok(Json(transactions))
}

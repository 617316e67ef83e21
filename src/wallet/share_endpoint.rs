//! Defines the endpoints for sharing a wallet with another user and
//! revoking that access.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    AppState, Error,
    user::UserId,
    wallet::core::{WalletId, add_shared_user, remove_shared_user},
};

/// A route handler that grants a user transaction and subscription rights on
/// a wallet they do not own. Returns the updated wallet.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn add_shared_user_endpoint(
    State(state): State<AppState>,
    Path((wallet_id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.db_connection.lock().unwrap();

    let wallet = add_shared_user(WalletId::new(wallet_id), UserId::new(user_id), &connection)?;

    Ok(Json(wallet))
}

/// A route handler that removes a user from a wallet's shared-user set.
/// Returns the updated wallet.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn remove_shared_user_endpoint(
    State(state): State<AppState>,
    Path((wallet_id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.db_connection.lock().unwrap();

    let wallet = remove_shared_user(WalletId::new(wallet_id), UserId::new(user_id), &connection)?;

    Ok(Json(wallet))
}

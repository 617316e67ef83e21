//! Defines the endpoints for listing wallets.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    AppState, Error,
    user::UserId,
    wallet::core::{get_all_wallets, get_wallets_for_user},
};

/// A route handler for listing every wallet with its owner and shared-user
/// IDs.
///
/// Note that this is a plain read: subscription processing is driven by the
/// scheduler and the manual trigger endpoint, never by listing wallets.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_wallets_endpoint(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.db_connection.lock().unwrap();

    let wallets = get_all_wallets(&connection)?;

    Ok(Json(wallets))
}

/// A route handler for listing the wallets a user owns or shares.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_user_wallets_endpoint(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.db_connection.lock().unwrap();

    let wallets = get_wallets_for_user(UserId::new(user_id), &connection)?;

    Ok(Json(wallets))
}

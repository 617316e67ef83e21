//! Defines the endpoint for creating a new wallet.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    AppState, Error,
    wallet::core::{NewWallet, create_wallet},
};

/// A route handler for creating a new wallet owned by the user named in the
/// request body.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_wallet_endpoint(
    State(state): State<AppState>,
    Json(new_wallet): Json<NewWallet>,
) -> Result<impl IntoResponse + std::fmt::Debug, Error> {
    let connection = state.db_connection.lock().unwrap();

    let wallet = create_wallet(new_wallet, &connection)?;

    Ok((StatusCode::CREATED, Json(wallet)))
}

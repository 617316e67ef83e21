//! Defines the endpoint for materializing a new transaction.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    AppState, Error,
    transaction::core::{NewTransaction, create_transaction},
};

/// A route handler for materializing a transaction against a wallet.
///
/// The amount may be in any supported currency; it is converted into the
/// wallet currency before the balance is mutated.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    Json(new_transaction): Json<NewTransaction>,
) -> Result<impl IntoResponse + std::fmt::Debug, Error> {
    let mut connection = state.db_connection.lock().unwrap();

    let transaction = create_transaction(new_transaction, &state.exchange_rates, &mut connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

//! Defines the administrative endpoint for triggering a subscription
//! processing pass by hand.
//!
//! Routine processing is driven by the scheduler task; this endpoint exists
//! so an administrator can force a pass without waiting for the next tick.
//! It is deliberately not coupled to any read path.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    subscription::processor::process_due_subscriptions,
    user::{Role, UserId, get_user_by_id},
};

/// The request body for a manual processing run.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    /// The ID of the user requesting the run. Must hold the admin role.
    pub user_id: UserId,
}

/// A route handler that runs one subscription processing pass and reports
/// the outcome.
///
/// This is an administrative operation: the acting user must hold the
/// [Role::Admin] role. Wallet-level authorization does not apply here
/// because materialized transactions are attributed to each subscription's
/// creating user, not to the administrator.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn process_subscriptions_endpoint(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, Error> {
    let mut connection = state.db_connection.lock().unwrap();

    let user = get_user_by_id(request.user_id, &connection)?;

    if user.role != Role::Admin {
        return Err(Error::Unauthorized);
    }

    let now = OffsetDateTime::now_utc().date();
    let outcome = process_due_subscriptions(now, &state.exchange_rates, &mut connection)?;

    Ok(Json(outcome))
}

//! Defines the endpoint for deleting a subscription.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{AppState, Error, subscription::core::delete_subscription, user::UserId};

/// The query parameters identifying the acting user.
#[derive(Debug, Deserialize)]
pub struct ActingUser {
    /// The ID of the user making the request.
    pub user_id: i64,
}

/// A route handler for deleting a subscription.
///
/// The same authorization rule as transactions applies: only the owning
/// wallet's owner or a shared user may delete it.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn delete_subscription_endpoint(
    State(state): State<AppState>,
    Path(subscription_id): Path<i64>,
    Query(acting_user): Query<ActingUser>,
) -> Result<impl IntoResponse, Error> {
    let connection = state.db_connection.lock().unwrap();

    delete_subscription(subscription_id, UserId::new(acting_user.user_id), &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

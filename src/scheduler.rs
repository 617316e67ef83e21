//! The background task that periodically materializes due subscriptions.

use std::time::Duration;

use time::OffsetDateTime;

use crate::{AppState, subscription::process_due_subscriptions};

/// Run subscription processing passes forever, one per `period`.
///
/// The first pass runs immediately on start-up so that occurrences which
/// became due while the server was down are caught up without waiting a
/// full period. Errors are logged and do not stop the loop.
///
/// This function never returns; spawn it on its own task.
pub async fn run_subscription_scheduler(state: AppState, period: Duration) {
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;

        // The guard must not be held across an await point, so the whole
        // pass happens in this non-async block.
        let result = {
            let mut connection = match state.db_connection.lock() {
                Ok(connection) => connection,
                Err(error) => {
                    tracing::error!("database connection lock is poisoned: {error}");
                    continue;
                }
            };

            let today = OffsetDateTime::now_utc().date();
            process_due_subscriptions(today, &state.exchange_rates, &mut connection)
        };

        match result {
            Ok(outcome) => tracing::info!(
                created = outcome.created,
                skipped = outcome.skipped,
                failed = outcome.failed,
                "subscription processing pass finished"
            ),
            Err(error) => tracing::error!("subscription processing pass failed: {error}"),
        }
    }
}

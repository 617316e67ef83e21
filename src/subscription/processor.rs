//! The subscription processor: walks all subscriptions and materializes due
//! occurrences into ledger transactions.

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    currency::ExchangeRates,
    subscription::{
        core::{Subscription, get_all_subscriptions, set_last_materialized},
        schedule::next_due,
    },
    transaction::core::{NewTransaction, materialize_transaction},
};

/// What a processing pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessOutcome {
    /// The number of transactions materialized.
    pub created: usize,
    /// The number of subscriptions with nothing due, including those outside
    /// their active window.
    pub skipped: usize,
    /// The number of subscriptions whose materialization failed.
    pub failed: usize,
}

/// Process every subscription once, materializing at most one due occurrence
/// per subscription.
///
/// Each subscription is visited exactly once per pass regardless of how many
/// users share its wallet. A subscription is skipped when `now` falls
/// outside its inclusive `[start_date, end_date]` window or when its next
/// occurrence is still in the future. A materialization failure is logged
/// and counted, and never aborts processing of the remaining subscriptions.
///
/// The materialized transaction and the subscription's checkpoint are
/// committed in a single SQL transaction, so re-running the pass with the
/// same `now` cannot create the same occurrence twice. A subscription that
/// has fallen several occurrences behind catches up one occurrence per pass.
///
/// # Errors
/// This function will return a [Error::SqlError] if the subscriptions cannot
/// be listed; failures on individual subscriptions are reported through
/// [ProcessOutcome::failed] instead.
pub fn process_due_subscriptions(
    now: Date,
    rates: &ExchangeRates,
    connection: &mut Connection,
) -> Result<ProcessOutcome, Error> {
    let subscriptions = get_all_subscriptions(connection)?;

    let mut outcome = ProcessOutcome::default();

    for subscription in subscriptions {
        if now < subscription.start_date || now > subscription.end_date {
            outcome.skipped += 1;
            continue;
        }

        let due_date = match next_due(
            subscription.frequency,
            subscription.start_date,
            subscription.last_materialized,
            now,
        ) {
            Some(due_date) => due_date,
            None => {
                outcome.skipped += 1;
                continue;
            }
        };

        match materialize_occurrence(&subscription, due_date, rates, connection) {
            Ok(()) => {
                tracing::info!(
                    "Materialized \"{}\" occurrence {} for wallet {}",
                    subscription.description,
                    due_date,
                    subscription.wallet_id
                );
                outcome.created += 1;
            }
            Err(error) => {
                tracing::error!(
                    "Could not materialize subscription {} (\"{}\"): {}",
                    subscription.id,
                    subscription.description,
                    error
                );
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}

/// Materialize one occurrence: create the transaction, mutate the wallet
/// balance, and advance the subscription checkpoint, all in one SQL
/// transaction.
fn materialize_occurrence(
    subscription: &Subscription,
    due_date: Date,
    rates: &ExchangeRates,
    connection: &mut Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.transaction()?;

    materialize_transaction(
        NewTransaction {
            category: subscription.description.clone(),
            expense: subscription.expense,
            currency: subscription.currency,
            amount: subscription.amount,
            wallet_id: subscription.wallet_id,
            user_id: subscription.user_id,
        },
        due_date.midnight().assume_utc(),
        rates,
        &sql_transaction,
    )?;

    set_last_materialized(subscription.id, due_date, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

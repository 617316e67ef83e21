//! Defines the transaction model and the materializer that turns a request
//! into a persisted transaction plus a wallet balance update, atomically.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    currency::{Currency, ExchangeRates},
    database_id::DatabaseId,
    user::UserId,
    wallet::core::{WalletId, apply_balance_delta, get_wallet, try_debit_balance},
};

/// An expense or income recorded against a wallet.
///
/// The amount is always expressed in the owning wallet's currency; any
/// conversion happened when the transaction was materialized. Transactions
/// are immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// A label describing what the transaction was for.
    pub category: String,
    /// Whether money left the wallet (true) or entered it (false).
    pub expense: bool,
    /// The currency of `amount`, equal to the wallet's currency.
    pub currency: Currency,
    /// The amount of money moved, in the wallet's currency.
    pub amount: f64,
    /// When the transaction was materialized.
    pub date_time: OffsetDateTime,
    /// The ID of the wallet the transaction belongs to.
    pub wallet_id: WalletId,
    /// The ID of the user that created the transaction.
    pub user_id: UserId,
}

/// The fields needed to materialize a new transaction.
///
/// `amount` is expressed in `currency`, which may differ from the wallet's
/// currency; the materializer converts it before anything is persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    /// A label describing what the transaction is for.
    pub category: String,
    /// Whether money leaves the wallet (true) or enters it (false).
    pub expense: bool,
    /// The currency `amount` is expressed in.
    pub currency: Currency,
    /// The amount of money to move. Must be positive.
    pub amount: f64,
    /// The ID of the wallet to record the transaction against.
    pub wallet_id: WalletId,
    /// The ID of the acting user.
    pub user_id: UserId,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                expense INTEGER NOT NULL,
                currency TEXT NOT NULL,
                amount REAL NOT NULL,
                date_time TEXT NOT NULL,
                wallet_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(wallet_id) REFERENCES wallet(id),
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    Ok(())
}

/// Materialize a transaction: authorize the acting user, convert the amount
/// into the wallet currency, mutate the wallet balance and persist the
/// transaction record, all as a single atomic unit.
///
/// The timestamp on the persisted transaction is the current UTC time.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is zero or negative,
/// - or [Error::WalletNotFound] if the wallet does not exist,
/// - or [Error::Unauthorized] if the user is neither the owner nor a shared
///   user of the wallet,
/// - or [Error::UnknownCurrencyPair] if the amount cannot be converted,
/// - or [Error::InsufficientFunds] if an expense would overdraw the wallet
///   (the balance is left untouched),
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    rates: &ExchangeRates,
    connection: &mut Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.transaction()?;

    let transaction = materialize_transaction(
        new_transaction,
        OffsetDateTime::now_utc(),
        rates,
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(transaction)
}

/// The materializer body, run inside an open SQL transaction so the balance
/// mutation and the transaction insert land together or not at all.
///
/// The subscription processor calls this directly with its own SQL
/// transaction so the subscription checkpoint can join the same atomic unit.
pub(crate) fn materialize_transaction(
    new_transaction: NewTransaction,
    date_time: OffsetDateTime,
    rates: &ExchangeRates,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if new_transaction.amount <= 0.0 {
        return Err(Error::InvalidAmount(new_transaction.amount));
    }

    let wallet = get_wallet(new_transaction.wallet_id, connection)?;

    if !wallet.is_authorized(new_transaction.user_id) {
        return Err(Error::Unauthorized);
    }

    let amount = rates.convert(new_transaction.amount, new_transaction.currency, wallet.currency)?;

    if new_transaction.expense {
        try_debit_balance(wallet.id, amount, connection)?;
    } else {
        apply_balance_delta(wallet.id, amount, false, connection)?;
    }

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (category, expense, currency, amount, date_time, wallet_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, category, expense, currency, amount, date_time, wallet_id, user_id",
        )?
        .query_row(
            (
                &new_transaction.category,
                new_transaction.expense,
                wallet.currency,
                amount,
                date_time,
                wallet.id,
                new_transaction.user_id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the transactions recorded against a wallet, oldest first.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if the wallet does not exist,
/// - or [Error::Unauthorized] if `user_id` may not act on the wallet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transactions_for_wallet(
    wallet_id: WalletId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let wallet = get_wallet(wallet_id, connection)?;

    if !wallet.is_authorized(user_id) {
        return Err(Error::Unauthorized);
    }

    let transactions = connection
        .prepare(
            "SELECT id, category, expense, currency, amount, date_time, wallet_id, user_id
             FROM \"transaction\" WHERE wallet_id = :id ORDER BY id",
        )?
        .query_map(&[(":id", &wallet_id)], map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

/// Map a database row to a [Transaction].
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        category: row.get(1)?,
        expense: row.get(2)?,
        currency: row.get(3)?,
        amount: row.get(4)?,
        date_time: row.get(5)?,
        wallet_id: row.get(6)?,
        user_id: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

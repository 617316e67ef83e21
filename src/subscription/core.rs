//! Defines the subscription model and its database functions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, currency::Currency, database_id::DatabaseId, user::UserId,
    wallet::core::{WalletId, get_wallet},
};

/// How often a subscription produces an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// Every calendar month, with the day-of-month clamped to the length of
    /// the target month.
    Monthly,
    /// Every calendar year, with 29 February clamped to 28 February in
    /// non-leap years.
    Yearly,
}

impl Frequency {
    /// The lowercase name of the frequency as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(Error::UnsupportedFrequency(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.as_str().to_owned()
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A recurring financial obligation that materializes into discrete
/// transactions on a schedule.
///
/// Occurrences are only generated while "now" falls within the inclusive
/// `[start_date, end_date]` window. The processor never mutates a
/// subscription other than advancing `last_materialized`; it only reads it
/// and emits transactions as a side effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscription {
    /// The ID of the subscription.
    pub id: DatabaseId,
    /// A text description, used as the category of materialized
    /// transactions.
    pub description: String,
    /// The amount of each occurrence, in `currency`.
    pub amount: f64,
    /// The currency the amount is expressed in.
    pub currency: Currency,
    /// Whether occurrences are expenses (true) or income (false).
    pub expense: bool,
    /// How often an occurrence is due.
    pub frequency: Frequency,
    /// The date of the first occurrence.
    pub start_date: Date,
    /// The last date (inclusive) on which occurrences may be generated.
    pub end_date: Date,
    /// The occurrence date most recently turned into a transaction.
    ///
    /// This checkpoint is advanced in the same database transaction as the
    /// materialized ledger transaction, which is what makes processing
    /// idempotent under at-least-once scheduling.
    pub last_materialized: Option<Date>,
    /// The ID of the wallet occurrences are recorded against.
    pub wallet_id: WalletId,
    /// The ID of the user that created the subscription.
    pub user_id: UserId,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the subscription table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_subscription_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS subscription (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                currency TEXT NOT NULL,
                expense INTEGER NOT NULL,
                frequency TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                last_materialized TEXT,
                wallet_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(wallet_id) REFERENCES wallet(id),
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    Ok(())
}

/// The fields needed to create a new subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubscription {
    /// A text description, used as the category of materialized
    /// transactions.
    pub description: String,
    /// The amount of each occurrence. Must be positive.
    pub amount: f64,
    /// The currency the amount is expressed in.
    pub currency: Currency,
    /// Whether occurrences are expenses (true) or income (false).
    pub expense: bool,
    /// How often an occurrence is due.
    pub frequency: Frequency,
    /// The date of the first occurrence.
    pub start_date: Date,
    /// The last date (inclusive) on which occurrences may be generated.
    pub end_date: Date,
    /// The ID of the wallet occurrences will be recorded against.
    pub wallet_id: WalletId,
    /// The ID of the acting user.
    pub user_id: UserId,
}

/// Create a new subscription in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is zero or negative,
/// - or [Error::InvalidDateRange] if the end date is before the start date,
/// - or [Error::WalletNotFound] if the wallet does not exist,
/// - or [Error::Unauthorized] if the user may not act on the wallet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_subscription(
    new_subscription: NewSubscription,
    connection: &Connection,
) -> Result<Subscription, Error> {
    if new_subscription.amount <= 0.0 {
        return Err(Error::InvalidAmount(new_subscription.amount));
    }

    if new_subscription.end_date < new_subscription.start_date {
        return Err(Error::InvalidDateRange);
    }

    let wallet = get_wallet(new_subscription.wallet_id, connection)?;

    if !wallet.is_authorized(new_subscription.user_id) {
        return Err(Error::Unauthorized);
    }

    connection.execute(
        "INSERT INTO subscription
             (description, amount, currency, expense, frequency, start_date, end_date, wallet_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            &new_subscription.description,
            new_subscription.amount,
            new_subscription.currency,
            new_subscription.expense,
            new_subscription.frequency,
            new_subscription.start_date,
            new_subscription.end_date,
            new_subscription.wallet_id,
            new_subscription.user_id,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Subscription {
        id,
        description: new_subscription.description,
        amount: new_subscription.amount,
        currency: new_subscription.currency,
        expense: new_subscription.expense,
        frequency: new_subscription.frequency,
        start_date: new_subscription.start_date,
        end_date: new_subscription.end_date,
        last_materialized: None,
        wallet_id: new_subscription.wallet_id,
        user_id: new_subscription.user_id,
    })
}

/// Retrieve a subscription from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::SubscriptionNotFound] if `id` does not refer to a valid subscription,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_subscription(id: DatabaseId, connection: &Connection) -> Result<Subscription, Error> {
    connection
        .prepare(
            "SELECT id, description, amount, currency, expense, frequency, start_date, end_date,
                    last_materialized, wallet_id, user_id
             FROM subscription WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_subscription_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::SubscriptionNotFound(id),
            error => error.into(),
        })
}

/// Delete a subscription, applying the same authorization rule as
/// transactions: only the owning wallet's owner or a shared user may delete
/// it.
///
/// # Errors
/// This function will return a:
/// - [Error::SubscriptionNotFound] if `id` does not refer to a valid subscription,
/// - or [Error::Unauthorized] if `user_id` may not act on the owning wallet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_subscription(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let subscription = get_subscription(id, connection)?;
    let wallet = get_wallet(subscription.wallet_id, connection)?;

    if !wallet.is_authorized(user_id) {
        return Err(Error::Unauthorized);
    }

    connection.execute("DELETE FROM subscription WHERE id = ?1", (id,))?;

    Ok(())
}

/// Retrieve the subscriptions attached to a wallet, oldest first.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if the wallet does not exist,
/// - or [Error::Unauthorized] if `user_id` may not act on the wallet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_subscriptions_for_wallet(
    wallet_id: WalletId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Subscription>, Error> {
    let wallet = get_wallet(wallet_id, connection)?;

    if !wallet.is_authorized(user_id) {
        return Err(Error::Unauthorized);
    }

    let subscriptions = connection
        .prepare(
            "SELECT id, description, amount, currency, expense, frequency, start_date, end_date,
                    last_materialized, wallet_id, user_id
             FROM subscription WHERE wallet_id = :id ORDER BY id",
        )?
        .query_map(&[(":id", &wallet_id)], map_subscription_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(subscriptions)
}

/// Retrieve every subscription, oldest first.
///
/// Each subscription appears exactly once regardless of how many users share
/// its wallet, so a processing pass cannot materialize the same occurrence
/// twice.
pub(crate) fn get_all_subscriptions(connection: &Connection) -> Result<Vec<Subscription>, Error> {
    let subscriptions = connection
        .prepare(
            "SELECT id, description, amount, currency, expense, frequency, start_date, end_date,
                    last_materialized, wallet_id, user_id
             FROM subscription ORDER BY id",
        )?
        .query_map([], map_subscription_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(subscriptions)
}

/// Advance the materialization checkpoint of a subscription.
///
/// Must be called inside the same SQL transaction as the materialized ledger
/// transaction so the two land together or not at all.
pub(crate) fn set_last_materialized(
    id: DatabaseId,
    date: Date,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE subscription SET last_materialized = ?1 WHERE id = ?2",
        (date, id),
    )?;

    Ok(())
}

/// Map a database row to a [Subscription].
fn map_subscription_row(row: &Row) -> Result<Subscription, rusqlite::Error> {
    Ok(Subscription {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        expense: row.get(4)?,
        frequency: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        last_materialized: row.get(8)?,
        wallet_id: row.get(9)?,
        user_id: row.get(10)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod frequency_tests {
    use crate::{Error, subscription::core::Frequency};

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("daily".parse::<Frequency>(), Ok(Frequency::Daily));
        assert_eq!("Weekly".parse::<Frequency>(), Ok(Frequency::Weekly));
        assert_eq!("MONTHLY".parse::<Frequency>(), Ok(Frequency::Monthly));
        assert_eq!("yearly".parse::<Frequency>(), Ok(Frequency::Yearly));
    }

    #[test]
    fn rejects_unsupported_frequency() {
        assert_eq!(
            "fortnightly".parse::<Frequency>(),
            Err(Error::UnsupportedFrequency("fortnightly".to_owned()))
        );
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        currency::Currency,
        db::initialize,
        subscription::core::{
            Frequency, NewSubscription, create_subscription, delete_subscription,
            get_subscription, get_subscriptions_for_wallet, set_last_materialized,
        },
        user::{NewUser, Role, UserId, create_user},
        wallet::core::{NewWallet, WalletId, create_wallet},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_test_user(email: &str, conn: &Connection) -> UserId {
        create_user(
            NewUser {
                first_name: "Test".to_owned(),
                last_name: "User".to_owned(),
                email: email.to_owned(),
                role: Role::Owner,
            },
            conn,
        )
        .unwrap()
        .id
    }

    fn insert_test_wallet(owner_id: UserId, conn: &Connection) -> WalletId {
        create_wallet(
            NewWallet {
                name: "Test wallet".to_owned(),
                currency: Currency::Eur,
                balance: 1000.0,
                owner_id,
            },
            conn,
        )
        .unwrap()
        .id
    }

    fn netflix(wallet_id: WalletId, user_id: UserId) -> NewSubscription {
        NewSubscription {
            description: "Netflix".to_owned(),
            amount: 15.0,
            currency: Currency::Eur,
            expense: true,
            frequency: Frequency::Monthly,
            start_date: date!(2024 - 01 - 01),
            end_date: date!(2024 - 12 - 31),
            wallet_id,
            user_id,
        }
    }

    #[test]
    fn create_and_get_subscription() {
        let conn = get_test_connection();
        let user_id = insert_test_user("owner@example.com", &conn);
        let wallet_id = insert_test_wallet(user_id, &conn);

        let subscription = create_subscription(netflix(wallet_id, user_id), &conn).unwrap();

        assert_eq!(subscription.last_materialized, None);
        assert_eq!(
            get_subscription(subscription.id, &conn).unwrap(),
            subscription
        );
    }

    #[test]
    fn create_rejects_end_before_start() {
        let conn = get_test_connection();
        let user_id = insert_test_user("owner@example.com", &conn);
        let wallet_id = insert_test_wallet(user_id, &conn);

        let mut new_subscription = netflix(wallet_id, user_id);
        new_subscription.end_date = date!(2023 - 12 - 31);

        let result = create_subscription(new_subscription, &conn);

        assert_eq!(result, Err(Error::InvalidDateRange));
    }

    #[test]
    fn create_requires_authorization() {
        let conn = get_test_connection();
        let owner_id = insert_test_user("owner@example.com", &conn);
        let stranger_id = insert_test_user("stranger@example.com", &conn);
        let wallet_id = insert_test_wallet(owner_id, &conn);

        let result = create_subscription(netflix(wallet_id, stranger_id), &conn);

        assert_eq!(result, Err(Error::Unauthorized));
    }

    #[test]
    fn delete_requires_authorization() {
        let conn = get_test_connection();
        let owner_id = insert_test_user("owner@example.com", &conn);
        let stranger_id = insert_test_user("stranger@example.com", &conn);
        let wallet_id = insert_test_wallet(owner_id, &conn);
        let subscription = create_subscription(netflix(wallet_id, owner_id), &conn).unwrap();

        assert_eq!(
            delete_subscription(subscription.id, stranger_id, &conn),
            Err(Error::Unauthorized)
        );

        delete_subscription(subscription.id, owner_id, &conn).unwrap();

        assert_eq!(
            get_subscription(subscription.id, &conn),
            Err(Error::SubscriptionNotFound(subscription.id))
        );
    }

    #[test]
    fn delete_missing_subscription_fails() {
        let conn = get_test_connection();
        let user_id = insert_test_user("owner@example.com", &conn);

        assert_eq!(
            delete_subscription(99, user_id, &conn),
            Err(Error::SubscriptionNotFound(99))
        );
    }

    #[test]
    fn listing_requires_authorization() {
        let conn = get_test_connection();
        let owner_id = insert_test_user("owner@example.com", &conn);
        let stranger_id = insert_test_user("stranger@example.com", &conn);
        let wallet_id = insert_test_wallet(owner_id, &conn);
        create_subscription(netflix(wallet_id, owner_id), &conn).unwrap();

        assert_eq!(
            get_subscriptions_for_wallet(wallet_id, stranger_id, &conn),
            Err(Error::Unauthorized)
        );

        let subscriptions = get_subscriptions_for_wallet(wallet_id, owner_id, &conn).unwrap();
        assert_eq!(subscriptions.len(), 1);
    }

    #[test]
    fn checkpoint_round_trips() {
        let conn = get_test_connection();
        let user_id = insert_test_user("owner@example.com", &conn);
        let wallet_id = insert_test_wallet(user_id, &conn);
        let subscription = create_subscription(netflix(wallet_id, user_id), &conn).unwrap();

        set_last_materialized(subscription.id, date!(2024 - 02 - 01), &conn).unwrap();

        let subscription = get_subscription(subscription.id, &conn).unwrap();
        assert_eq!(subscription.last_materialized, Some(date!(2024 - 02 - 01)));
    }
}

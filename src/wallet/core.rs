//! Defines the core data model and database queries for wallets.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, currency::Currency, user::UserId};

/// A newtype wrapper for integer wallet IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct WalletId(i64);

impl WalletId {
    /// Create a new wallet ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the wallet ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for WalletId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for WalletId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_i64().map(WalletId)
    }
}

/// A named balance in a single currency, owned by one user and optionally
/// shared with others.
///
/// The balance is always expressed in the wallet's own currency. Any
/// transaction in a different currency must be converted before it mutates
/// the balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wallet {
    /// The ID of the wallet.
    pub id: WalletId,
    /// The display name of the wallet.
    pub name: String,
    /// The currency the balance is expressed in.
    pub currency: Currency,
    /// The current balance in the wallet's currency.
    pub balance: f64,
    /// The date the wallet was created.
    pub creation_date: Date,
    /// The ID of the user that owns the wallet.
    pub owner_id: UserId,
    /// The IDs of the users the wallet is shared with.
    pub shared_users: Vec<UserId>,
}

impl Wallet {
    /// Whether `user_id` may act on this wallet.
    ///
    /// True iff the user is the wallet's owner or a member of its shared-user
    /// set. Roles play no part here.
    pub fn is_authorized(&self, user_id: UserId) -> bool {
        self.owner_id == user_id || self.shared_users.contains(&user_id)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the wallet table and the wallet_share table that records which
/// users a wallet is shared with.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_wallet_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS wallet (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                currency TEXT NOT NULL,
                balance REAL NOT NULL,
                creation_date TEXT NOT NULL,
                owner_id INTEGER NOT NULL,
                FOREIGN KEY(owner_id) REFERENCES user(id)
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS wallet_share (
                wallet_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                PRIMARY KEY(wallet_id, user_id),
                FOREIGN KEY(wallet_id) REFERENCES wallet(id) ON DELETE CASCADE,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// The fields needed to create a new wallet.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWallet {
    /// The display name of the wallet.
    pub name: String,
    /// The currency the balance will be expressed in.
    pub currency: Currency,
    /// The opening balance in the wallet's currency.
    pub balance: f64,
    /// The ID of the user that will own the wallet.
    pub owner_id: UserId,
}

/// Create a new wallet in the database.
///
/// The creation date is set to today (UTC).
///
/// # Errors
/// This function will return a:
/// - [Error::UserNotFound] if `owner_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_wallet(new_wallet: NewWallet, connection: &Connection) -> Result<Wallet, Error> {
    let creation_date = OffsetDateTime::now_utc().date();

    connection
        .execute(
            "INSERT INTO wallet (name, currency, balance, creation_date, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &new_wallet.name,
                new_wallet.currency,
                new_wallet.balance,
                creation_date,
                new_wallet.owner_id,
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::UserNotFound(new_wallet.owner_id),
            error => error.into(),
        })?;

    let id = WalletId::new(connection.last_insert_rowid());

    Ok(Wallet {
        id,
        name: new_wallet.name,
        currency: new_wallet.currency,
        balance: new_wallet.balance,
        creation_date,
        owner_id: new_wallet.owner_id,
        shared_users: Vec::new(),
    })
}

/// Retrieve a wallet from the database by its `id`, including its owner ID
/// and the IDs of the users it is shared with.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if `id` does not refer to a valid wallet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_wallet(id: WalletId, connection: &Connection) -> Result<Wallet, Error> {
    let mut wallet = connection
        .prepare(
            "SELECT id, name, currency, balance, creation_date, owner_id
             FROM wallet WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_wallet_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::WalletNotFound(id),
            error => error.into(),
        })?;

    wallet.shared_users = get_shared_users(id, connection)?;

    Ok(wallet)
}

/// Retrieve all wallets, each with its owner ID and shared-user IDs.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_all_wallets(connection: &Connection) -> Result<Vec<Wallet>, Error> {
    let mut wallets = connection
        .prepare(
            "SELECT id, name, currency, balance, creation_date, owner_id
             FROM wallet ORDER BY id",
        )?
        .query_map([], map_wallet_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for wallet in &mut wallets {
        wallet.shared_users = get_shared_users(wallet.id, connection)?;
    }

    Ok(wallets)
}

/// Retrieve the wallets a user owns or shares, in that order.
///
/// # Errors
/// This function will return a:
/// - [Error::UserNotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_wallets_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Wallet>, Error> {
    crate::user::get_user_by_id(user_id, connection)?;

    let mut wallets = connection
        .prepare(
            "SELECT id, name, currency, balance, creation_date, owner_id FROM wallet
             WHERE owner_id = :id
                OR id IN (SELECT wallet_id FROM wallet_share WHERE user_id = :id)
             ORDER BY (owner_id != :id), id",
        )?
        .query_map(&[(":id", &user_id)], map_wallet_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for wallet in &mut wallets {
        wallet.shared_users = get_shared_users(wallet.id, connection)?;
    }

    Ok(wallets)
}

/// Add `user_id` to the shared-user set of `wallet_id` and return the
/// updated wallet.
///
/// # Errors
/// This function will return a:
/// - [Error::UserNotFound] if `user_id` does not refer to a registered user,
/// - or [Error::WalletNotFound] if `wallet_id` does not refer to a valid wallet,
/// - or [Error::AlreadyShared] if the user is already sharing the wallet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn add_shared_user(
    wallet_id: WalletId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Wallet, Error> {
    crate::user::get_user_by_id(user_id, connection)?;
    let wallet = get_wallet(wallet_id, connection)?;

    if wallet.shared_users.contains(&user_id) {
        return Err(Error::AlreadyShared);
    }

    connection.execute(
        "INSERT INTO wallet_share (wallet_id, user_id) VALUES (?1, ?2)",
        (wallet_id, user_id),
    )?;

    get_wallet(wallet_id, connection)
}

/// Remove `user_id` from the shared-user set of `wallet_id` and return the
/// updated wallet.
///
/// # Errors
/// This function will return a:
/// - [Error::UserNotFound] if `user_id` does not refer to a registered user,
/// - or [Error::WalletNotFound] if `wallet_id` does not refer to a valid wallet,
/// - or [Error::NotShared] if the user is not sharing the wallet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn remove_shared_user(
    wallet_id: WalletId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Wallet, Error> {
    crate::user::get_user_by_id(user_id, connection)?;
    let wallet = get_wallet(wallet_id, connection)?;

    if !wallet.shared_users.contains(&user_id) {
        return Err(Error::NotShared);
    }

    connection.execute(
        "DELETE FROM wallet_share WHERE wallet_id = ?1 AND user_id = ?2",
        (wallet_id, user_id),
    )?;

    get_wallet(wallet_id, connection)
}

/// Apply a balance delta to a wallet: decrement for an expense, increment
/// for income. Returns the updated balance.
///
/// This is a blind arithmetic update. Checking that an expense does not
/// overdraw the wallet is the caller's responsibility; the transaction
/// materializer uses [try_debit_balance] for that instead.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if `wallet_id` does not refer to a valid wallet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn apply_balance_delta(
    wallet_id: WalletId,
    amount: f64,
    expense: bool,
    connection: &Connection,
) -> Result<f64, Error> {
    let delta = if expense { -amount } else { amount };

    connection
        .prepare("UPDATE wallet SET balance = balance + ?1 WHERE id = ?2 RETURNING balance")?
        .query_row((delta, wallet_id), |row| row.get(0))
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::WalletNotFound(wallet_id),
            error => error.into(),
        })
}

/// Atomically debit `amount` from a wallet, but only if the balance is
/// sufficient.
///
/// The condition is evaluated inside the UPDATE itself so a concurrent
/// materialization cannot pass the sufficiency check against a stale
/// balance. The caller must have already resolved the wallet; a zero-row
/// update is therefore reported as [Error::InsufficientFunds].
///
/// # Errors
/// This function will return a:
/// - [Error::InsufficientFunds] if the debit would overdraw the wallet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn try_debit_balance(
    wallet_id: WalletId,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_changed = connection.execute(
        "UPDATE wallet SET balance = balance - ?1 WHERE id = ?2 AND balance >= ?1",
        (amount, wallet_id),
    )?;

    if rows_changed == 0 {
        return Err(Error::InsufficientFunds);
    }

    Ok(())
}

fn get_shared_users(wallet_id: WalletId, connection: &Connection) -> Result<Vec<UserId>, Error> {
    let shared_users = connection
        .prepare("SELECT user_id FROM wallet_share WHERE wallet_id = :id ORDER BY user_id")?
        .query_map(&[(":id", &wallet_id)], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(shared_users)
}

/// Map a database row to a [Wallet] with an empty shared-user set.
fn map_wallet_row(row: &Row) -> Result<Wallet, rusqlite::Error> {
    Ok(Wallet {
        id: row.get(0)?,
        name: row.get(1)?,
        currency: row.get(2)?,
        balance: row.get(3)?,
        creation_date: row.get(4)?,
        owner_id: row.get(5)?,
        shared_users: Vec::new(),
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        currency::Currency,
        db::initialize,
        user::{NewUser, Role, UserId, create_user},
        wallet::core::{
            NewWallet, WalletId, add_shared_user, apply_balance_delta, create_wallet,
            get_all_wallets, get_wallet, get_wallets_for_user, remove_shared_user,
            try_debit_balance,
        },
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

    fn insert_test_wallet(owner_id: UserId, balance: f64, conn: &Connection) -> WalletId {
        create_wallet(
            NewWallet {
                name: "Shared expenses".to_owned(),
                currency: Currency::Eur,
                balance,
                owner_id,
            },
            conn,
        )
        .unwrap()
        .id
    }

    #[test]
    fn create_and_get_wallet() {
        let conn = get_test_connection();
        let owner_id = insert_test_user("owner@example.com", &conn);

        let wallet_id = insert_test_wallet(owner_id, 250.0, &conn);
        let wallet = get_wallet(wallet_id, &conn).unwrap();

        assert_eq!(wallet.owner_id, owner_id);
        assert_eq!(wallet.balance, 250.0);
        assert_eq!(wallet.currency, Currency::Eur);
        assert!(wallet.shared_users.is_empty());
    }

    #[test]
    fn create_wallet_fails_for_unknown_owner() {
        let conn = get_test_connection();
        let owner_id = UserId::new(42);

        let result = create_wallet(
            NewWallet {
                name: "Orphan".to_owned(),
                currency: Currency::Usd,
                balance: 0.0,
                owner_id,
            },
            &conn,
        );

        assert_eq!(result, Err(Error::UserNotFound(owner_id)));
    }

    #[test]
    fn get_wallet_fails_with_non_existent_id() {
        let conn = get_test_connection();

        let id = WalletId::new(7);

        assert_eq!(get_wallet(id, &conn), Err(Error::WalletNotFound(id)));
    }

    #[test]
    fn share_and_unshare_wallet() {
        let conn = get_test_connection();
        let owner_id = insert_test_user("owner@example.com", &conn);
        let friend_id = insert_test_user("friend@example.com", &conn);
        let wallet_id = insert_test_wallet(owner_id, 100.0, &conn);

        let wallet = add_shared_user(wallet_id, friend_id, &conn).unwrap();
        assert_eq!(wallet.shared_users, vec![friend_id]);

        assert_eq!(
            add_shared_user(wallet_id, friend_id, &conn),
            Err(Error::AlreadyShared)
        );

        let wallet = remove_shared_user(wallet_id, friend_id, &conn).unwrap();
        assert!(wallet.shared_users.is_empty());

        assert_eq!(
            remove_shared_user(wallet_id, friend_id, &conn),
            Err(Error::NotShared)
        );
    }

    #[test]
    fn lists_owned_and_shared_wallets_for_user() {
        let conn = get_test_connection();
        let owner_id = insert_test_user("owner@example.com", &conn);
        let friend_id = insert_test_user("friend@example.com", &conn);
        let owned_wallet = insert_test_wallet(friend_id, 10.0, &conn);
        let shared_wallet = insert_test_wallet(owner_id, 20.0, &conn);
        add_shared_user(shared_wallet, friend_id, &conn).unwrap();
        // A wallet the friend has no access to.
        insert_test_wallet(owner_id, 30.0, &conn);

        let wallets = get_wallets_for_user(friend_id, &conn).unwrap();

        let ids: Vec<WalletId> = wallets.iter().map(|wallet| wallet.id).collect();
        assert_eq!(ids, vec![owned_wallet, shared_wallet]);

        assert_eq!(get_all_wallets(&conn).unwrap().len(), 3);
    }

    #[test]
    fn balance_delta_applies_both_directions() {
        let conn = get_test_connection();
        let owner_id = insert_test_user("owner@example.com", &conn);
        let wallet_id = insert_test_wallet(owner_id, 100.0, &conn);

        let balance = apply_balance_delta(wallet_id, 25.0, true, &conn).unwrap();
        assert_eq!(balance, 75.0);

        let balance = apply_balance_delta(wallet_id, 50.0, false, &conn).unwrap();
        assert_eq!(balance, 125.0);
    }

    #[test]
    fn conditional_debit_rejects_overdraw() {
        let conn = get_test_connection();
        let owner_id = insert_test_user("owner@example.com", &conn);
        let wallet_id = insert_test_wallet(owner_id, 50.0, &conn);

        let result = try_debit_balance(wallet_id, 100.0, &conn);

        assert_eq!(result, Err(Error::InsufficientFunds));
        assert_eq!(get_wallet(wallet_id, &conn).unwrap().balance, 50.0);

        try_debit_balance(wallet_id, 50.0, &conn).unwrap();
        assert_eq!(get_wallet(wallet_id, &conn).unwrap().balance, 0.0);
    }
}

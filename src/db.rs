//! Creates the application's database schema.

use rusqlite::Connection;

use crate::{
    subscription::core::create_subscription_table, transaction::core::create_transaction_table,
    user::create_user_table, wallet::core::create_wallet_tables,
};

/// Create the tables for the domain models.
///
/// Tables are created in dependency order so the foreign key references
/// resolve. The statements are idempotent, so calling this on an existing
/// database is safe.
///
/// # Errors
/// Returns an error if any table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    create_user_table(connection)?;
    create_wallet_tables(connection)?;
    create_transaction_table(connection)?;
    create_subscription_table(connection)?;

    Ok(())
}

//! Ledger transactions for the application.
//!
//! A transaction records money entering or leaving a wallet. Transactions
//! are immutable once created: there is no update path, and the amount is
//! stored already converted into the wallet's currency. This module
//! contains:
//! - The [Transaction] model and the materializer that creates transactions
//!   atomically with the wallet balance update
//! - Route handlers for creating and listing transactions

pub mod core;
mod create_endpoint;
mod list_endpoint;

pub use core::{NewTransaction, Transaction};
pub use create_endpoint::create_transaction_endpoint;
pub use list_endpoint::get_wallet_transactions_endpoint;

//! Wallet management for the application.
//!
//! A wallet is a named balance in a single currency, owned by one user and
//! optionally shared with others. This module contains:
//! - The [Wallet] model, its authorization rule and database functions
//! - Route handlers for creating, listing and sharing wallets

pub mod core;
mod create_endpoint;
mod list_endpoint;
mod share_endpoint;

pub use core::{Wallet, WalletId};
pub use create_endpoint::create_wallet_endpoint;
pub use list_endpoint::{get_user_wallets_endpoint, get_wallets_endpoint};
pub use share_endpoint::{add_shared_user_endpoint, remove_shared_user_endpoint};

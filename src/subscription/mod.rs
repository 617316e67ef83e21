//! Recurring subscriptions and the engine that materializes them into
//! ledger transactions.
//!
//! A subscription describes a recurring obligation (e.g. "Netflix, 15 EUR,
//! monthly") against a wallet. The processor walks all subscriptions,
//! decides which have a due occurrence, and materializes each due
//! occurrence into exactly one transaction. This module contains:
//! - The [Subscription] model, [Frequency] and database functions
//! - The pure cycle calculator in [schedule]
//! - The processor and its scheduled/manual triggers

pub mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;
mod process_endpoint;
pub mod processor;
pub mod schedule;

pub use core::{Frequency, Subscription};
pub use create_endpoint::create_subscription_endpoint;
pub use delete_endpoint::delete_subscription_endpoint;
pub use list_endpoint::get_wallet_subscriptions_endpoint;
pub use process_endpoint::process_subscriptions_endpoint;
pub use processor::{ProcessOutcome, process_due_subscriptions};

//! Application router configuration.

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::{
    AppState, endpoints,
    subscription::{
        create_subscription_endpoint, delete_subscription_endpoint,
        get_wallet_subscriptions_endpoint, process_subscriptions_endpoint,
    },
    transaction::{create_transaction_endpoint, get_wallet_transactions_endpoint},
    user::create_user_endpoint,
    wallet::{
        add_shared_user_endpoint, create_wallet_endpoint, get_user_wallets_endpoint,
        get_wallets_endpoint, remove_shared_user_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::USERS, post(create_user_endpoint))
        .route(
            endpoints::WALLETS,
            post(create_wallet_endpoint).get(get_wallets_endpoint),
        )
        .route(endpoints::USER_WALLETS, get(get_user_wallets_endpoint))
        .route(
            endpoints::WALLET_SHARED_USER,
            post(add_shared_user_endpoint).delete(remove_shared_user_endpoint),
        )
        .route(endpoints::TRANSACTIONS, post(create_transaction_endpoint))
        .route(
            endpoints::WALLET_TRANSACTIONS,
            get(get_wallet_transactions_endpoint),
        )
        .route(
            endpoints::SUBSCRIPTIONS,
            post(create_subscription_endpoint),
        )
        .route(
            endpoints::SUBSCRIPTION,
            delete(delete_subscription_endpoint),
        )
        .route(
            endpoints::WALLET_SUBSCRIPTIONS,
            get(get_wallet_subscriptions_endpoint),
        )
        .route(
            endpoints::PROCESS_SUBSCRIPTIONS,
            post(process_subscriptions_endpoint),
        )
        .with_state(state)
}

//! The API endpoint URIs.

/// The route for registering a user.
pub const USERS: &str = "/api/users";
/// The route for creating and listing wallets.
pub const WALLETS: &str = "/api/wallets";
/// The route for listing the wallets a user owns or shares.
pub const USER_WALLETS: &str = "/api/users/{user_id}/wallets";
/// The route for granting and revoking shared access to a wallet.
pub const WALLET_SHARED_USER: &str = "/api/wallets/{wallet_id}/shared_users/{user_id}";
/// The route for materializing a transaction.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for listing a wallet's transactions.
pub const WALLET_TRANSACTIONS: &str = "/api/wallets/{wallet_id}/transactions";
/// The route for creating a subscription.
pub const SUBSCRIPTIONS: &str = "/api/subscriptions";
/// The route for deleting a subscription.
pub const SUBSCRIPTION: &str = "/api/subscriptions/{subscription_id}";
/// The route for listing a wallet's subscriptions.
pub const WALLET_SUBSCRIPTIONS: &str = "/api/wallets/{wallet_id}/subscriptions";
/// The route for manually triggering a subscription processing pass.
pub const PROCESS_SUBSCRIPTIONS: &str = "/api/subscriptions/process";

#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::USERS);
        assert_endpoint_is_valid_uri(endpoints::WALLETS);
        assert_endpoint_is_valid_uri(endpoints::USER_WALLETS);
        assert_endpoint_is_valid_uri(endpoints::WALLET_SHARED_USER);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::WALLET_TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::SUBSCRIPTIONS);
        assert_endpoint_is_valid_uri(endpoints::SUBSCRIPTION);
        assert_endpoint_is_valid_uri(endpoints::WALLET_SUBSCRIPTIONS);
        assert_endpoint_is_valid_uri(endpoints::PROCESS_SUBSCRIPTIONS);
    }
}

//! Defines the endpoint for creating a new subscription.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    AppState, Error,
    subscription::core::{NewSubscription, create_subscription},
};

/// A route handler for creating a subscription against a wallet the acting
/// user owns or shares.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_subscription_endpoint(
    State(state): State<AppState>,
    Json(new_subscription): Json<NewSubscription>,
) -> Result<impl IntoResponse + std::fmt::Debug, Error> {
    let connection = state.db_connection.lock().unwrap();

    let subscription = create_subscription(new_subscription, &connection)?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

#[cfg(test)]
mod create_subscription_endpoint_tests {
    use axum::{Json, extract::State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        AppState, Error,
        currency::{Currency, ExchangeRates},
        subscription::{
            core::{Frequency, NewSubscription},
            create_endpoint::create_subscription_endpoint,
        },
        user::{NewUser, Role, UserId, create_user},
        wallet::core::{NewWallet, WalletId, create_wallet},
    };

    fn get_test_state() -> (AppState, UserId, WalletId) {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(conn, ExchangeRates::default()).unwrap();

        let (user_id, wallet_id) = {
            let connection = state.db_connection.lock().unwrap();
            let user_id = create_user(
                NewUser {
                    first_name: "Test".to_owned(),
                    last_name: "User".to_owned(),
                    email: "test@example.com".to_owned(),
                    role: Role::Owner,
                },
                &connection,
            )
            .unwrap()
            .id;
            let wallet_id = create_wallet(
                NewWallet {
                    name: "Test wallet".to_owned(),
                    currency: Currency::Eur,
                    balance: 1000.0,
                    owner_id: user_id,
                },
                &connection,
            )
            .unwrap()
            .id;

            (user_id, wallet_id)
        };

        (state, user_id, wallet_id)
    }

    #[tokio::test]
    async fn creates_subscription() {
        let (state, user_id, wallet_id) = get_test_state();

        let result = create_subscription_endpoint(
            State(state),
            Json(NewSubscription {
                description: "Gym".to_owned(),
                amount: 29.99,
                currency: Currency::Eur,
                expense: true,
                frequency: Frequency::Monthly,
                start_date: date!(2024 - 01 - 01),
                end_date: date!(2024 - 12 - 31),
                wallet_id,
                user_id,
            }),
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn rejects_unknown_wallet() {
        let (state, user_id, _) = get_test_state();
        let missing_wallet = WalletId::new(404);

        let result = create_subscription_endpoint(
            State(state),
            Json(NewSubscription {
                description: "Gym".to_owned(),
                amount: 29.99,
                currency: Currency::Eur,
                expense: true,
                frequency: Frequency::Monthly,
                start_date: date!(2024 - 01 - 01),
                end_date: date!(2024 - 12 - 31),
                wallet_id: missing_wallet,
                user_id,
            }),
        )
        .await;

        assert_eq!(result.unwrap_err(), Error::WalletNotFound(missing_wallet));
    }
}

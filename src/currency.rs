//! The currencies that wallets can be denominated in and the exchange rate
//! table used to convert between them.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A currency that a wallet or transaction amount can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    /// The euro.
    Eur,
    /// The United States dollar.
    Usd,
    /// The pound sterling.
    Gbp,
}

impl Currency {
    /// The ISO 4217 code for the currency.
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            _ => Err(Error::UnsupportedCurrency(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.as_str().to_owned()
    }
}

impl ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Currency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The exchange rate table used to convert transaction amounts into the
/// wallet currency.
///
/// The table is constructed once at startup and passed into
/// [AppState](crate::AppState) rather than read from process-wide state, so
/// tests and deployments can supply their own rates.
#[derive(Debug, Clone)]
pub struct ExchangeRates {
    rates: Vec<(Currency, Currency, f64)>,
}

impl ExchangeRates {
    /// Create an exchange rate table from `(from, to, rate)` entries.
    pub fn new(rates: Vec<(Currency, Currency, f64)>) -> Self {
        Self { rates }
    }

    /// Convert `amount` from one currency into another.
    ///
    /// If the currencies are equal, `amount` is returned unchanged with no
    /// rounding. Otherwise the result is rounded to 2 decimal places with
    /// half-away-from-zero rounding, e.g. 0.4875 rounds to 0.49.
    ///
    /// # Errors
    /// Returns [Error::UnknownCurrencyPair] if the table has no rate for the
    /// requested pair.
    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> Result<f64, Error> {
        if from == to {
            return Ok(amount);
        }

        let rate = self
            .rates
            .iter()
            .find(|(rate_from, rate_to, _)| *rate_from == from && *rate_to == to)
            .map(|(_, _, rate)| *rate)
            .ok_or(Error::UnknownCurrencyPair(from, to))?;

        Ok((amount * rate * 100.0).round() / 100.0)
    }
}

impl Default for ExchangeRates {
    /// The triangular EUR/USD/GBP table the application ships with.
    fn default() -> Self {
        Self::new(vec![
            (Currency::Usd, Currency::Eur, 0.96),
            (Currency::Usd, Currency::Gbp, 0.78),
            (Currency::Eur, Currency::Usd, 1.04),
            (Currency::Eur, Currency::Gbp, 0.82),
            (Currency::Gbp, Currency::Usd, 1.22),
            (Currency::Gbp, Currency::Eur, 1.18),
        ])
    }
}


#[cfg(test)]
mod exchange_rate_tests {
    use crate::{
        Error,
        currency::{Currency, ExchangeRates},
    };

    #[test]
    fn same_currency_returns_amount_unchanged() {
        let rates = ExchangeRates::default();

        for currency in [Currency::Eur, Currency::Usd, Currency::Gbp] {
            let amount = 123.456;

            let converted = rates.convert(amount, currency, currency).unwrap();

            assert_eq!(
                amount, converted,
                "want amount unchanged for {currency}, got {converted}"
            );
        }
    }

    #[test]
    fn conversion_is_deterministic() {
        let rates = ExchangeRates::default();

        let first = rates.convert(57.31, Currency::Usd, Currency::Gbp).unwrap();
        let second = rates.convert(57.31, Currency::Usd, Currency::Gbp).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn converts_with_table_rate() {
        let rates = ExchangeRates::default();

        let converted = rates.convert(100.0, Currency::Usd, Currency::Eur).unwrap();

        assert_eq!(converted, 96.0);
    }

    #[test]
    fn rounds_to_two_decimal_places() {
        let rates = ExchangeRates::default();

        // 12.49 * 0.96 = 11.9904
        let converted = rates.convert(12.49, Currency::Usd, Currency::Eur).unwrap();
        assert_eq!(converted, 11.99);

        // 0.625 * 0.78 = 0.4875, the half rounds away from zero.
        let converted = rates.convert(0.625, Currency::Usd, Currency::Gbp).unwrap();
        assert_eq!(converted, 0.49);
    }

    #[test]
    fn missing_pair_is_an_error() {
        let rates = ExchangeRates::new(vec![(Currency::Usd, Currency::Eur, 0.96)]);

        let result = rates.convert(10.0, Currency::Eur, Currency::Gbp);

        assert_eq!(
            result,
            Err(Error::UnknownCurrencyPair(Currency::Eur, Currency::Gbp))
        );
    }
}

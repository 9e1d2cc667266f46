//! Currency conversion through the TRY pivot

use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Currency {
    Try,
    Usd,
    Eur,
}

impl Currency {
    /// The currency every cross conversion is routed through.
    pub const PIVOT: Currency = Currency::Try;

    pub const ALL: [Currency; 3] = [Currency::Try, Currency::Usd, Currency::Eur];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Try => "TRY",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRY" => Ok(Currency::Try),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            _ => Err(anyhow::anyhow!("Invalid currency: {}", s)),
        }
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// User supplied rates to the pivot currency. The pivot itself is fixed at 1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExchangeRates {
    usd_try: Option<f64>,
    eur_try: Option<f64>,
}

impl ExchangeRates {
    pub fn new(usd_try: Option<f64>, eur_try: Option<f64>) -> Self {
        Self {
            usd_try: usd_try.filter(|r| is_valid_rate(*r)),
            eur_try: eur_try.filter(|r| is_valid_rate(*r)),
        }
    }

    /// Returns the rate to the pivot, or `None` while the rate is unset.
    pub fn rate_to_pivot(&self, currency: Currency) -> Option<f64> {
        match currency {
            Currency::Try => Some(1.0),
            Currency::Usd => self.usd_try,
            Currency::Eur => self.eur_try,
        }
    }

    /// Sets or clears a rate. Non-positive and non-finite values clear it.
    pub fn set(&mut self, currency: Currency, rate: Option<f64>) -> Result<()> {
        let rate = rate.filter(|r| is_valid_rate(*r));
        match currency {
            Currency::Try => bail!("Rate of the pivot currency {} is fixed at 1", Currency::PIVOT),
            Currency::Usd => self.usd_try = rate,
            Currency::Eur => self.eur_try = rate,
        }
        Ok(())
    }
}

fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Outcome of converting an amount into another currency.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionResult {
    Converted(f64),
    Unconvertible(String),
}

impl ConversionResult {
    pub fn value(&self) -> Option<f64> {
        match self {
            ConversionResult::Converted(v) => Some(*v),
            ConversionResult::Unconvertible(_) => None,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, ConversionResult::Converted(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ConversionResult::Converted(_) => None,
            ConversionResult::Unconvertible(reason) => Some(reason),
        }
    }
}

/// Converts `amount` from one currency to another via the pivot.
///
/// Identical currencies short-circuit and never consult the rates. No
/// rounding happens here.
pub fn convert(
    amount: f64,
    from: Currency,
    to: Currency,
    rates: &ExchangeRates,
) -> ConversionResult {
    if from == to {
        return ConversionResult::Converted(amount);
    }

    let (Some(rate_from), Some(rate_to)) = (rates.rate_to_pivot(from), rates.rate_to_pivot(to))
    else {
        let missing = if rates.rate_to_pivot(from).is_none() {
            from
        } else {
            to
        };
        debug!("No rate to convert {amount} {from} -> {to}, {missing} is unset");
        return ConversionResult::Unconvertible(format!("missing rate for {missing}"));
    };

    let pivot_value = amount * rate_from;
    ConversionResult::Converted(pivot_value / rate_to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_same_currency_ignores_rates() {
        let rates = ExchangeRates::default();
        for currency in Currency::ALL {
            assert_eq!(
                convert(123.45, currency, currency, &rates),
                ConversionResult::Converted(123.45)
            );
        }
    }

    #[test]
    fn test_convert_through_pivot() {
        let rates = ExchangeRates::new(Some(30.0), Some(33.0));

        assert_eq!(
            convert(100.0, Currency::Usd, Currency::Try, &rates),
            ConversionResult::Converted(3000.0)
        );
        assert_eq!(
            convert(3300.0, Currency::Try, Currency::Eur, &rates),
            ConversionResult::Converted(100.0)
        );
        let usd = convert(110.0, Currency::Eur, Currency::Usd, &rates)
            .value()
            .unwrap();
        assert_relative_eq!(usd, 121.0, max_relative = 1e-12);
    }

    #[test]
    fn test_round_trip_between_non_pivot_currencies() {
        let rates = ExchangeRates::new(Some(32.17), Some(35.91));
        for amount in [0.0, 1.0, 99.99, 1_234_567.89] {
            let eur = convert(amount, Currency::Usd, Currency::Eur, &rates)
                .value()
                .unwrap();
            let back = convert(eur, Currency::Eur, Currency::Usd, &rates)
                .value()
                .unwrap();
            assert_relative_eq!(back, amount, epsilon = 1e-9, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_missing_rate_is_unconvertible() {
        let rates = ExchangeRates::new(Some(30.0), None);

        let result = convert(10.0, Currency::Eur, Currency::Try, &rates);
        assert_eq!(result.reason(), Some("missing rate for EUR"));
        assert!(result.value().is_none());

        let result = convert(10.0, Currency::Usd, Currency::Eur, &rates);
        assert_eq!(result.reason(), Some("missing rate for EUR"));

        let result = convert(10.0, Currency::Try, Currency::Usd, &ExchangeRates::default());
        assert_eq!(result.reason(), Some("missing rate for USD"));
    }

    #[test]
    fn test_invalid_rates_are_unset() {
        let rates = ExchangeRates::new(Some(0.0), Some(f64::NAN));
        assert_eq!(rates.rate_to_pivot(Currency::Usd), None);
        assert_eq!(rates.rate_to_pivot(Currency::Eur), None);

        let mut rates = ExchangeRates::default();
        rates.set(Currency::Usd, Some(-5.0)).unwrap();
        assert_eq!(rates.rate_to_pivot(Currency::Usd), None);
        rates.set(Currency::Usd, Some(31.5)).unwrap();
        assert_eq!(rates.rate_to_pivot(Currency::Usd), Some(31.5));
    }

    #[test]
    fn test_pivot_rate_is_fixed() {
        let mut rates = ExchangeRates::default();
        assert_eq!(rates.rate_to_pivot(Currency::Try), Some(1.0));

        let err = rates.set(Currency::Try, Some(2.0)).unwrap_err();
        assert!(err.to_string().contains("fixed at 1"));
        assert_eq!(rates.rate_to_pivot(Currency::Try), Some(1.0));
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" EUR ".parse::<Currency>().unwrap(), Currency::Eur);
        assert!("GBP".parse::<Currency>().is_err());
        assert_eq!(Currency::Try.to_string(), "TRY");
    }
}

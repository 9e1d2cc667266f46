//! Cost line items as supplied by the host

use crate::core::annual::Frequency;
use crate::core::currency::Currency;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CostItem {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_price: f64,
    #[serde(default, deserialize_with = "lenient_optional_amount")]
    pub total: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: Currency,
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "optional_opaque_id")]
    pub risk_id: Option<String>,
}

impl CostItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
        quantity: f64,
        unit_price: f64,
        currency: Currency,
        frequency: Frequency,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            unit: None,
            quantity: sanitize_amount(quantity),
            unit_price: sanitize_amount(unit_price),
            total: None,
            currency,
            frequency,
            description: None,
            risk_id: None,
        }
    }

    pub fn with_total(mut self, total: f64) -> Self {
        self.total = Some(sanitize_amount(total));
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_risk(mut self, risk_id: impl Into<String>) -> Self {
        self.risk_id = Some(risk_id.into());
        self
    }

    /// The supplied total when present, otherwise `quantity * unit_price`.
    pub fn total(&self) -> f64 {
        self.total
            .unwrap_or_else(|| sanitize_amount(self.quantity) * sanitize_amount(self.unit_price))
    }

    /// Names of the fields that would be rejected by the entry form.
    pub fn validate(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if self.title.trim().is_empty() {
            invalid.push("title");
        }
        if self.category.trim().is_empty() {
            invalid.push("category");
        }
        if self.unit.as_deref().is_none_or(|u| u.trim().is_empty()) {
            invalid.push("unit");
        }
        if self.quantity <= 0.0 {
            invalid.push("quantity");
        }
        if self.unit_price <= 0.0 {
            invalid.push("unit_price");
        }
        invalid
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

/// Parses a quantity or price typed by a user. Anything that is not a
/// finite, non-negative number becomes 0.
pub fn coerce_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => {
            warn!("Invalid amount {raw:?}, using 0");
            0.0
        }
    }
}

/// Parses an amortization period typed by a user. Fractions are truncated;
/// malformed input and values below 1 become 1.
pub fn coerce_years(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => years_from_number(v),
        _ => {
            warn!("Invalid amortization years {raw:?}, using 1");
            1
        }
    }
}

/// Truncates a finite year count and clamps it to at least 1.
pub(crate) fn years_from_number(years: f64) -> u32 {
    let years = years.trunc();
    if years < 1.0 {
        1
    } else {
        years.min(f64::from(u32::MAX)) as u32
    }
}

fn sanitize_amount(v: f64) -> f64 {
    if v.is_finite() && v >= 0.0 { v } else { 0.0 }
}

/// Reads a number from a JSON or YAML scalar, accepting numeric strings.
pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn default_currency() -> Currency {
    Currency::PIVOT
}

fn default_frequency() -> Frequency {
    Frequency::OneTime
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match number_from_value(&value) {
        Some(v) if v >= 0.0 => v,
        _ => {
            warn!("Invalid amount {value}, using 0");
            0.0
        }
    })
}

fn lenient_optional_amount<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(match number_from_value(&value) {
        Some(v) if v >= 0.0 => Some(v),
        _ => {
            warn!("Invalid total {value}, deriving it from quantity and price");
            None
        }
    })
}

fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "Invalid identifier: {other}"
        ))),
    }
}

fn optional_opaque_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

use crate::core::annual::{AnnualizationConfig, OneTimePolicy};
use crate::core::currency::{Currency, ExchangeRates};
use crate::core::item::{CostItem, coerce_years, number_from_value, years_from_number};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::{fs, path::PathBuf};
use tracing::{debug, warn};

/// Everything a computation needs besides the items themselves.
///
/// Computations take this by reference and read it once, so a caller that
/// wants to change several fields builds a new value and swaps it in.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSettings {
    pub base_currency: Currency,
    pub rates: ExchangeRates,
    pub annual_config: AnnualizationConfig,
    pub use_annual_for_ranking: bool,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            base_currency: Currency::PIVOT,
            rates: ExchangeRates::default(),
            annual_config: AnnualizationConfig::default(),
            use_annual_for_ranking: true,
        }
    }
}

impl AggregationSettings {
    /// Rebuilds settings from their persisted key-value form.
    ///
    /// Each field is read on its own; a missing or malformed field falls back
    /// to its default without affecting the others.
    pub fn from_persisted(value: &Value) -> Self {
        let defaults = Self::default();
        let Some(map) = value.as_object() else {
            if !value.is_null() {
                warn!("Persisted settings are not a map, using defaults");
            }
            return defaults;
        };

        let base_currency = read_field(map, "baseCurrency", |v| {
            v.as_str()?.parse::<Currency>().ok()
        })
        .unwrap_or(defaults.base_currency);
        let usd_try = read_field(map, "usdTry", read_rate);
        let eur_try = read_field(map, "eurTry", read_rate);
        let one_time_policy = read_field(map, "oneTimePolicy", |v| {
            v.as_str()?.parse::<OneTimePolicy>().ok()
        })
        .unwrap_or(defaults.annual_config.one_time_policy);
        let amortize_years = read_field(map, "amortizeYears", read_years)
            .unwrap_or(defaults.annual_config.amortize_years);
        let use_annual_for_ranking = read_field(map, "paretoUseAnnual", read_bool)
            .unwrap_or(defaults.use_annual_for_ranking);

        Self {
            base_currency,
            rates: ExchangeRates::new(usd_try, eur_try),
            annual_config: AnnualizationConfig {
                one_time_policy,
                amortize_years,
            },
            use_annual_for_ranking,
        }
    }

    /// The persisted key-value form. Unset rates are stored as empty strings.
    pub fn to_persisted(&self) -> Value {
        let rate = |c: Currency| {
            self.rates
                .rate_to_pivot(c)
                .map_or_else(|| json!(""), |r| json!(r))
        };
        json!({
            "baseCurrency": self.base_currency.code(),
            "usdTry": rate(Currency::Usd),
            "eurTry": rate(Currency::Eur),
            "oneTimePolicy": self.annual_config.one_time_policy.code(),
            "amortizeYears": self.annual_config.amortize_years,
            "paretoUseAnnual": self.use_annual_for_ranking,
        })
    }
}

fn read_field<T>(
    map: &Map<String, Value>,
    key: &str,
    parse: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = map.get(key)?;
    let parsed = parse(value);
    if parsed.is_none() && !is_blank(value) {
        warn!("Ignoring malformed setting {key}: {value}");
    }
    parsed
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn read_rate(value: &Value) -> Option<f64> {
    number_from_value(value).filter(|r| *r > 0.0)
}

fn read_years(value: &Value) -> Option<u32> {
    number_from_value(value).map(years_from_number)
}

fn read_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Per-run replacements for persisted settings, as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub base_currency: Option<String>,
    pub usd_try: Option<String>,
    pub eur_try: Option<String>,
    pub one_time_policy: Option<String>,
    pub amortize_years: Option<String>,
    pub raw_ranking: bool,
}

impl SettingsOverrides {
    /// Applies the overrides. Unknown enum values are rejected; numeric
    /// fields are coerced like any other user input.
    pub fn apply(&self, settings: &mut AggregationSettings) -> Result<()> {
        if let Some(base) = &self.base_currency {
            settings.base_currency = base.parse().context("Invalid --base")?;
        }
        if let Some(rate) = &self.usd_try {
            settings.rates.set(Currency::Usd, override_rate(Currency::Usd, rate))?;
        }
        if let Some(rate) = &self.eur_try {
            settings.rates.set(Currency::Eur, override_rate(Currency::Eur, rate))?;
        }
        if let Some(policy) = &self.one_time_policy {
            settings.annual_config.one_time_policy =
                policy.parse::<OneTimePolicy>().context("Invalid --one-time-policy")?;
        }
        if let Some(years) = &self.amortize_years {
            settings.annual_config.amortize_years = coerce_years(years);
        }
        if self.raw_ranking {
            settings.use_annual_for_ranking = false;
        }
        Ok(())
    }
}

/// A typed rate. Blank clears it silently; anything that is not a positive
/// number also clears it, with a warning.
fn override_rate(currency: Currency, raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Some(v),
        _ => {
            warn!("Invalid {currency} rate {raw:?}, leaving it unset");
            None
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub items: Vec<CostItem>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "riskcost", "riskcost")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config with {} items", config.items.len());
        Ok(config)
    }

    pub fn aggregation_settings(&self) -> AggregationSettings {
        AggregationSettings::from_persisted(&self.settings)
    }
}

//! Annualization of recurring and one-time costs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;

/// Default number of years a one-time cost is spread over.
pub const DEFAULT_AMORTIZE_YEARS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Frequency {
    OneTime,
    Monthly,
    Yearly,
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Frequency::OneTime => "OneTime",
                Frequency::Monthly => "Monthly",
                Frequency::Yearly => "Yearly",
            }
        )
    }
}

impl FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "onetime" | "one-time" | "one_time" | "once" | "tek sefer" => Ok(Frequency::OneTime),
            "monthly" | "aylık" | "aylik" => Ok(Frequency::Monthly),
            "yearly" | "annual" | "yıllık" | "yillik" => Ok(Frequency::Yearly),
            _ => Err(anyhow::anyhow!("Invalid frequency: {}", s)),
        }
    }
}

impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// How a one-time cost contributes to an annual figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OneTimePolicy {
    #[default]
    FullValue,
    ZeroValue,
    AmortizeOverYears,
}

impl OneTimePolicy {
    /// Short code used in persisted settings.
    pub fn code(&self) -> &'static str {
        match self {
            OneTimePolicy::FullValue => "1x",
            OneTimePolicy::ZeroValue => "0x",
            OneTimePolicy::AmortizeOverYears => "amortize",
        }
    }
}

impl Display for OneTimePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OneTimePolicy::FullValue => "FullValue",
                OneTimePolicy::ZeroValue => "ZeroValue",
                OneTimePolicy::AmortizeOverYears => "AmortizeOverYears",
            }
        )
    }
}

impl FromStr for OneTimePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1x" | "full" | "fullvalue" => Ok(OneTimePolicy::FullValue),
            "0x" | "zero" | "zerovalue" => Ok(OneTimePolicy::ZeroValue),
            "amortize" | "amortizeoveryears" => Ok(OneTimePolicy::AmortizeOverYears),
            _ => Err(anyhow::anyhow!("Invalid one-time policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnualizationConfig {
    pub one_time_policy: OneTimePolicy,
    pub amortize_years: u32,
}

impl Default for AnnualizationConfig {
    fn default() -> Self {
        Self {
            one_time_policy: OneTimePolicy::FullValue,
            amortize_years: DEFAULT_AMORTIZE_YEARS,
        }
    }
}

/// Multiplier turning a cost of the given frequency into its yearly equivalent.
pub fn annual_factor(frequency: Frequency, config: &AnnualizationConfig) -> f64 {
    match frequency {
        Frequency::Monthly => 12.0,
        Frequency::Yearly => 1.0,
        Frequency::OneTime => match config.one_time_policy {
            OneTimePolicy::FullValue => 1.0,
            OneTimePolicy::ZeroValue => 0.0,
            OneTimePolicy::AmortizeOverYears => 1.0 / f64::from(config.amortize_years.max(1)),
        },
    }
}

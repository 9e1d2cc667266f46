//! Aggregation of cost items into native and base-currency totals.
use crate::core::annual::{Frequency, annual_factor};
use crate::core::config::AggregationSettings;
use crate::core::currency::{ConversionResult, Currency, convert};
use crate::core::item::{CostItem, coerce_amount};
use std::collections::BTreeMap;
use tracing::debug;

/// The normalized values of a single cost item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemValue {
    pub id: String,
    pub currency: Currency,
    pub raw_total: f64,
    pub annual_factor: f64,
    pub annual_total: f64,
    pub base_total: ConversionResult,
    pub base_annual_total: ConversionResult,
}

impl ItemValue {
    /// The base value used for ranking under the given settings.
    pub fn ranking_value(&self, use_annual: bool) -> &ConversionResult {
        if use_annual {
            &self.base_annual_total
        } else {
            &self.base_total
        }
    }
}

/// Totals over a set of cost items, normalized to a base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct CostSummary {
    pub items: Vec<ItemValue>,
    pub totals_by_currency: BTreeMap<Currency, f64>,
    pub annual_totals_by_currency: BTreeMap<Currency, f64>,
    pub total_base: ConversionResult,
    pub annual_total_base: ConversionResult,
    pub base_currency: Currency,
    pub use_annual_for_ranking: bool,
}

impl CostSummary {
    /// True when the native totals span more than one currency and cannot be
    /// shown as a single sum without conversion.
    pub fn is_mixed_currency(&self) -> bool {
        self.totals_by_currency.len() > 1
    }

    /// The native total when every item shares one currency.
    pub fn single_currency_total(&self) -> Option<(Currency, f64)> {
        if self.totals_by_currency.len() == 1 {
            self.totals_by_currency.iter().next().map(|(c, v)| (*c, *v))
        } else {
            None
        }
    }

    /// The base total matching the ranking basis.
    pub fn ranking_total(&self) -> &ConversionResult {
        if self.use_annual_for_ranking {
            &self.annual_total_base
        } else {
            &self.total_base
        }
    }
}

/// Computes raw, annual and base-currency values for one item.
pub fn evaluate_item(item: &CostItem, settings: &AggregationSettings) -> ItemValue {
    let raw_total = item.total();
    let factor = annual_factor(item.frequency, &settings.annual_config);
    let annual_total = raw_total * factor;

    let base_total = convert(
        raw_total,
        item.currency,
        settings.base_currency,
        &settings.rates,
    );
    let base_annual_total = convert(
        annual_total,
        item.currency,
        settings.base_currency,
        &settings.rates,
    );
    if let Some(reason) = base_total.reason() {
        debug!("Item {} cannot be converted: {}", item.id, reason);
    }

    ItemValue {
        id: item.id.clone(),
        currency: item.currency,
        raw_total,
        annual_factor: factor,
        annual_total,
        base_total,
        base_annual_total,
    }
}

/// Aggregates items under a settings snapshot.
///
/// Base totals are only reported when every item converts; otherwise they are
/// `Unconvertible` and the per-currency totals remain as a fallback.
pub fn aggregate<'a>(
    items: impl IntoIterator<Item = &'a CostItem>,
    settings: &AggregationSettings,
) -> CostSummary {
    let mut values = Vec::new();
    let mut totals_by_currency: BTreeMap<Currency, f64> = BTreeMap::new();
    let mut annual_totals_by_currency: BTreeMap<Currency, f64> = BTreeMap::new();
    let mut total_base = 0.0;
    let mut annual_total_base = 0.0;
    let mut missing: Vec<String> = Vec::new();

    for item in items {
        let value = evaluate_item(item, settings);

        *totals_by_currency.entry(value.currency).or_default() += value.raw_total;
        *annual_totals_by_currency.entry(value.currency).or_default() += value.annual_total;

        for result in [&value.base_total, &value.base_annual_total] {
            if let Some(reason) = result.reason()
                && !missing.iter().any(|m| m == reason)
            {
                missing.push(reason.to_string());
            }
        }
        if let Some(v) = value.base_total.value() {
            total_base += v;
        }
        if let Some(v) = value.base_annual_total.value() {
            annual_total_base += v;
        }

        values.push(value);
    }

    let settle = |sum: f64, all_converted: bool| {
        if all_converted {
            ConversionResult::Converted(sum)
        } else {
            ConversionResult::Unconvertible(missing.join(", "))
        }
    };
    let total_base = settle(total_base, values.iter().all(|v| v.base_total.is_converted()));
    let annual_total_base = settle(
        annual_total_base,
        values.iter().all(|v| v.base_annual_total.is_converted()),
    );

    debug!(
        "Aggregated {} items into {} ({} currencies)",
        values.len(),
        settings.base_currency,
        totals_by_currency.len()
    );

    CostSummary {
        items: values,
        totals_by_currency,
        annual_totals_by_currency,
        total_base,
        annual_total_base,
        base_currency: settings.base_currency,
        use_annual_for_ranking: settings.use_annual_for_ranking,
    }
}

/// Live totals for a line that is still being typed.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePreview {
    pub total: f64,
    pub annual_total: f64,
    pub base_total: ConversionResult,
    pub base_annual_total: ConversionResult,
}

/// Computes the totals of an unsaved line from raw form input. Malformed
/// quantity or price text counts as 0.
pub fn preview(
    quantity: &str,
    unit_price: &str,
    currency: Currency,
    frequency: Frequency,
    settings: &AggregationSettings,
) -> LinePreview {
    let total = coerce_amount(quantity) * coerce_amount(unit_price);
    let annual_total = total * annual_factor(frequency, &settings.annual_config);
    LinePreview {
        total,
        annual_total,
        base_total: convert(total, currency, settings.base_currency, &settings.rates),
        base_annual_total: convert(
            annual_total,
            currency,
            settings.base_currency,
            &settings.rates,
        ),
    }
}

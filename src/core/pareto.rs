//! Pareto (80/20) ranking of cost groups.
//!
//! Items are summed per grouping key in the base currency, ranked by value,
//! capped to the top entries plus an "Other" bucket, and paired with a
//! cumulative percentage series for concentration charts.

use crate::core::analytics::evaluate_item;
use crate::core::annual::annual_factor;
use crate::core::config::AggregationSettings;
use crate::core::currency::Currency;
use crate::core::item::CostItem;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// Number of ranked buckets kept before the tail is folded into "Other".
pub const DEFAULT_TOP_N: usize = 10;

/// Groups at or below this value are treated as rounding noise.
pub const EPSILON: f64 = 1e-9;

pub const OTHER_LABEL: &str = "Other";

const BLANK_LABEL: &str = "—";
const BAR_PRECISION: i32 = 6;
const PERCENT_PRECISION: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupKey {
    #[default]
    Title,
    Category,
}

impl GroupKey {
    fn label_of(&self, item: &CostItem) -> String {
        let raw = match self {
            GroupKey::Title => &item.title,
            GroupKey::Category => &item.category,
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            BLANK_LABEL.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                GroupKey::Title => "title",
                GroupKey::Category => "category",
            }
        )
    }
}

impl FromStr for GroupKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(GroupKey::Title),
            "category" => Ok(GroupKey::Category),
            _ => Err(anyhow::anyhow!("Invalid grouping key: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParetoBucket {
    pub label: String,
    pub value: f64,
    pub is_other: bool,
}

/// A ranked concentration series. Values are rounded for output.
#[derive(Debug, Clone, PartialEq)]
pub struct ParetoSeries {
    pub buckets: Vec<ParetoBucket>,
    pub cumulative_pct: Vec<f64>,
    /// Some contributing items could not be converted and were left out.
    pub partial: bool,
    pub currency: Currency,
    pub uses_annual: bool,
}

impl ParetoSeries {
    pub fn labels(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.label.as_str()).collect()
    }

    pub fn bars(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.value).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParetoOutcome {
    /// Nothing to rank. `partial` is set when items existed but none converted.
    Empty { partial: bool },
    Ranked(ParetoSeries),
}

impl ParetoOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, ParetoOutcome::Empty { .. })
    }

    pub fn is_partial(&self) -> bool {
        match self {
            ParetoOutcome::Empty { partial } => *partial,
            ParetoOutcome::Ranked(series) => series.partial,
        }
    }

    pub fn series(&self) -> Option<&ParetoSeries> {
        match self {
            ParetoOutcome::Empty { .. } => None,
            ParetoOutcome::Ranked(series) => Some(series),
        }
    }
}

/// Builds Pareto series for a grouping key.
#[derive(Debug, Clone, Copy)]
pub struct ParetoBuilder {
    group_key: GroupKey,
    top_n: usize,
}

impl Default for ParetoBuilder {
    fn default() -> Self {
        Self::new(GroupKey::default())
    }
}

impl ParetoBuilder {
    pub fn new(group_key: GroupKey) -> Self {
        Self {
            group_key,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    pub fn group_key(&self) -> GroupKey {
        self.group_key
    }

    /// Ranks items by their base-currency value under `settings`.
    ///
    /// Items that fail conversion are skipped and flag the result as partial.
    pub fn build<'a>(
        &self,
        items: impl IntoIterator<Item = &'a CostItem>,
        settings: &AggregationSettings,
    ) -> ParetoOutcome {
        let mut groups = Grouping::default();
        let mut partial = false;

        for item in items {
            let value = evaluate_item(item, settings);
            match value
                .ranking_value(settings.use_annual_for_ranking)
                .value()
            {
                Some(v) => groups.add(self.group_key.label_of(item), v),
                None => partial = true,
            }
        }

        let outcome = self.rank(
            groups.into_entries(),
            partial,
            settings.base_currency,
            settings.use_annual_for_ranking,
        );
        debug!(
            "Pareto by {}: {} buckets, partial={}",
            self.group_key,
            outcome.series().map_or(0, |s| s.buckets.len()),
            outcome.is_partial()
        );
        outcome
    }

    /// Ranks items separately within each of their own currencies.
    ///
    /// No exchange rate is consulted, so every item contributes and no
    /// series is ever partial.
    pub fn build_by_currency<'a>(
        &self,
        items: impl IntoIterator<Item = &'a CostItem>,
        settings: &AggregationSettings,
    ) -> BTreeMap<Currency, ParetoOutcome> {
        let mut per_currency: BTreeMap<Currency, Grouping> = BTreeMap::new();
        for item in items {
            let factor = if settings.use_annual_for_ranking {
                annual_factor(item.frequency, &settings.annual_config)
            } else {
                1.0
            };
            per_currency
                .entry(item.currency)
                .or_default()
                .add(self.group_key.label_of(item), item.total() * factor);
        }

        per_currency
            .into_iter()
            .map(|(currency, groups)| {
                let outcome = self.rank(
                    groups.into_entries(),
                    false,
                    currency,
                    settings.use_annual_for_ranking,
                );
                (currency, outcome)
            })
            .filter(|(_, outcome)| !outcome.is_empty())
            .collect()
    }

    fn rank(
        &self,
        entries: Vec<(String, f64)>,
        partial: bool,
        currency: Currency,
        uses_annual: bool,
    ) -> ParetoOutcome {
        let mut entries: Vec<(String, f64)> =
            entries.into_iter().filter(|(_, v)| *v > EPSILON).collect();
        if entries.is_empty() {
            return ParetoOutcome::Empty { partial };
        }

        // Stable, so equal values keep first-seen order.
        entries.sort_by(|(_, a), (_, b)| b.total_cmp(a));

        let mut buckets: Vec<(String, f64, bool)> = Vec::with_capacity(self.top_n + 1);
        let mut other = 0.0;
        for (i, (label, value)) in entries.iter().enumerate() {
            if i < self.top_n {
                buckets.push((label.clone(), *value, false));
            } else {
                other += value;
            }
        }
        if entries.len() > self.top_n {
            buckets.push((OTHER_LABEL.to_string(), other, true));
        }

        let sum: f64 = buckets.iter().map(|(_, v, _)| v).sum();
        let mut cumulative = 0.0;
        let mut cumulative_pct = Vec::with_capacity(buckets.len());
        for (_, value, _) in &buckets {
            cumulative += value;
            cumulative_pct.push(round_to(cumulative / sum * 100.0, PERCENT_PRECISION));
        }

        ParetoOutcome::Ranked(ParetoSeries {
            buckets: buckets
                .into_iter()
                .map(|(label, value, is_other)| ParetoBucket {
                    label,
                    value: round_to(value, BAR_PRECISION),
                    is_other,
                })
                .collect(),
            cumulative_pct,
            partial,
            currency,
            uses_annual,
        })
    }
}

/// Builds the ranked series for `items` with the default top-N cutoff.
pub fn build_pareto<'a>(
    items: impl IntoIterator<Item = &'a CostItem>,
    settings: &AggregationSettings,
    group_key: GroupKey,
) -> ParetoOutcome {
    ParetoBuilder::new(group_key).build(items, settings)
}

pub fn build_pareto_by_currency<'a>(
    items: impl IntoIterator<Item = &'a CostItem>,
    settings: &AggregationSettings,
    group_key: GroupKey,
) -> BTreeMap<Currency, ParetoOutcome> {
    ParetoBuilder::new(group_key).build_by_currency(items, settings)
}

/// Sums values per label, remembering the order labels were first seen.
#[derive(Default)]
struct Grouping {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl Grouping {
    fn add(&mut self, label: String, value: f64) {
        if let Some(&i) = self.index.get(&label) {
            self.entries[i].1 += value;
        } else {
            self.index.insert(label.clone(), self.entries.len());
            self.entries.push((label, value));
        }
    }

    fn into_entries(self) -> Vec<(String, f64)> {
        self.entries
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

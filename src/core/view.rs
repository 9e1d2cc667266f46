//! Visible item set (filter, sort, selection) and the board that keeps
//! derived totals in step with it.

use crate::core::analytics::{CostSummary, aggregate};
use crate::core::annual::Frequency;
use crate::core::config::AggregationSettings;
use crate::core::currency::Currency;
use crate::core::item::CostItem;
use crate::core::pareto::{GroupKey, ParetoBuilder, ParetoOutcome};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// Predicate deciding which items are visible. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewFilter {
    /// Case-insensitive substring matched against title and category.
    pub query: String,
    pub currency: Option<Currency>,
    pub frequency: Option<Frequency>,
    pub risk_id: Option<String>,
}

impl ViewFilter {
    pub fn matches(&self, item: &CostItem) -> bool {
        let query = self.query.trim().to_lowercase();
        let query_ok = query.is_empty()
            || item.title.to_lowercase().contains(&query)
            || item.category.to_lowercase().contains(&query);
        let currency_ok = self.currency.is_none_or(|c| c == item.currency);
        let frequency_ok = self.frequency.is_none_or(|f| f == item.frequency);
        let risk_ok = self
            .risk_id
            .as_deref()
            .is_none_or(|r| item.risk_id.as_deref() == Some(r));
        query_ok && currency_ok && frequency_ok && risk_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Quantity,
    UnitPrice,
    Total,
    Frequency,
    Title,
    Category,
}

impl Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortKey::Quantity => "qty",
                SortKey::UnitPrice => "unit_price",
                SortKey::Total => "total",
                SortKey::Frequency => "frequency",
                SortKey::Title => "title",
                SortKey::Category => "category",
            }
        )
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "qty" | "quantity" => Ok(SortKey::Quantity),
            "unit_price" | "unit-price" | "price" => Ok(SortKey::UnitPrice),
            "total" => Ok(SortKey::Total),
            "frequency" => Ok(SortKey::Frequency),
            "title" => Ok(SortKey::Title),
            "category" => Ok(SortKey::Category),
            _ => Err(anyhow::anyhow!("Invalid sort key: {}", s)),
        }
    }
}

impl SortKey {
    fn compare(&self, a: &CostItem, b: &CostItem) -> Ordering {
        match self {
            SortKey::Quantity => a.quantity.total_cmp(&b.quantity),
            SortKey::UnitPrice => a.unit_price.total_cmp(&b.unit_price),
            SortKey::Total => a.total().total_cmp(&b.total()),
            SortKey::Frequency => {
                compare_text(&a.frequency.to_string(), &b.frequency.to_string())
            }
            SortKey::Title => compare_text(&a.title, &b.title),
            SortKey::Category => compare_text(&a.category, &b.category),
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Filter, sort and selection over a host-owned item collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub filter: ViewFilter,
    sort: Option<SortState>,
    selection: BTreeSet<String>,
}

impl ViewState {
    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    /// Records a sort request: the current key flips direction, a new key
    /// starts ascending.
    pub fn request_sort(&mut self, key: SortKey) -> SortState {
        let direction = match self.sort {
            Some(state) if state.key == key => match state.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            },
            _ => SortDirection::Ascending,
        };
        let state = SortState { key, direction };
        self.sort = Some(state);
        state
    }

    /// Stably reorders `items` in place by `state`. Items comparing equal
    /// keep their previous relative order in both directions.
    pub fn apply_sort(state: SortState, items: &mut [CostItem]) {
        items.sort_by(|a, b| match state.direction {
            SortDirection::Ascending => state.key.compare(a, b),
            SortDirection::Descending => state.key.compare(b, a),
        });
    }

    pub fn select(&mut self, id: impl Into<String>) -> bool {
        self.selection.insert(id.into())
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        self.selection.remove(id)
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Items passing the filter, in collection order.
    pub fn visible<'a>(&self, items: &'a [CostItem]) -> Vec<&'a CostItem> {
        items.iter().filter(|i| self.filter.matches(i)).collect()
    }

    /// Visible items restricted to the selection, or all visible items when
    /// nothing is selected.
    pub fn effective<'a>(&self, items: &'a [CostItem]) -> Vec<&'a CostItem> {
        self.visible(items)
            .into_iter()
            .filter(|i| self.selection.is_empty() || self.selection.contains(&i.id))
            .collect()
    }
}

/// Derived values for the current view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub visible_ids: Vec<String>,
    pub effective_ids: Vec<String>,
    pub summary: CostSummary,
    pub pareto: ParetoOutcome,
}

/// Owns the items, settings and view, and recomputes the snapshot after
/// every change so a stale total is never observable.
#[derive(Debug, Clone)]
pub struct CostBoard {
    items: Vec<CostItem>,
    settings: AggregationSettings,
    view: ViewState,
    pareto: ParetoBuilder,
    snapshot: ViewSnapshot,
}

impl CostBoard {
    pub fn new(items: Vec<CostItem>, settings: AggregationSettings) -> Self {
        let view = ViewState::default();
        let pareto = ParetoBuilder::default();
        let snapshot = compute(&items, &settings, &view, &pareto);
        Self {
            items,
            settings,
            view,
            pareto,
            snapshot,
        }
    }

    pub fn items(&self) -> &[CostItem] {
        &self.items
    }

    pub fn settings(&self) -> &AggregationSettings {
        &self.settings
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn snapshot(&self) -> &ViewSnapshot {
        &self.snapshot
    }

    pub fn visible_items(&self) -> Vec<&CostItem> {
        self.view.visible(&self.items)
    }

    pub fn effective_items(&self) -> Vec<&CostItem> {
        self.view.effective(&self.items)
    }

    pub fn replace_items(&mut self, items: Vec<CostItem>) {
        self.items = items;
        if let Some(state) = self.view.sort {
            ViewState::apply_sort(state, &mut self.items);
        }
        self.refresh();
    }

    pub fn set_filter(&mut self, filter: ViewFilter) {
        self.view.filter = filter;
        self.refresh();
    }

    pub fn sort_by(&mut self, key: SortKey) -> SortState {
        let state = self.view.request_sort(key);
        ViewState::apply_sort(state, &mut self.items);
        self.refresh();
        state
    }

    pub fn select(&mut self, id: impl Into<String>) {
        self.view.select(id);
        self.refresh();
    }

    pub fn deselect(&mut self, id: &str) {
        self.view.deselect(id);
        self.refresh();
    }

    pub fn toggle_selection(&mut self, id: &str) {
        self.view.toggle(id);
        self.refresh();
    }

    pub fn clear_selection(&mut self) {
        self.view.clear_selection();
        self.refresh();
    }

    pub fn set_group_key(&mut self, group_key: GroupKey) {
        self.pareto = ParetoBuilder::new(group_key);
        self.refresh();
    }

    /// Applies a settings change to a copy and swaps it in whole.
    pub fn update_settings<F>(&mut self, update: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut AggregationSettings) -> anyhow::Result<()>,
    {
        let mut next = self.settings.clone();
        update(&mut next)?;
        self.settings = next;
        self.refresh();
        Ok(())
    }

    fn refresh(&mut self) {
        self.snapshot = compute(&self.items, &self.settings, &self.view, &self.pareto);
    }
}

fn compute(
    items: &[CostItem],
    settings: &AggregationSettings,
    view: &ViewState,
    pareto: &ParetoBuilder,
) -> ViewSnapshot {
    let visible = view.visible(items);
    let effective = view.effective(items);
    debug!(
        "Recomputing view: {} of {} items visible, {} effective",
        visible.len(),
        items.len(),
        effective.len()
    );

    ViewSnapshot {
        visible_ids: visible.iter().map(|i| i.id.clone()).collect(),
        effective_ids: effective.iter().map(|i| i.id.clone()).collect(),
        summary: aggregate(effective.iter().copied(), settings),
        pareto: pareto.build(effective.iter().copied(), settings),
    }
}

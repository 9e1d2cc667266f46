//! Cost normalization, aggregation and ranking

pub mod analytics;
pub mod annual;
pub mod config;
pub mod currency;
pub mod export;
pub mod item;
pub mod log;
pub mod pareto;
pub mod view;

// Re-export main types for cleaner imports
pub use analytics::{CostSummary, ItemValue, aggregate};
pub use annual::{AnnualizationConfig, Frequency, OneTimePolicy, annual_factor};
pub use config::AggregationSettings;
pub use currency::{ConversionResult, Currency, ExchangeRates, convert};
pub use item::CostItem;
pub use pareto::{GroupKey, ParetoBuilder, ParetoOutcome, build_pareto, build_pareto_by_currency};
pub use view::{CostBoard, SortKey, ViewFilter, ViewState};

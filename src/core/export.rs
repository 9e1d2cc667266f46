//! Machine-readable CSV export of cost rows.

use crate::core::analytics::evaluate_item;
use crate::core::annual::Frequency;
use crate::core::config::AggregationSettings;
use crate::core::currency::Currency;
use crate::core::item::CostItem;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use tracing::debug;

/// One exported row. Numbers are written with a `.` decimal separator;
/// base values that cannot be converted are left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub category: &'a str,
    pub quantity: f64,
    pub unit_price: f64,
    pub currency: Currency,
    pub frequency: Frequency,
    pub total: f64,
    pub annual_total: f64,
    pub base_currency: Currency,
    pub base_total: Option<f64>,
    pub base_annual_total: Option<f64>,
}

impl<'a> ExportRow<'a> {
    pub fn new(item: &'a CostItem, settings: &AggregationSettings) -> Self {
        let value = evaluate_item(item, settings);
        Self {
            id: &item.id,
            title: &item.title,
            category: &item.category,
            quantity: item.quantity,
            unit_price: item.unit_price,
            currency: item.currency,
            frequency: item.frequency,
            total: value.raw_total,
            annual_total: value.annual_total,
            base_currency: settings.base_currency,
            base_total: value.base_total.value(),
            base_annual_total: value.base_annual_total.value(),
        }
    }
}

/// Writes `items` as CSV with a header row. Returns the number of rows.
pub fn write_csv<'a, W: Write>(
    writer: W,
    items: impl IntoIterator<Item = &'a CostItem>,
    settings: &AggregationSettings,
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for item in items {
        wtr.serialize(ExportRow::new(item, settings))
            .with_context(|| format!("Failed to write row for item {}", item.id))?;
        rows += 1;
    }
    if rows == 0 {
        // serialize() emits the header with the first row only
        wtr.write_record(HEADERS)?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    debug!("Exported {rows} rows");
    Ok(rows)
}

const HEADERS: [&str; 12] = [
    "id",
    "title",
    "category",
    "quantity",
    "unit_price",
    "currency",
    "frequency",
    "total",
    "annual_total",
    "base_currency",
    "base_total",
    "base_annual_total",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::ExchangeRates;

    fn export(items: &[CostItem], settings: &AggregationSettings) -> String {
        let mut out = Vec::new();
        write_csv(&mut out, items, settings).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_header_and_rows() {
        let items = vec![
            CostItem::new(
                "1",
                "Crane, 50t",
                "Equipment",
                2.0,
                1250.5,
                Currency::Usd,
                Frequency::Monthly,
            ),
            CostItem::new(
                "2",
                "Permit \"A\"",
                "Legal",
                1.0,
                300.0,
                Currency::Try,
                Frequency::OneTime,
            ),
        ];
        let settings = AggregationSettings {
            rates: ExchangeRates::new(Some(30.0), None),
            ..Default::default()
        };
        let csv = export(&items, &settings);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], HEADERS.join(","));
        assert_eq!(
            lines[1],
            "1,\"Crane, 50t\",Equipment,2.0,1250.5,USD,Monthly,2501.0,30012.0,TRY,75030.0,900360.0"
        );
        assert_eq!(
            lines[2],
            "2,\"Permit \"\"A\"\"\",Legal,1.0,300.0,TRY,OneTime,300.0,300.0,TRY,300.0,300.0"
        );
    }

    #[test]
    fn test_unconvertible_values_are_empty() {
        let items = vec![CostItem::new(
            "9",
            "Audit",
            "Legal",
            1.0,
            1000.0,
            Currency::Eur,
            Frequency::Yearly,
        )];
        let csv = export(&items, &AggregationSettings::default());
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "9,Audit,Legal,1.0,1000.0,EUR,Yearly,1000.0,1000.0,TRY,,"
        );
    }

    #[test]
    fn test_empty_export_has_header() {
        let csv = export(&[], &AggregationSettings::default());
        assert_eq!(csv.trim_end(), HEADERS.join(","));
    }
}

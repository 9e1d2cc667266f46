use super::ui;
use crate::core::analytics::CostSummary;
use crate::core::currency::ConversionResult;
use crate::core::item::CostItem;
use crate::core::view::CostBoard;
use anyhow::Result;
use comfy_table::Cell;

impl CostSummary {
    /// Renders the items behind this summary with their native, annual and
    /// base values, followed by the totals.
    pub fn display_as_table(&self, items: &[&CostItem]) -> String {
        let base = self.base_currency;
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("ID"),
            ui::header_cell("Title"),
            ui::header_cell("Category"),
            ui::header_cell("Qty"),
            ui::header_cell("Unit Price"),
            ui::header_cell("Frequency"),
            ui::header_cell("Total"),
            ui::header_cell("Annual"),
            ui::header_cell(&format!("Total ({base})")),
            ui::header_cell(&format!("Annual ({base})")),
        ]);

        for (item, value) in items.iter().zip(self.items.iter()) {
            let title = if item.is_valid() {
                Cell::new(&item.title)
            } else {
                Cell::new(format!("{} (!)", item.title)).fg(comfy_table::Color::Yellow)
            };
            table.add_row(vec![
                Cell::new(&item.id),
                title,
                Cell::new(&item.category),
                ui::number_cell(format!("{:.2}", item.quantity)),
                ui::number_cell(ui::format_money(item.unit_price, item.currency)),
                Cell::new(item.frequency),
                ui::number_cell(ui::format_money(value.raw_total, value.currency)),
                ui::number_cell(ui::format_money(value.annual_total, value.currency)),
                ui::conversion_cell(&value.base_total, base),
                ui::conversion_cell(&value.base_annual_total, base),
            ]);
        }

        let mut output = table.to_string();
        output.push_str(&format!(
            "\n\nTotal: {}",
            ui::style_text(&self.native_total_text(), ui::StyleType::TotalValue)
        ));
        for (label, result) in [
            ("Total", &self.total_base),
            ("Annual Total", &self.annual_total_base),
        ] {
            output.push_str(&format!(
                "\n{} ({}): {}",
                label,
                ui::style_text(base.code(), ui::StyleType::TotalLabel),
                total_text(result, self)
            ));
        }
        output
    }

    /// The native total, or a per-currency breakdown when currencies are mixed.
    fn native_total_text(&self) -> String {
        if let Some((currency, total)) = self.single_currency_total() {
            return ui::format_money(total, currency);
        }
        if self.totals_by_currency.is_empty() {
            return "0".to_string();
        }
        let breakdown: Vec<String> = self
            .totals_by_currency
            .iter()
            .map(|(c, v)| ui::format_money(*v, *c))
            .collect();
        format!("mixed ({})", breakdown.join(" | "))
    }
}

fn total_text(result: &ConversionResult, summary: &CostSummary) -> String {
    match result {
        ConversionResult::Converted(v) => ui::style_text(
            &ui::format_money(*v, summary.base_currency),
            ui::StyleType::TotalValue,
        ),
        ConversionResult::Unconvertible(reason) => ui::style_text(
            &format!("rate required ({reason})"),
            ui::StyleType::Error,
        ),
    }
}

pub fn run(board: &CostBoard) -> Result<()> {
    let items = board.effective_items();
    if items.is_empty() {
        println!("No cost items to display.");
        return Ok(());
    }

    let summary = &board.snapshot().summary;
    println!(
        "{}\n",
        ui::style_text(
            &format!("Costs ({} of {})", items.len(), board.items().len()),
            ui::StyleType::Title
        )
    );
    println!("{}", summary.display_as_table(&items));

    let invalid = items.iter().filter(|i| !i.is_valid()).count();
    if invalid > 0 {
        println!(
            "\n{}",
            ui::style_text(
                &format!("{invalid} item(s) marked (!) have incomplete fields"),
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}

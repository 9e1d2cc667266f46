use super::ui;
use crate::core::currency::Currency;
use crate::core::pareto::{GroupKey, ParetoBuilder, ParetoOutcome, ParetoSeries};
use crate::core::view::CostBoard;
use anyhow::Result;
use comfy_table::Cell;

impl ParetoSeries {
    pub fn display_as_table(&self, group_key: GroupKey) -> String {
        let mut table = ui::new_styled_table();
        let basis = if self.uses_annual { "Annualized" } else { "Total" };

        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell(if group_key == GroupKey::Title {
                "Title"
            } else {
                "Category"
            }),
            ui::header_cell(&format!("{basis} ({})", self.currency)),
            ui::header_cell("Cumulative %"),
        ]);

        for (i, (bucket, cumulative)) in self
            .buckets
            .iter()
            .zip(self.cumulative_pct.iter())
            .enumerate()
        {
            let label = if bucket.is_other {
                Cell::new(ui::style_text(&bucket.label, ui::StyleType::Subtle))
            } else {
                Cell::new(&bucket.label)
            };
            table.add_row(vec![
                ui::number_cell((i + 1).to_string()),
                label,
                ui::number_cell(ui::format_money(bucket.value, self.currency)),
                ui::format_percentage_cell(*cumulative),
            ]);
        }
        table.to_string()
    }
}

fn print_outcome(outcome: &ParetoOutcome, group_key: GroupKey, base: Currency) {
    match outcome {
        ParetoOutcome::Empty { partial: true } => println!(
            "{}",
            ui::style_text(
                &format!("No Pareto data: exchange rates to {base} are required."),
                ui::StyleType::Error
            )
        ),
        ParetoOutcome::Empty { partial: false } => println!("No Pareto data."),
        ParetoOutcome::Ranked(series) => {
            println!("{}", series.display_as_table(group_key));
            if series.partial {
                println!(
                    "\n{}",
                    ui::style_text(
                        "Some items were left out: exchange rates are missing.",
                        ui::StyleType::Error
                    )
                );
            }
        }
    }
}

pub fn run(board: &CostBoard, group_key: GroupKey, per_currency: bool) -> Result<()> {
    let settings = board.settings();

    if per_currency {
        let per_currency = ParetoBuilder::new(group_key)
            .build_by_currency(board.effective_items(), settings);
        if per_currency.is_empty() {
            println!("No Pareto data.");
            return Ok(());
        }
        let count = per_currency.len();
        for (i, (currency, outcome)) in per_currency.iter().enumerate() {
            println!(
                "\nPareto by {group_key}: {}\n",
                ui::style_text(currency.code(), ui::StyleType::Title)
            );
            print_outcome(outcome, group_key, *currency);
            if i < count - 1 {
                ui::print_separator();
            }
        }
        return Ok(());
    }

    let outcome = &board.snapshot().pareto;
    println!(
        "\nPareto by {group_key}: {}\n",
        ui::style_text(settings.base_currency.code(), ui::StyleType::Title)
    );
    print_outcome(outcome, group_key, settings.base_currency);
    Ok(())
}

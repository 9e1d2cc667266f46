use crate::core::export::write_csv;
use crate::core::view::CostBoard;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Writes the effective rows of the board as CSV, to `output` or stdout.
pub fn run(board: &CostBoard, output: Option<&Path>) -> Result<()> {
    let items = board.effective_items();
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create export file: {}", path.display()))?;
            let rows = write_csv(BufWriter::new(file), items, board.settings())?;
            info!("Exported {} rows to {}", rows, path.display());
        }
        None => {
            write_csv(std::io::stdout().lock(), items, board.settings())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annual::Frequency;
    use crate::core::config::AggregationSettings;
    use crate::core::currency::Currency;
    use crate::core::item::CostItem;
    use crate::core::view::ViewFilter;
    use tempfile::TempDir;

    #[test]
    fn test_export_writes_effective_rows() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("costs.csv");
        let items = vec![
            CostItem::new("1", "Crane", "Equipment", 1.0, 10.0, Currency::Try, Frequency::Yearly),
            CostItem::new("2", "Fence", "Site", 1.0, 20.0, Currency::Try, Frequency::Yearly),
        ];
        let mut board = CostBoard::new(items, AggregationSettings::default());
        board.set_filter(ViewFilter {
            query: "fen".to_string(),
            ..Default::default()
        });

        run(&board, Some(&path))?;

        let content = std::fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id,title,category"));
        assert!(lines[1].starts_with("2,Fence,Site"));
        Ok(())
    }
}

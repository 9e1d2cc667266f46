use riskcost::core::config::SettingsOverrides;
use riskcost::core::currency::{ConversionResult, Currency};
use riskcost::core::pareto::GroupKey;
use riskcost::core::view::{SortKey, ViewFilter};
use riskcost::{AppCommand, RunOptions, build_board, run_command};
use std::fs;
use tempfile::TempDir;
use tracing::info;

const CONFIG: &str = r#"
settings:
  baseCurrency: "TRY"
  usdTry: "30"
  eurTry: ""
  oneTimePolicy: "amortize"
  amortizeYears: "4"
items:
  - id: 1
    title: "Crane rental"
    category: "Equipment"
    unit: "month"
    quantity: 1
    unit_price: 10000
    currency: "TRY"
    frequency: "Monthly"
    risk_id: 12
  - id: "2"
    title: "Insurance"
    category: "Finance"
    unit: "policy"
    quantity: 1
    unit_price: 1000
    currency: "USD"
    frequency: "Yearly"
  - id: 3
    title: "Fence"
    category: "Site"
    unit: "m"
    quantity: "100"
    unit_price: "9"
    currency: "TRY"
    frequency: "Tek Sefer"
    risk_id: 12
"#;

fn write_config(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("config.yaml");
    fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

fn load(dir: &TempDir) -> riskcost::core::config::AppConfig {
    let path = write_config(dir, CONFIG);
    riskcost::core::config::AppConfig::load_from_path(path).unwrap()
}

#[test_log::test]
fn test_summary_flow() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, CONFIG);

    let result = run_command(AppCommand::Summary, Some(&path), &RunOptions::default());
    assert!(result.is_ok(), "summary failed: {result:?}");
}

#[test_log::test]
fn test_board_totals_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let board = build_board(load(&temp_dir), &RunOptions::default()).unwrap();
    let summary = &board.snapshot().summary;
    info!(?summary, "Board summary");

    // 10000 + 30000 + 900
    assert_eq!(summary.total_base, ConversionResult::Converted(40900.0));
    // 120000 + 30000 + 900 / 4
    assert_eq!(
        summary.annual_total_base,
        ConversionResult::Converted(150225.0)
    );
    assert!(summary.is_mixed_currency());
}

#[test_log::test]
fn test_missing_rate_blocks_base_total() {
    let temp_dir = TempDir::new().unwrap();
    let options = RunOptions {
        overrides: SettingsOverrides {
            base_currency: Some("EUR".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let board = build_board(load(&temp_dir), &options).unwrap();
    let summary = &board.snapshot().summary;

    assert!(!summary.total_base.is_converted());
    assert!(summary.total_base.reason().unwrap_or_default().contains("EUR"));
    assert!(board.snapshot().pareto.is_empty());
    assert!(board.snapshot().pareto.is_partial());
}

#[test_log::test]
fn test_filtered_and_sorted_view() {
    let temp_dir = TempDir::new().unwrap();
    let options = RunOptions {
        filter: ViewFilter {
            risk_id: Some("12".to_string()),
            ..Default::default()
        },
        sort: Some(SortKey::Total),
        descending: false,
        ..Default::default()
    };
    let board = build_board(load(&temp_dir), &options).unwrap();

    assert_eq!(board.snapshot().visible_ids, vec!["3", "1"]);
    assert_eq!(
        board.snapshot().summary.total_base,
        ConversionResult::Converted(10900.0)
    );
    assert_eq!(
        board.snapshot().summary.single_currency_total(),
        Some((Currency::Try, 10900.0))
    );
}

#[test_log::test]
fn test_pareto_flows() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, CONFIG);

    for (group_by, per_currency) in [
        (GroupKey::Title, false),
        (GroupKey::Category, false),
        (GroupKey::Title, true),
    ] {
        let result = run_command(
            AppCommand::Pareto {
                group_by,
                per_currency,
            },
            Some(&path),
            &RunOptions::default(),
        );
        assert!(result.is_ok(), "pareto {group_by} failed: {result:?}");
    }
}

#[test_log::test]
fn test_export_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, CONFIG);
    let output = temp_dir.path().join("export.csv");

    let options = RunOptions {
        selection: vec!["1".to_string(), "3".to_string()],
        ..Default::default()
    };
    run_command(
        AppCommand::Export {
            output: Some(output.clone()),
        },
        Some(&path),
        &options,
    )
    .unwrap();

    let content = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,title,category"));
    assert!(lines[1].starts_with("1,Crane rental,Equipment"));
    assert!(lines[2].starts_with("3,Fence,Site"));
}

#[test_log::test]
fn test_settings_command() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, CONFIG);

    let result = run_command(AppCommand::Settings, Some(&path), &RunOptions::default());
    assert!(result.is_ok());
}

#[test_log::test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.yaml");

    let result = run_command(
        AppCommand::Summary,
        path.to_str(),
        &RunOptions::default(),
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test_log::test]
fn test_invalid_yaml_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "items: [unclosed");

    let result = run_command(AppCommand::Summary, Some(&path), &RunOptions::default());
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

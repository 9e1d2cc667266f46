pub mod cli;
pub mod core;

use crate::core::config::{AppConfig, SettingsOverrides};
use crate::core::pareto::GroupKey;
use crate::core::view::{CostBoard, SortKey, ViewFilter};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    Summary,
    Pareto { group_by: GroupKey, per_currency: bool },
    Export { output: Option<PathBuf> },
    Settings,
}

/// View and settings options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub filter: ViewFilter,
    pub sort: Option<SortKey>,
    pub descending: bool,
    pub selection: Vec<String>,
    pub overrides: SettingsOverrides,
}

pub fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    options: &RunOptions,
) -> Result<()> {
    info!("Risk cost engine starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let board = build_board(config, options)?;

    match command {
        AppCommand::Summary => cli::summary::run(&board),
        AppCommand::Pareto {
            group_by,
            per_currency,
        } => {
            let mut board = board;
            board.set_group_key(group_by);
            cli::pareto::run(&board, group_by, per_currency)
        }
        AppCommand::Export { output } => cli::export::run(&board, output.as_deref()),
        AppCommand::Settings => {
            let persisted = board.settings().to_persisted();
            println!(
                "{}",
                serde_json::to_string_pretty(&persisted).context("Failed to render settings")?
            );
            Ok(())
        }
    }
}

/// Sets up a board from the loaded config and the per-run options.
pub fn build_board(config: AppConfig, options: &RunOptions) -> Result<CostBoard> {
    let mut settings = config.aggregation_settings();
    options.overrides.apply(&mut settings)?;

    let mut board = CostBoard::new(config.items, settings);
    board.set_filter(options.filter.clone());
    if let Some(key) = options.sort {
        board.sort_by(key);
        if options.descending {
            board.sort_by(key);
        }
    }
    for id in &options.selection {
        board.select(id.clone());
    }
    Ok(board)
}

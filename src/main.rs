use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use riskcost::core::config::SettingsOverrides;
use riskcost::core::log::init_logging;
use riskcost::core::view::ViewFilter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(flatten)]
    view: ViewArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ViewArgs {
    /// Only include items whose title or category contains this text
    #[arg(long, global = true)]
    search: Option<String>,

    /// Only include items in this currency (TRY, USD, EUR)
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Only include items with this frequency (OneTime, Monthly, Yearly)
    #[arg(long, global = true)]
    frequency: Option<String>,

    /// Only include items attached to this risk
    #[arg(long, global = true)]
    risk: Option<String>,

    /// Sort items by qty, unit_price, total, frequency, title or category
    #[arg(long, global = true)]
    sort: Option<String>,

    /// Sort in descending order
    #[arg(long, global = true, requires = "sort")]
    desc: bool,

    /// Restrict totals and export to these item ids
    #[arg(long = "select", global = true)]
    select: Vec<String>,

    /// Base currency for converted totals
    #[arg(long, global = true)]
    base: Option<String>,

    /// USD to TRY rate
    #[arg(long, global = true)]
    usd_try: Option<String>,

    /// EUR to TRY rate
    #[arg(long, global = true)]
    eur_try: Option<String>,

    /// How one-time costs are annualized: 1x, 0x or amortize
    #[arg(long, global = true)]
    one_time_policy: Option<String>,

    /// Years a one-time cost is amortized over
    #[arg(long, global = true)]
    amortize_years: Option<String>,

    /// Rank by raw totals instead of annualized ones
    #[arg(long, global = true)]
    raw_ranking: bool,
}

impl ViewArgs {
    fn into_options(self) -> Result<riskcost::RunOptions> {
        let filter = ViewFilter {
            query: self.search.unwrap_or_default(),
            currency: self
                .currency
                .map(|c| c.parse())
                .transpose()
                .context("Invalid --currency")?,
            frequency: self
                .frequency
                .map(|f| f.parse())
                .transpose()
                .context("Invalid --frequency")?,
            risk_id: self.risk,
        };
        let sort = self
            .sort
            .map(|s| s.parse())
            .transpose()
            .context("Invalid --sort")?;

        Ok(riskcost::RunOptions {
            filter,
            sort,
            descending: self.desc,
            selection: self.select,
            overrides: SettingsOverrides {
                base_currency: self.base,
                usd_try: self.usd_try,
                eur_try: self.eur_try,
                one_time_policy: self.one_time_policy,
                amortize_years: self.amortize_years,
                raw_ranking: self.raw_ranking,
            },
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display cost items with native and base-currency totals
    Summary,
    /// Display the Pareto ranking of costs
    Pareto {
        /// Group by title or category
        #[arg(long, default_value = "title")]
        by: String,

        /// Rank within each item currency, without exchange rates
        #[arg(long)]
        per_currency: bool,
    },
    /// Export cost items as CSV
    Export {
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Display the effective settings
    Settings,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => riskcost::cli::setup::setup(),
        Some(cmd) => run(cmd, cli.view, cli.config_path.as_deref()),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn run(cmd: Commands, view: ViewArgs, config_path: Option<&str>) -> Result<()> {
    let command = match cmd {
        Commands::Summary => riskcost::AppCommand::Summary,
        Commands::Pareto { by, per_currency } => riskcost::AppCommand::Pareto {
            group_by: by.parse().context("Invalid --by")?,
            per_currency,
        },
        Commands::Export { output } => riskcost::AppCommand::Export { output },
        Commands::Settings => riskcost::AppCommand::Settings,
        Commands::Setup => unreachable!("Setup command should be handled separately"),
    };
    riskcost::run_command(command, config_path, &view.into_options()?)
}

//! Odds Alpha - betting markets as stock signals
//!
//! Subcommands cover the pipeline end to end:
//!
//! ```bash
//! odds_alpha fetch --symbol BVB.DE --output data/stock_history.csv
//! odds_alpha features --matches data --team Dortmund
//! odds_alpha analyze --data results/alpha_dataset.csv
//! odds_alpha model --data results/alpha_dataset.csv
//! ```
//!
//! Defaults for symbol, team and directories come from [`AppConfig`].

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use odds_alpha::analysis::SignalAnalyzer;
use odds_alpha::api::YahooClient;
use odds_alpha::config::{AppConfig, LeagueRules, SignalConfig};
use odds_alpha::data::DataLoader;
use odds_alpha::features::FeatureEngineer;
use odds_alpha::models::{train_correction_model, CorrectionModelConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "odds_alpha")]
#[command(about = "Alpha mining from football betting odds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch daily price history from Yahoo Finance
    Fetch {
        /// Ticker symbol of the listed club [default: BVB.DE]
        #[arg(short, long)]
        symbol: Option<String>,

        /// First date of history (YYYY-MM-DD) [default: 2005-01-01]
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date of history; defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Output CSV path [default: data/stock_history.csv]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Engineer the per-match alpha feature table
    Features {
        /// Betting CSV file, or a directory containing a closing_odds CSV
        /// [default: data]
        #[arg(short, long)]
        matches: Option<PathBuf>,

        /// Price history CSV (date, adj_close) [default: data/stock_history.csv]
        #[arg(short, long)]
        prices: Option<PathBuf>,

        /// Club name matched against the team columns [default: Dortmund]
        #[arg(short, long)]
        team: Option<String>,

        /// Output CSV path [default: results/alpha_dataset.csv]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the signal analysis battery over a feature table
    Analyze {
        /// Engineered feature CSV [default: results/alpha_dataset.csv]
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Surprise factor above which a result counts as high-surprise
        #[arg(long, default_value = "0.7")]
        surprise_threshold: f64,
    },

    /// Train the correction-return model on high-surprise matches
    Model {
        /// Engineered feature CSV [default: results/alpha_dataset.csv]
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Surprise factor threshold for the modeling sample
        #[arg(long, default_value = "0.7")]
        threshold: f64,

        /// Fraction of the sample held out for evaluation
        #[arg(long, default_value = "0.25")]
        test_fraction: f64,

        /// Seed for the train/test shuffle
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let app = AppConfig::default();
    let price_default = Path::new(&app.data_dir).join("stock_history.csv");
    let features_default = Path::new(&app.results_dir).join("alpha_dataset.csv");

    match cli.command {
        Commands::Fetch {
            symbol,
            start,
            end,
            output,
        } => {
            let symbol = symbol.unwrap_or(app.stock_symbol);
            let start = start.unwrap_or(app.history_start);
            let end = end.unwrap_or_else(|| Utc::now().date_naive());
            let output = output.unwrap_or(price_default);
            info!("fetching {} daily history {} to {}", symbol, start, end);

            let client = YahooClient::new();
            let bars = client
                .get_daily_history(&symbol, start, end)
                .await
                .with_context(|| format!("Failed to fetch history for {}", symbol))?;
            info!("fetched {} trading days", bars.len());

            ensure_parent_dir(&output)?;
            DataLoader::save_price_bars(&bars, &output)?;
            println!("Saved {} price bars to {:?}", bars.len(), output);
        }

        Commands::Features {
            matches,
            prices,
            team,
            output,
        } => {
            let matches = matches.unwrap_or_else(|| PathBuf::from(&app.data_dir));
            let prices = prices.unwrap_or(price_default);
            let team = team.unwrap_or(app.target_team);
            let output = output.unwrap_or(features_default);

            let betting_file = DataLoader::resolve_betting_file(&matches)?;
            info!("loading matches from {:?}", betting_file);

            let all_matches = DataLoader::load_matches(&betting_file)?;
            let team_matches = DataLoader::filter_team_matches(all_matches, &team);
            if team_matches.is_empty() {
                bail!("no matches involving '{}' with complete odds", team);
            }
            info!("{} matches involve {}", team_matches.len(), team);

            let series = DataLoader::load_price_series(&prices)?;

            let engineer = FeatureEngineer::new(&team, LeagueRules::default());
            let rows = engineer.process_matches(&team_matches, &series);
            if rows.is_empty() {
                bail!("no match could be aligned to a trading-day return");
            }

            ensure_parent_dir(&output)?;
            DataLoader::save_feature_rows(&rows, &output)?;
            println!(
                "Engineered {} of {} matches into {:?}",
                rows.len(),
                team_matches.len(),
                output
            );
        }

        Commands::Analyze {
            data,
            surprise_threshold,
        } => {
            let data = data.unwrap_or(features_default);
            let rows = DataLoader::load_feature_rows(&data)?;
            if rows.is_empty() {
                bail!("feature table {:?} is empty", data);
            }
            info!("loaded {} feature rows", rows.len());

            let analyzer = SignalAnalyzer::new(SignalConfig {
                surprise_threshold,
                ..Default::default()
            });
            println!("{}", analyzer.dataset_overview(&rows));
            println!("{}", analyzer.analyze(&rows));
        }

        Commands::Model {
            data,
            threshold,
            test_fraction,
            seed,
        } => {
            let data = data.unwrap_or(features_default);
            let rows = DataLoader::load_feature_rows(&data)?;
            if rows.is_empty() {
                bail!("feature table {:?} is empty", data);
            }

            let config = CorrectionModelConfig {
                surprise_threshold: threshold,
                test_fraction,
                seed,
                ..Default::default()
            };
            let report = train_correction_model(&rows, &config)
                .context("Failed to train the correction model")?;
            println!("{}", report);
        }
    }

    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }
    Ok(())
}

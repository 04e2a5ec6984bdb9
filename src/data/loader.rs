//! CSV loading and saving for matches, prices and feature tables
//!
//! The betting dataset is discovered by file name inside a data directory;
//! everything else reads and writes headered CSV via serde.

use super::types::{FeatureRow, MatchRecord, PriceSeries};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// One row of the persisted price history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub adj_close: f64,
}

/// CSV loader/saver for the pipeline's flat files
pub struct DataLoader;

impl DataLoader {
    /// Resolve the betting CSV: a file path is used as-is, a directory is
    /// searched for the first `closing_odds` CSV (case-insensitive).
    pub fn resolve_betting_file<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        if !path.is_dir() {
            bail!("betting data path does not exist: {:?}", path);
        }

        for entry in std::fs::read_dir(path)
            .with_context(|| format!("Failed to read data directory: {:?}", path))?
        {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name.contains("closing_odds") && name.ends_with(".csv") {
                return Ok(entry.path());
            }
        }
        bail!("no closing_odds CSV found in {:?}", path)
    }

    /// Load match records from a betting CSV; extra columns are ignored
    pub fn load_matches<P: AsRef<Path>>(path: P) -> Result<Vec<MatchRecord>> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open betting file: {:?}", path.as_ref()))?;

        let mut reader = Reader::from_reader(file);
        let mut matches = Vec::new();
        for result in reader.deserialize() {
            let record: MatchRecord = result.context("Failed to parse match record")?;
            matches.push(record);
        }
        Ok(matches)
    }

    /// Keep matches involving the team, with complete odds, sorted by date
    pub fn filter_team_matches(matches: Vec<MatchRecord>, team: &str) -> Vec<MatchRecord> {
        let mut filtered: Vec<MatchRecord> = matches
            .into_iter()
            .filter(|m| m.involves_team(team) && m.has_complete_odds())
            .collect();
        filtered.sort_by_key(|m| m.match_date);
        filtered
    }

    /// Load the persisted price history and build the derived series
    pub fn load_price_series<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open price file: {:?}", path.as_ref()))?;

        let mut reader = Reader::from_reader(file);
        let mut bars = Vec::new();
        for result in reader.deserialize() {
            let bar: PriceBar = result.context("Failed to parse price bar")?;
            bars.push((bar.date, bar.adj_close));
        }
        if bars.is_empty() {
            bail!("price file {:?} contains no rows", path.as_ref());
        }
        Ok(PriceSeries::from_bars(bars))
    }

    /// Save raw price bars as `date,adj_close` CSV
    pub fn save_price_bars<P: AsRef<Path>>(bars: &[PriceBar], path: P) -> Result<()> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create price file: {:?}", path.as_ref()))?;

        let mut writer = Writer::from_writer(file);
        for bar in bars {
            writer.serialize(bar)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Save the engineered feature table as headered CSV
    pub fn save_feature_rows<P: AsRef<Path>>(rows: &[FeatureRow], path: P) -> Result<()> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create feature file: {:?}", path.as_ref()))?;

        let mut writer = Writer::from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Load an engineered feature table
    pub fn load_feature_rows<P: AsRef<Path>>(path: P) -> Result<Vec<FeatureRow>> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open feature file: {:?}", path.as_ref()))?;

        let mut reader = Reader::from_reader(file);
        let mut rows = Vec::new();
        for result in reader.deserialize() {
            let row: FeatureRow = result.context("Failed to parse feature row")?;
            rows.push(row);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_row(id: i64) -> FeatureRow {
        FeatureRow {
            match_id: id,
            match_date: date(2020, 1, 4),
            next_trading_day: date(2020, 1, 6),
            next_day_return: 0.01,
            three_day_return: 0.02,
            stock_up_next_day: true,
            club_home: true,
            club_away: false,
            club_won: false,
            match_outcome: 0,
            club_win_prob: Some(0.45),
            opponent_prob: Some(0.3),
            draw_prob: Some(0.25),
            bookmaker_margin: None,
            surprise_factor: Some(0.75),
            total_goals: 2,
            goal_difference: 0,
            is_domestic_league: true,
            is_champions_league: false,
            is_europa_league: false,
            is_domestic_cup: false,
            is_friendly: false,
        }
    }

    #[test]
    fn feature_table_roundtrip_keeps_missing_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alpha_dataset.csv");

        let rows = vec![sample_row(1), sample_row(2)];
        DataLoader::save_feature_rows(&rows, &path).unwrap();
        let loaded = DataLoader::load_feature_rows(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].match_id, 1);
        assert_eq!(loaded[0].club_win_prob, Some(0.45));
        assert_eq!(loaded[0].bookmaker_margin, None);
        assert_eq!(loaded[1].next_trading_day, date(2020, 1, 6));
    }

    #[test]
    fn betting_file_discovery_is_case_insensitive() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "not data").unwrap();
        std::fs::write(
            dir.path().join("Closing_Odds_full.CSV"),
            "match_id,match_date\n",
        )
        .unwrap();

        let found = DataLoader::resolve_betting_file(dir.path()).unwrap();
        assert!(found
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("Closing_Odds"));
    }

    #[test]
    fn missing_betting_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(DataLoader::resolve_betting_file(dir.path()).is_err());
    }

    #[test]
    fn match_loading_ignores_extra_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("closing_odds.csv");
        std::fs::write(
            &path,
            "match_id,match_date,home_team,away_team,home_score,away_score,league,\
             avg_odds_home_win,avg_odds_draw,avg_odds_away_win,n_odds_home_win\n\
             7,2015-08-15,Borussia Dortmund,FC Ingolstadt,2,0,German Bundesliga,1.35,5.2,9.8,41\n\
             8,2015-08-22,VfL Wolfsburg,Borussia Dortmund,1,1,German Bundesliga,,3.9,2.4,38\n",
        )
        .unwrap();

        let matches = DataLoader::load_matches(&path).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].match_id, 7);
        assert_eq!(matches[0].avg_odds_home_win, Some(1.35));
        assert_eq!(matches[1].avg_odds_home_win, None);

        let filtered = DataLoader::filter_team_matches(matches, "Dortmund");
        // second row has incomplete odds and is dropped at load time
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].match_id, 7);
    }

    #[test]
    fn price_bars_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stock_history.csv");

        let bars = vec![
            PriceBar {
                date: date(2020, 1, 7),
                adj_close: 102.0,
            },
            PriceBar {
                date: date(2020, 1, 6),
                adj_close: 100.0,
            },
        ];
        DataLoader::save_price_bars(&bars, &path).unwrap();
        let series = DataLoader::load_price_series(&path).unwrap();

        assert_eq!(series.len(), 2);
        // series is sorted regardless of file order
        assert_eq!(series.points()[0].date, date(2020, 1, 6));
        assert!((series.points()[1].daily_return.unwrap() - 0.02).abs() < 1e-12);
    }
}

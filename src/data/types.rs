//! Core data types for the odds-alpha pipeline
//!
//! This module defines the tabular records flowing through the system:
//! - MatchRecord: one historical match with average market odds
//! - PriceSeries: date-indexed adjusted closes with derived returns
//! - FeatureRow: one engineered observation per match
//! - MatchOutcome / Competition: categorical match context

use crate::config::LeagueRules;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One historical match as read from the betting dataset.
///
/// Extra columns in the source file are ignored; missing odds deserialize
/// as `None` and propagate as undefined probabilities downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: i64,
    pub match_date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i32,
    pub away_score: i32,
    pub league: String,
    pub avg_odds_home_win: Option<f64>,
    pub avg_odds_draw: Option<f64>,
    pub avg_odds_away_win: Option<f64>,
}

impl MatchRecord {
    /// Final result from the score line
    pub fn outcome(&self) -> MatchOutcome {
        if self.home_score > self.away_score {
            MatchOutcome::HomeWin
        } else if self.home_score < self.away_score {
            MatchOutcome::AwayWin
        } else {
            MatchOutcome::Draw
        }
    }

    /// True when all three average odds are present
    pub fn has_complete_odds(&self) -> bool {
        self.avg_odds_home_win.is_some()
            && self.avg_odds_draw.is_some()
            && self.avg_odds_away_win.is_some()
    }

    /// Case-insensitive substring test against either team name
    pub fn involves_team(&self, team: &str) -> bool {
        let needle = team.to_lowercase();
        self.home_team.to_lowercase().contains(&needle)
            || self.away_team.to_lowercase().contains(&needle)
    }
}

/// Full-time result of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl MatchOutcome {
    /// Signed encoding: home win = 1, draw = 0, away win = -1
    pub fn sign(&self) -> i8 {
        match self {
            MatchOutcome::HomeWin => 1,
            MatchOutcome::Draw => 0,
            MatchOutcome::AwayWin => -1,
        }
    }
}

/// Competition context of a match, classified from the league name.
///
/// Classification is case-insensitive substring matching, first match wins
/// in variant order, so a "UEFA Cup Friendly" counts as Europa League and
/// at most one of the derived flags is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Competition {
    DomesticLeague,
    ChampionsLeague,
    EuropaLeague,
    DomesticCup,
    Friendly,
    Other,
}

impl Competition {
    /// Classify a league name under the given substring rules
    pub fn classify(league: &str, rules: &LeagueRules) -> Self {
        let name = league.to_lowercase();
        let hit = |markers: &[String]| markers.iter().any(|m| name.contains(m.as_str()));

        if hit(&rules.domestic_league) && !hit(&rules.domestic_exclude) {
            Competition::DomesticLeague
        } else if hit(&rules.champions_league) {
            Competition::ChampionsLeague
        } else if hit(&rules.europa_league) {
            Competition::EuropaLeague
        } else if hit(&rules.domestic_cup) {
            Competition::DomesticCup
        } else if hit(&rules.friendly) {
            Competition::Friendly
        } else {
            Competition::Other
        }
    }
}

/// One trading day with its derived returns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
    /// Return from the previous close to this one (`None` on the first row)
    pub daily_return: Option<f64>,
    /// Return realized the day after this one (`None` on the last row)
    pub next_day_return: Option<f64>,
    /// Cumulative return over the next three trading days
    pub three_day_return: Option<f64>,
}

/// Date-sorted price history with no duplicate dates.
///
/// Built from raw (date, adjusted close) bars; the constructor sorts,
/// drops duplicate dates (first occurrence wins) and fills in the three
/// derived return columns.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from raw bars
    pub fn from_bars(mut bars: Vec<(NaiveDate, f64)>) -> Self {
        bars.sort_by_key(|(date, _)| *date);
        bars.dedup_by_key(|(date, _)| *date);

        let n = bars.len();
        let mut points: Vec<PricePoint> = bars
            .iter()
            .map(|&(date, adj_close)| PricePoint {
                date,
                adj_close,
                daily_return: None,
                next_day_return: None,
                three_day_return: None,
            })
            .collect();

        for i in 0..n {
            if i > 0 {
                let prev = bars[i - 1].1;
                if prev != 0.0 {
                    points[i].daily_return = Some(bars[i].1 / prev - 1.0);
                }
            }
            if i + 3 < n && bars[i].1 != 0.0 {
                points[i].three_day_return = Some(bars[i + 3].1 / bars[i].1 - 1.0);
            }
        }
        for i in 0..n {
            if i + 1 < n {
                points[i].next_day_return = points[i + 1].daily_return;
            }
        }

        Self { points }
    }

    /// Number of trading days in the series
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in date order
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// First trading day strictly after `date`, if any
    pub fn next_trading_day_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        let idx = self.points.partition_point(|p| p.date <= date);
        self.points.get(idx).map(|p| p.date)
    }

    /// Point at an exact date
    pub fn point(&self, date: NaiveDate) -> Option<&PricePoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| &self.points[idx])
    }
}

/// One engineered observation per match, aligned to the first trading day
/// after the match.
///
/// All odds-derived fields are `Option<f64>`: a missing market stays
/// missing instead of turning into a NaN sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub match_id: i64,
    pub match_date: NaiveDate,
    /// First trading day after the match, used for the return lookup
    pub next_trading_day: NaiveDate,
    /// Day-1 reaction: the return realized on the next trading day
    pub next_day_return: f64,
    /// Cumulative return over the three trading days from the next trading day
    pub three_day_return: f64,
    pub stock_up_next_day: bool,
    pub club_home: bool,
    pub club_away: bool,
    pub club_won: bool,
    /// Signed outcome: home win = 1, draw = 0, away win = -1
    pub match_outcome: i8,
    /// Normalized win probability of the tracked club
    pub club_win_prob: Option<f64>,
    /// Normalized win probability of the opponent
    pub opponent_prob: Option<f64>,
    /// Normalized draw probability
    pub draw_prob: Option<f64>,
    /// Excess of the raw implied-probability sum over 1
    pub bookmaker_margin: Option<f64>,
    /// 1 minus the implied probability of the realized outcome
    pub surprise_factor: Option<f64>,
    pub total_goals: i32,
    pub goal_difference: i32,
    pub is_domestic_league: bool,
    pub is_champions_league: bool,
    pub is_europa_league: bool,
    pub is_domestic_cup: bool,
    pub is_friendly: bool,
}

impl FeatureRow {
    /// Return over trading days 2-3, relative to the close of day 1:
    /// `(1 + three_day_return) / (1 + next_day_return) - 1`.
    ///
    /// `None` when the day-1 move wiped out the price entirely.
    pub fn correction_return(&self) -> Option<f64> {
        if self.next_day_return == -1.0 {
            return None;
        }
        Some((1.0 + self.three_day_return) / (1.0 + self.next_day_return) - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series() -> PriceSeries {
        PriceSeries::from_bars(vec![
            (date(2020, 1, 6), 100.0),
            (date(2020, 1, 7), 102.0),
            (date(2020, 1, 8), 101.0),
            (date(2020, 1, 9), 103.0),
            (date(2020, 1, 10), 104.0),
            (date(2020, 1, 13), 105.0),
        ])
    }

    #[test]
    fn series_sorts_and_dedupes() {
        let s = PriceSeries::from_bars(vec![
            (date(2020, 1, 8), 101.0),
            (date(2020, 1, 6), 100.0),
            (date(2020, 1, 6), 999.0),
            (date(2020, 1, 7), 102.0),
        ]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.points()[0].date, date(2020, 1, 6));
        assert_eq!(s.points()[0].adj_close, 100.0);
        assert_eq!(s.points()[2].date, date(2020, 1, 8));
    }

    #[test]
    fn series_derives_returns() {
        let s = series();
        let p = s.point(date(2020, 1, 7)).unwrap();
        assert!((p.daily_return.unwrap() - 0.02).abs() < 1e-12);
        // next_day_return at Jan 7 is the Jan 8 daily return
        assert!((p.next_day_return.unwrap() - (101.0 / 102.0 - 1.0)).abs() < 1e-12);
        // three days ahead of Jan 7 is Jan 10
        assert!((p.three_day_return.unwrap() - (104.0 / 102.0 - 1.0)).abs() < 1e-12);

        let first = s.point(date(2020, 1, 6)).unwrap();
        assert!(first.daily_return.is_none());
        let last = s.point(date(2020, 1, 13)).unwrap();
        assert!(last.next_day_return.is_none());
        assert!(last.three_day_return.is_none());
    }

    #[test]
    fn next_trading_day_is_strictly_after() {
        let s = series();
        // Jan 11-12 is a weekend in the series
        assert_eq!(
            s.next_trading_day_after(date(2020, 1, 10)),
            Some(date(2020, 1, 13))
        );
        assert_eq!(
            s.next_trading_day_after(date(2020, 1, 11)),
            Some(date(2020, 1, 13))
        );
        assert_eq!(s.next_trading_day_after(date(2020, 1, 13)), None);
        assert_eq!(s.next_trading_day_after(date(2020, 1, 20)), None);
    }

    #[test]
    fn outcome_from_scores() {
        let mut m = MatchRecord {
            match_id: 1,
            match_date: date(2020, 1, 4),
            home_team: "Borussia Dortmund".to_string(),
            away_team: "FC Bayern Munich".to_string(),
            home_score: 2,
            away_score: 1,
            league: "German Bundesliga".to_string(),
            avg_odds_home_win: Some(2.0),
            avg_odds_draw: Some(3.5),
            avg_odds_away_win: Some(4.0),
        };
        assert_eq!(m.outcome(), MatchOutcome::HomeWin);
        assert_eq!(m.outcome().sign(), 1);
        m.away_score = 2;
        assert_eq!(m.outcome(), MatchOutcome::Draw);
        m.away_score = 3;
        assert_eq!(m.outcome().sign(), -1);
        assert!(m.involves_team("dortmund"));
        assert!(!m.involves_team("Schalke"));
    }

    #[test]
    fn league_classification_first_match_wins() {
        let rules = LeagueRules::default();
        assert_eq!(
            Competition::classify("German Bundesliga", &rules),
            Competition::DomesticLeague
        );
        assert_eq!(
            Competition::classify("2. Bundesliga", &rules),
            Competition::Other
        );
        assert_eq!(
            Competition::classify("UEFA Champions League", &rules),
            Competition::ChampionsLeague
        );
        assert_eq!(
            Competition::classify("UEFA Cup Friendly", &rules),
            Competition::EuropaLeague
        );
        assert_eq!(
            Competition::classify("DFB Pokal", &rules),
            Competition::DomesticCup
        );
        assert_eq!(
            Competition::classify("Club Friendly", &rules),
            Competition::Friendly
        );
    }

    #[test]
    fn correction_return_identity() {
        let row = FeatureRow {
            match_id: 1,
            match_date: date(2020, 1, 4),
            next_trading_day: date(2020, 1, 6),
            next_day_return: 0.02,
            three_day_return: 0.05,
            stock_up_next_day: true,
            club_home: true,
            club_away: false,
            club_won: true,
            match_outcome: 1,
            club_win_prob: Some(0.5),
            opponent_prob: Some(0.25),
            draw_prob: Some(0.25),
            bookmaker_margin: Some(0.03),
            surprise_factor: Some(0.5),
            total_goals: 3,
            goal_difference: 1,
            is_domestic_league: true,
            is_champions_league: false,
            is_europa_league: false,
            is_domestic_cup: false,
            is_friendly: false,
        };
        let correction = row.correction_return().unwrap();
        assert!((correction - (1.05 / 1.02 - 1.0)).abs() < 1e-12);
        assert!(((1.0 + row.next_day_return) * (1.0 + correction) - (1.0 + row.three_day_return))
            .abs()
            < 1e-12);
    }
}

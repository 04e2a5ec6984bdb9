//! Feature engineering: from match records to alpha observations
//!
//! For every match this module resolves the first trading day after the
//! match, reads the realized day-1 and 3-day returns there, converts the
//! market odds into normalized probabilities, and derives the bookmaker
//! margin, surprise factor and league-context flags.
//!
//! Skip policy:
//! - no next trading day, or missing returns at it: silent skip
//! - missing or non-positive odds: row kept, odds-derived fields `None`
//! - any other per-match failure: logged with the match id and skipped

use crate::config::LeagueRules;
use crate::data::types::{Competition, FeatureRow, MatchOutcome, MatchRecord, PriceSeries};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Per-match engineering failures that are logged rather than escalated
#[derive(Error, Debug)]
pub enum EngineerError {
    #[error("configured club '{team}' plays in neither '{home}' nor '{away}'")]
    ClubNotInvolved {
        team: String,
        home: String,
        away: String,
    },
}

/// Normalized market probabilities for one match
#[derive(Debug, Clone, Copy, Default)]
struct NormalizedMarket {
    home: Option<f64>,
    draw: Option<f64>,
    away: Option<f64>,
    margin: Option<f64>,
}

/// Engineers one [`FeatureRow`] per resolvable match
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    team: String,
    rules: LeagueRules,
}

impl FeatureEngineer {
    /// Create an engineer tracking `team` under the given league rules
    pub fn new(team: impl Into<String>, rules: LeagueRules) -> Self {
        Self {
            team: team.into(),
            rules,
        }
    }

    /// Process all matches against the price series.
    ///
    /// Matches without a resolvable target return are absent from the
    /// output; per-match errors are logged and never abort the batch.
    pub fn process_matches(
        &self,
        matches: &[MatchRecord],
        prices: &PriceSeries,
    ) -> Vec<FeatureRow> {
        let mut rows = Vec::with_capacity(matches.len());
        for record in matches {
            match self.engineer_match(record, prices) {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => {
                    debug!(match_id = record.match_id, "no resolvable target return");
                }
                Err(e) => {
                    warn!(match_id = record.match_id, "skipping match: {e}");
                }
            }
        }
        info!(
            "engineered {} feature rows from {} matches",
            rows.len(),
            matches.len()
        );
        rows
    }

    /// Engineer a single match; `Ok(None)` means a silent skip
    fn engineer_match(
        &self,
        record: &MatchRecord,
        prices: &PriceSeries,
    ) -> Result<Option<FeatureRow>, EngineerError> {
        let Some(next_trading_day) = prices.next_trading_day_after(record.match_date) else {
            return Ok(None);
        };
        let Some(point) = prices.point(next_trading_day) else {
            return Ok(None);
        };
        let (Some(next_day_return), Some(three_day_return)) =
            (point.daily_return, point.three_day_return)
        else {
            return Ok(None);
        };

        let market = normalize_market(
            implied_probability(record.avg_odds_home_win),
            implied_probability(record.avg_odds_draw),
            implied_probability(record.avg_odds_away_win),
        );

        let outcome = record.outcome();

        let needle = self.team.to_lowercase();
        let club_home = record.home_team.to_lowercase().contains(&needle);
        let club_away = record.away_team.to_lowercase().contains(&needle);
        if !club_home && !club_away {
            return Err(EngineerError::ClubNotInvolved {
                team: self.team.clone(),
                home: record.home_team.clone(),
                away: record.away_team.clone(),
            });
        }

        // Ambiguous naming could match both sides; home takes precedence.
        let (club_win_prob, opponent_prob, club_won) = if club_home {
            (market.home, market.away, outcome == MatchOutcome::HomeWin)
        } else {
            (market.away, market.home, outcome == MatchOutcome::AwayWin)
        };

        let surprise_factor =
            surprise_factor(outcome, club_won, club_win_prob, market.draw, opponent_prob);

        let competition = Competition::classify(&record.league, &self.rules);

        Ok(Some(FeatureRow {
            match_id: record.match_id,
            match_date: record.match_date,
            next_trading_day,
            next_day_return,
            three_day_return,
            stock_up_next_day: next_day_return > 0.0,
            club_home,
            club_away: club_away && !club_home,
            club_won,
            match_outcome: outcome.sign(),
            club_win_prob,
            opponent_prob,
            draw_prob: market.draw,
            bookmaker_margin: market.margin,
            surprise_factor,
            total_goals: record.home_score + record.away_score,
            goal_difference: (record.home_score - record.away_score).abs(),
            is_domestic_league: competition == Competition::DomesticLeague,
            is_champions_league: competition == Competition::ChampionsLeague,
            is_europa_league: competition == Competition::EuropaLeague,
            is_domestic_cup: competition == Competition::DomesticCup,
            is_friendly: competition == Competition::Friendly,
        }))
    }
}

/// Implied probability of decimal odds; undefined for missing or
/// non-positive odds
fn implied_probability(odds: Option<f64>) -> Option<f64> {
    odds.filter(|o| o.is_finite() && *o > 0.0).map(|o| 1.0 / o)
}

/// Normalize the three implied probabilities to sum to 1; the excess of
/// the raw sum over 1 is the bookmaker margin. Any missing probability
/// leaves everything undefined.
fn normalize_market(
    home: Option<f64>,
    draw: Option<f64>,
    away: Option<f64>,
) -> NormalizedMarket {
    let (Some(home), Some(draw), Some(away)) = (home, draw, away) else {
        return NormalizedMarket::default();
    };
    let total = home + draw + away;
    if total <= 0.0 {
        return NormalizedMarket::default();
    }
    NormalizedMarket {
        home: Some(home / total),
        draw: Some(draw / total),
        away: Some(away / total),
        margin: Some(total - 1.0),
    }
}

/// 1 minus the normalized probability of the outcome that occurred
fn surprise_factor(
    outcome: MatchOutcome,
    club_won: bool,
    club_win_prob: Option<f64>,
    draw_prob: Option<f64>,
    opponent_prob: Option<f64>,
) -> Option<f64> {
    if club_won {
        club_win_prob.map(|p| 1.0 - p)
    } else if outcome == MatchOutcome::Draw {
        draw_prob.map(|p| 1.0 - p)
    } else {
        opponent_prob.map(|p| 1.0 - p)
    }
}

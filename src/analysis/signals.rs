//! Alpha signal battery over the engineered feature table
//!
//! Computes the fixed set of descriptive statistics, correlations and
//! group comparisons that characterize whether pre-match odds or
//! post-match surprise predict the club's stock returns. Each sub-report
//! is `None` when a required comparison group is empty, and t-tests are
//! only attempted when both groups exceed the configured minimum size.

use crate::analysis::stats::{mean, pearson, sample_std, two_sample_t_test};
use crate::config::SignalConfig;
use crate::data::types::FeatureRow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dataset composition and basic return statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub total_matches: usize,
    /// Rows with both win probability and bookmaker margin defined
    pub complete_odds: usize,
    pub domestic_league_matches: usize,
    pub champions_league_matches: usize,
    pub europa_league_matches: usize,
    pub mean_return: Option<f64>,
    pub volatility: Option<f64>,
    /// Share of matches followed by a positive next-day return
    pub positive_share: Option<f64>,
    /// Mean next-day return after club wins (behavioral validation)
    pub win_return: Option<f64>,
    /// Mean next-day return after non-wins
    pub loss_return: Option<f64>,
}

/// Pearson correlations of odds features against return and volatility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub prob_vs_return: Option<f64>,
    pub prob_vs_volatility: Option<f64>,
    pub margin_vs_return: Option<f64>,
    pub margin_vs_volatility: Option<f64>,
}

/// Mean returns for high- versus low-confidence markets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilityRangeReport {
    pub high_n: usize,
    pub low_n: usize,
    pub high_mean_return: f64,
    pub low_mean_return: f64,
    /// Two-sided t-test p-value, present only when both groups are large enough
    pub p_value: Option<f64>,
}

/// Return and volatility for low- versus high-margin markets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginReport {
    pub low_n: usize,
    pub high_n: usize,
    pub low_mean_return: f64,
    pub high_mean_return: f64,
    pub low_mean_abs_return: f64,
    pub high_mean_abs_return: f64,
    /// T-test on the absolute returns (volatility proxy)
    pub volatility_p_value: Option<f64>,
}

/// Day-1 versus correction behavior within one outcome subset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeBreakdown {
    pub n: usize,
    pub mean_day1_return: f64,
    pub mean_correction_return: f64,
}

/// Reversal/momentum diagnostics for high-surprise matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurpriseReport {
    pub n: usize,
    /// Correlation of the day-1 return with the day 2-3 correction.
    /// Negative suggests overreaction (reversal), positive underreaction.
    pub day1_correction_correlation: Option<f64>,
    pub surprising_wins: Option<OutcomeBreakdown>,
    pub surprising_losses: Option<OutcomeBreakdown>,
}

/// The full signal battery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaSignalReport {
    /// Rows with every analyzed field defined
    pub n_analyzed: usize,
    pub correlations: CorrelationReport,
    pub probability_ranges: Option<ProbabilityRangeReport>,
    pub margins: Option<MarginReport>,
    pub surprise: Option<SurpriseReport>,
}

/// One fully observed row, pre-extracted for the battery
struct CleanRow {
    next_day_return: f64,
    win_prob: f64,
    margin: f64,
    surprise: f64,
    correction: f64,
    club_won: bool,
}

/// Computes [`DatasetOverview`] and [`AlphaSignalReport`] from feature rows
#[derive(Debug, Clone, Default)]
pub struct SignalAnalyzer {
    config: SignalConfig,
}

impl SignalAnalyzer {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    /// Dataset composition, return statistics and the behavioral
    /// win/loss sanity check
    pub fn dataset_overview(&self, rows: &[FeatureRow]) -> DatasetOverview {
        let returns: Vec<f64> = rows.iter().map(|r| r.next_day_return).collect();
        let wins: Vec<f64> = rows
            .iter()
            .filter(|r| r.club_won)
            .map(|r| r.next_day_return)
            .collect();
        let losses: Vec<f64> = rows
            .iter()
            .filter(|r| !r.club_won)
            .map(|r| r.next_day_return)
            .collect();

        let positive_share = if rows.is_empty() {
            None
        } else {
            Some(returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64)
        };

        DatasetOverview {
            total_matches: rows.len(),
            complete_odds: rows
                .iter()
                .filter(|r| r.club_win_prob.is_some() && r.bookmaker_margin.is_some())
                .count(),
            domestic_league_matches: rows.iter().filter(|r| r.is_domestic_league).count(),
            champions_league_matches: rows.iter().filter(|r| r.is_champions_league).count(),
            europa_league_matches: rows.iter().filter(|r| r.is_europa_league).count(),
            mean_return: mean(&returns),
            volatility: sample_std(&returns),
            positive_share,
            win_return: mean(&wins),
            loss_return: mean(&losses),
        }
    }

    /// Run the full signal battery on the fully observed subset of rows
    pub fn analyze(&self, rows: &[FeatureRow]) -> AlphaSignalReport {
        let clean: Vec<CleanRow> = rows
            .iter()
            .filter_map(|r| {
                Some(CleanRow {
                    next_day_return: r.next_day_return,
                    win_prob: r.club_win_prob?,
                    margin: r.bookmaker_margin?,
                    surprise: r.surprise_factor?,
                    correction: r.correction_return()?,
                    club_won: r.club_won,
                })
            })
            .collect();

        AlphaSignalReport {
            n_analyzed: clean.len(),
            correlations: self.correlations(&clean),
            probability_ranges: self.probability_ranges(&clean),
            margins: self.margins(&clean),
            surprise: self.surprise(&clean),
        }
    }

    fn correlations(&self, rows: &[CleanRow]) -> CorrelationReport {
        let probs: Vec<f64> = rows.iter().map(|r| r.win_prob).collect();
        let margins: Vec<f64> = rows.iter().map(|r| r.margin).collect();
        let returns: Vec<f64> = rows.iter().map(|r| r.next_day_return).collect();
        let abs_returns: Vec<f64> = returns.iter().map(|r| r.abs()).collect();

        CorrelationReport {
            prob_vs_return: pearson(&probs, &returns),
            prob_vs_volatility: pearson(&probs, &abs_returns),
            margin_vs_return: pearson(&margins, &returns),
            margin_vs_volatility: pearson(&margins, &abs_returns),
        }
    }

    fn probability_ranges(&self, rows: &[CleanRow]) -> Option<ProbabilityRangeReport> {
        let high: Vec<f64> = rows
            .iter()
            .filter(|r| r.win_prob > self.config.high_prob)
            .map(|r| r.next_day_return)
            .collect();
        let low: Vec<f64> = rows
            .iter()
            .filter(|r| r.win_prob < self.config.low_prob)
            .map(|r| r.next_day_return)
            .collect();

        if high.is_empty() || low.is_empty() {
            return None;
        }

        let p_value = if high.len() > self.config.min_group_size
            && low.len() > self.config.min_group_size
        {
            two_sample_t_test(&high, &low)
        } else {
            None
        };

        Some(ProbabilityRangeReport {
            high_n: high.len(),
            low_n: low.len(),
            high_mean_return: mean(&high)?,
            low_mean_return: mean(&low)?,
            p_value,
        })
    }

    fn margins(&self, rows: &[CleanRow]) -> Option<MarginReport> {
        let low: Vec<f64> = rows
            .iter()
            .filter(|r| r.margin < self.config.low_margin)
            .map(|r| r.next_day_return)
            .collect();
        let high: Vec<f64> = rows
            .iter()
            .filter(|r| r.margin > self.config.high_margin)
            .map(|r| r.next_day_return)
            .collect();

        if low.is_empty() || high.is_empty() {
            return None;
        }

        let low_abs: Vec<f64> = low.iter().map(|r| r.abs()).collect();
        let high_abs: Vec<f64> = high.iter().map(|r| r.abs()).collect();

        let volatility_p_value = if low.len() > self.config.min_group_size
            && high.len() > self.config.min_group_size
        {
            two_sample_t_test(&low_abs, &high_abs)
        } else {
            None
        };

        Some(MarginReport {
            low_n: low.len(),
            high_n: high.len(),
            low_mean_return: mean(&low)?,
            high_mean_return: mean(&high)?,
            low_mean_abs_return: mean(&low_abs)?,
            high_mean_abs_return: mean(&high_abs)?,
            volatility_p_value,
        })
    }

    fn surprise(&self, rows: &[CleanRow]) -> Option<SurpriseReport> {
        let high: Vec<&CleanRow> = rows
            .iter()
            .filter(|r| r.surprise > self.config.surprise_threshold)
            .collect();
        if high.is_empty() {
            return None;
        }

        let day1: Vec<f64> = high.iter().map(|r| r.next_day_return).collect();
        let corrections: Vec<f64> = high.iter().map(|r| r.correction).collect();

        let breakdown = |won: bool| -> Option<OutcomeBreakdown> {
            let subset: Vec<&&CleanRow> = high.iter().filter(|r| r.club_won == won).collect();
            if subset.is_empty() {
                return None;
            }
            let d1: Vec<f64> = subset.iter().map(|r| r.next_day_return).collect();
            let corr: Vec<f64> = subset.iter().map(|r| r.correction).collect();
            Some(OutcomeBreakdown {
                n: subset.len(),
                mean_day1_return: mean(&d1)?,
                mean_correction_return: mean(&corr)?,
            })
        };

        Some(SurpriseReport {
            n: high.len(),
            day1_correction_correlation: pearson(&day1, &corrections),
            surprising_wins: breakdown(true),
            surprising_losses: breakdown(false),
        })
    }
}

fn pct(value: f64) -> f64 {
    value * 100.0
}

impl fmt::Display for DatasetOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==================================================")?;
        writeln!(f, "DATASET OVERVIEW FOR ALPHA MINING")?;
        writeln!(f, "==================================================")?;
        writeln!(f, "Total matches: {}", self.total_matches)?;
        if self.total_matches > 0 {
            let share = self.complete_odds as f64 / self.total_matches as f64;
            writeln!(
                f,
                "Complete odds data: {} ({:.1}%)",
                self.complete_odds,
                pct(share)
            )?;
            writeln!(f, "\nMatch composition:")?;
            for (label, n) in [
                ("Domestic league", self.domestic_league_matches),
                ("Champions League", self.champions_league_matches),
                ("Europa League", self.europa_league_matches),
            ] {
                writeln!(
                    f,
                    "  {}: {} ({:.1}%)",
                    label,
                    n,
                    pct(n as f64 / self.total_matches as f64)
                )?;
            }
        }
        writeln!(f, "\nStock return statistics:")?;
        if let Some(mean_return) = self.mean_return {
            writeln!(f, "  Average daily return: {:+.4}", mean_return)?;
        }
        if let Some(volatility) = self.volatility {
            writeln!(f, "  Daily volatility: {:.4}", volatility)?;
        }
        if let Some(positive) = self.positive_share {
            writeln!(f, "  Positive return days: {:.1}%", pct(positive))?;
        }
        writeln!(f, "\nAverage next-day return by match outcome:")?;
        match (self.win_return, self.loss_return) {
            (Some(win), Some(loss)) => {
                writeln!(f, "  After wins:   {:+.4}", win)?;
                writeln!(f, "  After losses: {:+.4}", loss)?;
            }
            _ => writeln!(f, "  Not enough data for the win/loss comparison.")?,
        }
        Ok(())
    }
}

impl fmt::Display for AlphaSignalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==================================================")?;
        writeln!(f, "ALPHA SIGNAL ANALYSIS (n = {})", self.n_analyzed)?;
        writeln!(f, "==================================================")?;

        writeln!(f, "\nCorrelations:")?;
        for (label, value) in [
            ("Win prob vs return    ", self.correlations.prob_vs_return),
            ("Win prob vs volatility", self.correlations.prob_vs_volatility),
            ("Margin vs return      ", self.correlations.margin_vs_return),
            ("Margin vs volatility  ", self.correlations.margin_vs_volatility),
        ] {
            match value {
                Some(v) => writeln!(f, "  {}: {:+.4}", label, v)?,
                None => writeln!(f, "  {}: undefined", label)?,
            }
        }

        writeln!(f, "\nProbability ranges:")?;
        match &self.probability_ranges {
            Some(report) => {
                writeln!(
                    f,
                    "  High prob (>60%) return: {:+.4} (n = {})",
                    report.high_mean_return, report.high_n
                )?;
                writeln!(
                    f,
                    "  Low prob (<40%) return:  {:+.4} (n = {})",
                    report.low_mean_return, report.low_n
                )?;
                if let Some(p) = report.p_value {
                    writeln!(f, "  T-test p-value: {:.4}", p)?;
                }
            }
            None => writeln!(f, "  Not enough data for high/low probability comparison.")?,
        }

        writeln!(f, "\nBookmaker margins:")?;
        match &self.margins {
            Some(report) => {
                writeln!(
                    f,
                    "  Low margin (<5%):  return={:+.4}, vol={:.4} (n = {})",
                    report.low_mean_return, report.low_mean_abs_return, report.low_n
                )?;
                writeln!(
                    f,
                    "  High margin (>10%): return={:+.4}, vol={:.4} (n = {})",
                    report.high_mean_return, report.high_mean_abs_return, report.high_n
                )?;
                if let Some(p) = report.volatility_p_value {
                    writeln!(f, "  Volatility t-test p-value: {:.4}", p)?;
                }
            }
            None => writeln!(f, "  Not enough data for high/low margin comparison.")?,
        }

        writeln!(f, "\nSurprise factor:")?;
        match &self.surprise {
            Some(report) => {
                writeln!(f, "  High-surprise matches: n = {}", report.n)?;
                if let Some(corr) = report.day1_correction_correlation {
                    writeln!(
                        f,
                        "  Correlation(day-1 return vs day 2-3 correction): {:+.4}",
                        corr
                    )?;
                }
                if let Some(wins) = &report.surprising_wins {
                    writeln!(f, "\n  Surprising wins (n = {}):", wins.n)?;
                    writeln!(f, "    Avg day-1 return:       {:+.4}", wins.mean_day1_return)?;
                    writeln!(
                        f,
                        "    Avg day 2-3 correction: {:+.4}",
                        wins.mean_correction_return
                    )?;
                }
                if let Some(losses) = &report.surprising_losses {
                    writeln!(f, "\n  Surprising losses (n = {}):", losses.n)?;
                    writeln!(
                        f,
                        "    Avg day-1 return:       {:+.4}",
                        losses.mean_day1_return
                    )?;
                    writeln!(
                        f,
                        "    Avg day 2-3 correction: {:+.4}",
                        losses.mean_correction_return
                    )?;
                }
            }
            None => writeln!(f, "  Not enough high-surprise data to analyze.")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn row(
        id: i64,
        win_prob: f64,
        margin: f64,
        surprise: f64,
        next_day_return: f64,
        three_day_return: f64,
        club_won: bool,
    ) -> FeatureRow {
        FeatureRow {
            match_id: id,
            match_date: date(4),
            next_trading_day: date(6),
            next_day_return,
            three_day_return,
            stock_up_next_day: next_day_return > 0.0,
            club_home: true,
            club_away: false,
            club_won,
            match_outcome: if club_won { 1 } else { -1 },
            club_win_prob: Some(win_prob),
            opponent_prob: Some(1.0 - win_prob - 0.25),
            draw_prob: Some(0.25),
            bookmaker_margin: Some(margin),
            surprise_factor: Some(surprise),
            total_goals: 2,
            goal_difference: 1,
            is_domestic_league: true,
            is_champions_league: false,
            is_europa_league: false,
            is_domestic_cup: false,
            is_friendly: false,
        }
    }

    #[test]
    fn overview_counts_and_behavioral_check() {
        let rows = vec![
            row(1, 0.5, 0.05, 0.5, 0.02, 0.03, true),
            row(2, 0.5, 0.05, 0.5, 0.01, 0.02, true),
            row(3, 0.5, 0.05, 0.5, -0.02, -0.01, false),
        ];
        let overview = SignalAnalyzer::default().dataset_overview(&rows);

        assert_eq!(overview.total_matches, 3);
        assert_eq!(overview.complete_odds, 3);
        assert_eq!(overview.domestic_league_matches, 3);
        assert_eq!(overview.champions_league_matches, 0);
        assert!((overview.positive_share.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((overview.win_return.unwrap() - 0.015).abs() < 1e-12);
        assert!((overview.loss_return.unwrap() + 0.02).abs() < 1e-12);
    }

    #[test]
    fn rows_with_missing_fields_are_excluded_from_the_battery() {
        let mut incomplete = row(1, 0.5, 0.05, 0.5, 0.02, 0.03, true);
        incomplete.bookmaker_margin = None;
        let rows = vec![incomplete, row(2, 0.5, 0.05, 0.5, 0.01, 0.02, true)];

        let report = SignalAnalyzer::default().analyze(&rows);
        assert_eq!(report.n_analyzed, 1);
    }

    #[test]
    fn empty_high_probability_group_suppresses_the_comparison() {
        // all win probabilities sit between the thresholds
        let rows: Vec<FeatureRow> = (0..10)
            .map(|i| row(i, 0.5, 0.05, 0.5, 0.01 * i as f64, 0.02, true))
            .collect();

        let report = SignalAnalyzer::default().analyze(&rows);
        assert!(report.probability_ranges.is_none());

        let text = report.to_string();
        assert!(text.contains("Not enough data for high/low probability comparison."));
    }

    #[test]
    fn small_groups_report_means_without_p_value() {
        // 3 high-prob and 3 low-prob rows: groups exist but are too small
        let mut rows = Vec::new();
        for i in 0..3 {
            rows.push(row(i, 0.7, 0.04, 0.2, 0.02 + 0.001 * i as f64, 0.03, true));
            rows.push(row(10 + i, 0.3, 0.12, 0.8, -0.01 - 0.001 * i as f64, 0.0, false));
        }
        let report = SignalAnalyzer::default().analyze(&rows);

        let ranges = report.probability_ranges.unwrap();
        assert_eq!(ranges.high_n, 3);
        assert_eq!(ranges.low_n, 3);
        assert!(ranges.p_value.is_none());

        let margins = report.margins.unwrap();
        assert_eq!(margins.low_n, 3);
        assert_eq!(margins.high_n, 3);
        assert!(margins.volatility_p_value.is_none());
    }

    #[test]
    fn large_separated_groups_produce_significant_p_value() {
        let mut rows = Vec::new();
        for i in 0..8 {
            let jitter = 0.0005 * i as f64;
            rows.push(row(i, 0.7, 0.02, 0.2, 0.03 + jitter, 0.04, true));
            rows.push(row(20 + i, 0.3, 0.15, 0.8, -0.03 - jitter, -0.02, false));
        }
        let report = SignalAnalyzer::default().analyze(&rows);

        let ranges = report.probability_ranges.unwrap();
        assert!(ranges.p_value.unwrap() < 0.01);
        assert!(ranges.high_mean_return > ranges.low_mean_return);

        let margins = report.margins.unwrap();
        assert!(margins.volatility_p_value.is_some());
    }

    #[test]
    fn surprise_report_splits_wins_and_losses() {
        let rows = vec![
            row(1, 0.2, 0.05, 0.8, 0.05, 0.02, true),
            row(2, 0.2, 0.05, 0.9, 0.04, 0.01, true),
            row(3, 0.7, 0.05, 0.85, -0.04, -0.01, false),
            // below threshold, excluded from the surprise subset
            row(4, 0.5, 0.05, 0.3, 0.01, 0.02, true),
        ];
        let report = SignalAnalyzer::default().analyze(&rows);

        let surprise = report.surprise.unwrap();
        assert_eq!(surprise.n, 3);
        assert!(surprise.day1_correction_correlation.is_some());

        let wins = surprise.surprising_wins.unwrap();
        assert_eq!(wins.n, 2);
        assert!((wins.mean_day1_return - 0.045).abs() < 1e-12);

        let losses = surprise.surprising_losses.unwrap();
        assert_eq!(losses.n, 1);
        assert!(losses.mean_day1_return < 0.0);
    }

    #[test]
    fn no_high_surprise_rows_suppresses_the_report() {
        let rows = vec![row(1, 0.5, 0.05, 0.2, 0.01, 0.02, true)];
        let report = SignalAnalyzer::default().analyze(&rows);
        assert!(report.surprise.is_none());
        assert!(report
            .to_string()
            .contains("Not enough high-surprise data to analyze."));
    }
}

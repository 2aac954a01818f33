//! Fixture tipping: drives the fitted rate model over an upcoming round list
//! and aggregates each scoreline grid into a head-to-head tip.

use anyhow::bail;
use serde::Serialize;
use tracing::warn;

use crate::data::{Fixture, HistoricalMatch};
use crate::linear::Matrix;
use crate::poisson;
use crate::regression::RateModel;
use crate::scoregrid;

#[derive(Clone, Debug)]
pub struct TipConfig {
    /// Matches dated before this year are excluded from fitting.
    pub cutoff_year: i32,
    /// Truncation bound on the per-side score distributions. An accuracy
    /// knob, not a domain constant: it must comfortably exceed the fitted
    /// rates or the simulator will warn about discarded mass.
    pub max_score: usize,
    pub include_playoffs: bool,
}
impl TipConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_score == 0 {
            bail!("max score must be at least 1");
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchPrediction {
    pub round: String,
    pub home_team: String,
    pub away_team: String,
    pub home_win_prob: f64,
    pub draw_prob: f64,
    pub away_win_prob: f64,
    pub home_expected: f64,
    pub away_expected: f64,
    pub predicted_winner: String,
}
impl MatchPrediction {
    /// The home side is tipped only when strictly in front on win
    /// probability; ties and draw-dominant outcomes fall to the away side,
    /// as the tipping rule has always had it.
    pub fn from_scoregrid(fixture: &Fixture, scoregrid: &Matrix) -> Self {
        let outcome = scoregrid::aggregate(scoregrid);
        let (home_expected, away_expected) = scoregrid::home_away_expectations(scoregrid);
        let predicted_winner = if outcome.home_win > outcome.away_win {
            fixture.home_team.clone()
        } else {
            fixture.away_team.clone()
        };
        Self {
            round: fixture.round.clone(),
            home_team: fixture.home_team.clone(),
            away_team: fixture.away_team.clone(),
            home_win_prob: outcome.home_win,
            draw_prob: outcome.draw,
            away_win_prob: outcome.away_win,
            home_expected,
            away_expected,
            predicted_winner,
        }
    }
}

/// Tips each fixture independently. A fixture naming a team absent from the
/// training data is skipped with a warning rather than sinking the whole
/// round; callers wanting fail-fast semantics should invoke
/// [`scoregrid::simulate`] directly.
pub fn tip_fixtures(
    model: &RateModel,
    fixtures: &[Fixture],
    max_score: usize,
) -> Vec<MatchPrediction> {
    let mut predictions = Vec::with_capacity(fixtures.len());
    for fixture in fixtures {
        match scoregrid::simulate(model, &fixture.home_team, &fixture.away_team, max_score) {
            Ok(scoregrid) => predictions.push(MatchPrediction::from_scoregrid(fixture, &scoregrid)),
            Err(err) => {
                warn!(
                    "skipping round {} fixture {} v {}: {err}",
                    fixture.round, fixture.home_team, fixture.away_team
                );
            }
        }
    }
    predictions
}

/// Observed score frequencies across the whole historical dataset, bucketed,
/// with the mean-rate Poisson overlay for each side. Feeds the histogram
/// report.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreHistogram {
    pub buckets: Vec<HistogramBucket>,
    pub home_mean: f64,
    pub away_mean: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBucket {
    pub lower: usize,
    /// Exclusive; scores beyond the final bucket are clamped into it.
    pub upper: usize,
    pub home_observed: f64,
    pub away_observed: f64,
    pub home_poisson: f64,
    pub away_poisson: f64,
}

impl ScoreHistogram {
    pub fn build(history: &[HistoricalMatch], bucket_width: usize, max_score: usize) -> Self {
        assert!(!history.is_empty(), "no history to bucket");
        assert!(bucket_width > 0, "bucket width must be at least 1");

        let matches = history.len() as f64;
        let home_mean = history.iter().map(|game| game.home_score as f64).sum::<f64>() / matches;
        let away_mean = history.iter().map(|game| game.away_score as f64).sum::<f64>() / matches;
        let home_mass = poisson::mass_series(home_mean, max_score);
        let away_mass = poisson::mass_series(away_mean, max_score);

        let num_buckets = max_score / bucket_width + 1;
        let mut buckets = (0..num_buckets)
            .map(|index| HistogramBucket {
                lower: index * bucket_width,
                upper: (index + 1) * bucket_width,
                home_observed: 0.0,
                away_observed: 0.0,
                home_poisson: 0.0,
                away_poisson: 0.0,
            })
            .collect::<Vec<_>>();

        let bucket_of = |score: usize| usize::min(score, max_score) / bucket_width;
        for game in history {
            buckets[bucket_of(game.home_score as usize)].home_observed += 1.0 / matches;
            buckets[bucket_of(game.away_score as usize)].away_observed += 1.0 / matches;
        }
        for (score, (&home_prob, &away_prob)) in home_mass.iter().zip(away_mass.iter()).enumerate()
        {
            let bucket = &mut buckets[bucket_of(score)];
            bucket.home_poisson += home_prob;
            bucket.away_poisson += away_prob;
        }

        Self {
            buckets,
            home_mean,
            away_mean,
        }
    }
}

//! Scoreline probability grids. A grid cell `(i, j)` holds the probability of
//! the home side scoring `i` and the away side scoring `j`, the two sides
//! taken as independent Poisson processes.

use tracing::warn;

use crate::linear::Matrix;
use crate::poisson;
use crate::probs::SliceExt;
use crate::regression::{RateModel, UnknownTeamError};

/// Probability mass permitted to fall beyond the grid before the truncation
/// bound is considered too tight for the fitted rates.
pub const TAIL_TOLERANCE: f64 = 1e-6;

/// Fills the grid with the outer product of two truncated univariate Poisson
/// series.
pub fn from_poisson(home_rate: f64, away_rate: f64, scoregrid: &mut Matrix) {
    let home_mass = poisson::mass_series(home_rate, scoregrid.rows() - 1);
    let away_mass = poisson::mass_series(away_rate, scoregrid.cols() - 1);
    for (home_score, &home_prob) in home_mass.iter().enumerate() {
        let row_slice = scoregrid.row_slice_mut(home_score);
        for (away_score, &away_prob) in away_mass.iter().enumerate() {
            row_slice[away_score] = home_prob * away_prob;
        }
    }
}

/// Queries the model for both perspectives of the matchup and builds the
/// joint scoreline grid over `{0, ..., max_score}²`. Deterministic; retains
/// no state between calls.
pub fn simulate(
    model: &RateModel,
    home_team: &str,
    away_team: &str,
    max_score: usize,
) -> Result<Matrix, UnknownTeamError> {
    let home_rate = model.predict(home_team, away_team, true)?;
    let away_rate = model.predict(away_team, home_team, false)?;
    let mut scoregrid = Matrix::allocate(max_score + 1, max_score + 1);
    from_poisson(home_rate, away_rate, &mut scoregrid);

    let truncated = 1.0 - scoregrid.flatten().sum();
    if truncated > TAIL_TOLERANCE {
        warn!(
            "max_score {max_score} truncates {truncated:.2e} of the mass for \
             {home_team} ({home_rate:.1}) v {away_team} ({away_rate:.1})"
        );
    }
    Ok(scoregrid)
}

/// Head-to-head probabilities aggregated from a scoreline grid.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeProbs {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}
impl OutcomeProbs {
    pub fn total(&self) -> f64 {
        self.home_win + self.draw + self.away_win
    }
}

/// Sums the strict lower triangle (home in front), the diagonal (scores
/// level) and the strict upper triangle (away in front). The three components
/// account for the entire grid.
pub fn aggregate(scoregrid: &Matrix) -> OutcomeProbs {
    let (mut home_win, mut draw, mut away_win) = (0.0, 0.0, 0.0);
    for row in 0..scoregrid.rows() {
        let row_slice = scoregrid.row_slice(row);
        for (col, &prob) in row_slice.iter().enumerate() {
            match col.cmp(&row) {
                std::cmp::Ordering::Less => home_win += prob,
                std::cmp::Ordering::Equal => draw += prob,
                std::cmp::Ordering::Greater => away_win += prob,
            }
        }
    }
    OutcomeProbs {
        home_win,
        draw,
        away_win,
    }
}

/// Expected home and away scores implied by the grid.
pub fn home_away_expectations(scoregrid: &Matrix) -> (f64, f64) {
    let (mut home_expectation, mut away_expectation) = (0.0, 0.0);
    for home_score in 0..scoregrid.rows() {
        for away_score in 0..scoregrid.cols() {
            let prob = scoregrid[(home_score, away_score)];
            home_expectation += home_score as f64 * prob;
            away_expectation += away_score as f64 * prob;
        }
    }
    (home_expectation, away_expectation)
}

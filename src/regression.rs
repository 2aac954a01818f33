//! Poisson regression of team scoring rates. The expected score of a side is
//! modelled as `exp(β0 + β_home·home + β_team[team] + β_opp[opponent])`: a
//! global baseline, a fixed home-ground adjustment, a per-team attacking
//! strength and a per-opponent defensive strength (lower ⇒ stronger defence).
//! Fitting maximises the Poisson likelihood by iteratively reweighted least
//! squares, each weighted solve running through `nalgebra`.

use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};
use rustc_hash::FxHashMap;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};
use thiserror::Error;
use tracing::debug;

/// One team-perspective row of the long-format history table: two of these
/// are derived per match.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub team: String,
    pub opponent: String,
    pub home: bool,
    pub score: u16,
}

#[derive(Clone, Debug)]
pub struct FitConfig {
    pub max_iterations: u64,
    pub tolerance: f64,
}
impl FitConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_iterations == 0 {
            anyhow::bail!("at least one iteration must be allowed");
        }
        if self.tolerance <= 0.0 {
            anyhow::bail!("tolerance must be positive");
        }
        Ok(())
    }
}
impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-8,
        }
    }
}

#[derive(Debug, Error)]
pub enum FitError {
    #[error("no observations to fit")]
    NoObservations,

    #[error("at least two distinct teams are required, found {0}")]
    InsufficientTeams(usize),

    #[error("weighted least-squares system is singular")]
    Singular,

    #[error("fit did not converge within {0} iterations")]
    NotConverged(u64),
}

#[derive(Debug, Error)]
#[error("team '{0}' was not present in the training data")]
pub struct UnknownTeamError(pub String);

/// Ridge applied when the normal matrix is not positive-definite. A two-team
/// league aliases one attack effect with one defence effect; the ridge pins
/// the solution without disturbing the fitted means.
const RIDGE: f64 = 1e-8;

/// Bound on the linear predictor, keeping `exp` finite while the solver is
/// still far from the optimum.
const ETA_BOUND: f64 = 30.0;

/// A fitted scoring-rate model. Immutable once fitted; [`RateModel::predict`]
/// is a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct RateModel {
    teams: Vec<String>,
    team_index: FxHashMap<String, usize>,
    intercept: f64,
    home: f64,
    attack: Vec<f64>,
    defence: Vec<f64>,
}
impl RateModel {
    /// Expected score for `team` against `opponent`, with `home` flagging
    /// whether `team` has home-ground advantage. Always nonnegative. Both
    /// sides must have been present during fitting.
    pub fn predict(&self, team: &str, opponent: &str, home: bool) -> Result<f64, UnknownTeamError> {
        let team = self.index_of(team)?;
        let opponent = self.index_of(opponent)?;
        let eta = self.intercept
            + if home { self.home } else { 0.0 }
            + self.attack[team]
            + self.defence[opponent];
        Ok(eta.exp())
    }

    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// The fitted home-ground coefficient (log scale; `exp` of it is the
    /// multiplicative home advantage).
    pub fn home_coefficient(&self) -> f64 {
        self.home
    }

    fn index_of(&self, team: &str) -> Result<usize, UnknownTeamError> {
        self.team_index
            .get(team)
            .copied()
            .ok_or_else(|| UnknownTeamError(team.into()))
    }

    pub fn tabulate(&self) -> Table {
        let mut table = Table::default()
            .with_cols(vec![
                Col::new(Styles::default().with(MinWidth(14)).with(HAlign::Left)),
                Col::new(Styles::default().with(MinWidth(9)).with(HAlign::Right)),
                Col::new(Styles::default().with(MinWidth(9)).with(HAlign::Right)),
            ])
            .with_row(Row::new(
                Styles::default().with(Header(true)),
                vec!["Team".into(), "Attack".into(), "Defence".into()],
            ));
        for (index, team) in self.teams.iter().enumerate() {
            table.push_row(Row::new(
                Styles::default(),
                vec![
                    team.clone().into(),
                    format!("{:+.4}", self.attack[index]).into(),
                    format!("{:+.4}", self.defence[index]).into(),
                ],
            ));
        }
        table
    }

    #[cfg(test)]
    pub(crate) fn synthetic(
        teams: Vec<String>,
        intercept: f64,
        home: f64,
        attack: Vec<f64>,
        defence: Vec<f64>,
    ) -> Self {
        let team_index = teams
            .iter()
            .enumerate()
            .map(|(index, team)| (team.clone(), index))
            .collect();
        Self {
            teams,
            team_index,
            intercept,
            home,
            attack,
            defence,
        }
    }
}

pub fn fit(observations: &[Observation]) -> Result<RateModel, FitError> {
    fit_with(observations, &FitConfig::default())
}

pub fn fit_with(observations: &[Observation], config: &FitConfig) -> Result<RateModel, FitError> {
    config.validate().unwrap();
    if observations.is_empty() {
        return Err(FitError::NoObservations);
    }

    let teams = {
        let mut teams = BTreeSet::new();
        for observation in observations {
            teams.insert(observation.team.clone());
            teams.insert(observation.opponent.clone());
        }
        teams.into_iter().collect::<Vec<_>>()
    };
    let num_teams = teams.len();
    if num_teams < 2 {
        return Err(FitError::InsufficientTeams(num_teams));
    }
    let team_index = teams
        .iter()
        .enumerate()
        .map(|(index, team)| (team.clone(), index))
        .collect::<FxHashMap<_, _>>();

    // treatment coding: the lexicographically first team anchors both dummy
    // groups, so columns are [intercept, home, attack 1..n, defence 1..n]
    let num_coefficients = 2 * num_teams;
    let num_rows = observations.len();
    let mut design = DMatrix::zeros(num_rows, num_coefficients);
    let mut response = DVector::zeros(num_rows);
    for (row, observation) in observations.iter().enumerate() {
        let team = team_index[&observation.team];
        let opponent = team_index[&observation.opponent];
        design[(row, 0)] = 1.0;
        if observation.home {
            design[(row, 1)] = 1.0;
        }
        if team > 0 {
            design[(row, 1 + team)] = 1.0;
        }
        if opponent > 0 {
            design[(row, num_teams + opponent)] = 1.0;
        }
        response[row] = observation.score as f64;
    }

    let mut coefficients = DVector::zeros(num_coefficients);
    coefficients[0] = response.mean().max(1e-6).ln();

    let mut deviance = f64::INFINITY;
    for iteration in 1..=config.max_iterations {
        let mut eta = &design * &coefficients;
        for value in eta.iter_mut() {
            *value = value.clamp(-ETA_BOUND, ETA_BOUND);
        }
        let mu = eta.map(f64::exp);

        let current = poisson_deviance(&response, &mu);
        debug!("iteration {iteration}: deviance {current:.9}");
        if (deviance - current).abs() <= config.tolerance * (current.abs() + 0.1) {
            return Ok(assemble(teams, team_index, &coefficients, num_teams));
        }
        deviance = current;

        // one reweighted least-squares step: response is linearised around η
        // and rows are weighted by the conditional variance μ
        let mut weighted_design = design.clone();
        for row in 0..num_rows {
            let mut design_row = weighted_design.row_mut(row);
            design_row *= mu[row];
        }
        let working =
            DVector::from_fn(num_rows, |row, _| eta[row] + (response[row] - mu[row]) / mu[row]);
        let normal = design.transpose() * &weighted_design;
        let moment = weighted_design.transpose() * &working;
        coefficients = solve_weighted(normal, moment)?;
    }
    Err(FitError::NotConverged(config.max_iterations))
}

fn solve_weighted(
    normal: DMatrix<f64>,
    moment: DVector<f64>,
) -> Result<DVector<f64>, FitError> {
    if let Some(cholesky) = normal.clone().cholesky() {
        return Ok(cholesky.solve(&moment));
    }
    let order = normal.nrows();
    let regularised = normal + DMatrix::identity(order, order) * RIDGE;
    regularised.lu().solve(&moment).ok_or(FitError::Singular)
}

fn poisson_deviance(response: &DVector<f64>, mu: &DVector<f64>) -> f64 {
    let mut deviance = 0.0;
    for (row, &observed) in response.iter().enumerate() {
        let fitted = mu[row];
        deviance += if observed > 0.0 {
            observed * (observed / fitted).ln() - (observed - fitted)
        } else {
            fitted
        };
    }
    2.0 * deviance
}

fn assemble(
    teams: Vec<String>,
    team_index: FxHashMap<String, usize>,
    coefficients: &DVector<f64>,
    num_teams: usize,
) -> RateModel {
    let mut attack = vec![0.0; num_teams];
    let mut defence = vec![0.0; num_teams];
    for team in 1..num_teams {
        attack[team] = coefficients[1 + team];
        defence[team] = coefficients[num_teams + team];
    }
    RateModel {
        teams,
        team_index,
        intercept: coefficients[0],
        home: coefficients[1],
        attack,
        defence,
    }
}

#[cfg(test)]
mod tests;

//! Loading, validation and reshaping of historical results and fixture lists.

use std::io;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::debug;

use crate::csv::CsvReader;
use crate::regression::Observation;

/// Long-form franchise names as they appear in historical spreadsheets, mapped
/// to the short form used by fixture lists. One canonical spelling per team;
/// no fuzzy matching.
const CANONICAL_NAMES: &[(&str, &str)] = &[
    ("Adelaide Crows", "Adelaide"),
    ("Brisbane Lions", "Brisbane"),
    ("Sydney Swans", "Sydney"),
    ("Geelong Cats", "Geelong"),
    ("West Coast Eagles", "West Coast"),
    ("Gold Coast Suns", "Gold Coast"),
];

/// Placeholder used by fixture lists for undetermined finals participants.
const UNDETERMINED_TEAM: &str = "To be announced";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

#[derive(Debug, Error)]
pub enum DataError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("missing column '{0}' in header")]
    MissingColumn(&'static str),

    #[error("row {row}: missing field '{field}'")]
    MissingField { row: usize, field: &'static str },

    #[error("row {row}: invalid {field} '{value}'")]
    InvalidField {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("no data rows found")]
    Empty,
}

/// One completed match, the source of truth for fitting. Immutable once
/// loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalMatch {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u16,
    pub away_score: u16,
    pub playoff: bool,
}

/// One upcoming match to be tipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub round: String,
    pub home_team: String,
    pub away_team: String,
}

pub fn read_history(path: impl AsRef<Path>) -> Result<Vec<HistoricalMatch>, DataError> {
    let rows = read_rows(path)?;
    parse_history_rows(&rows)
}

pub fn read_fixtures(path: impl AsRef<Path>) -> Result<Vec<Fixture>, DataError> {
    let rows = read_rows(path)?;
    parse_fixture_rows(&rows)
}

fn read_rows(path: impl AsRef<Path>) -> Result<Vec<Vec<String>>, DataError> {
    let mut rows = vec![];
    for row in CsvReader::open(path)? {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn parse_history_rows(rows: &[Vec<String>]) -> Result<Vec<HistoricalMatch>, DataError> {
    let (header, body) = rows.split_first().ok_or(DataError::Empty)?;
    let date_col = locate(header, "Date")?;
    let home_team_col = locate(header, "Home Team")?;
    let away_team_col = locate(header, "Away Team")?;
    let home_score_col = locate(header, "Home Score")?;
    let away_score_col = locate(header, "Away Score")?;
    let playoff_col = locate(header, "Play Off Game?")?;

    let mut history = Vec::with_capacity(body.len());
    for (index, fields) in body.iter().enumerate() {
        let row = index + 2;
        history.push(HistoricalMatch {
            date: parse_date(fields, date_col, "Date", row)?,
            home_team: canonical_name(field(fields, home_team_col, "Home Team", row)?).into(),
            away_team: canonical_name(field(fields, away_team_col, "Away Team", row)?).into(),
            home_score: parse_score(fields, home_score_col, "Home Score", row)?,
            away_score: parse_score(fields, away_score_col, "Away Score", row)?,
            playoff: field(fields, playoff_col, "Play Off Game?", row)?.trim() == "Y",
        });
    }
    if history.is_empty() {
        return Err(DataError::Empty);
    }
    Ok(history)
}

pub fn parse_fixture_rows(rows: &[Vec<String>]) -> Result<Vec<Fixture>, DataError> {
    let (header, body) = rows.split_first().ok_or(DataError::Empty)?;
    let round_col = locate(header, "Round Number")?;
    let home_team_col = locate(header, "Home Team")?;
    let away_team_col = locate(header, "Away Team")?;

    let mut fixtures = Vec::with_capacity(body.len());
    for (index, fields) in body.iter().enumerate() {
        let row = index + 2;
        let home_team = field(fields, home_team_col, "Home Team", row)?;
        let away_team = field(fields, away_team_col, "Away Team", row)?;
        if home_team == UNDETERMINED_TEAM || away_team == UNDETERMINED_TEAM {
            debug!("dropping undetermined fixture at row {row}");
            continue;
        }
        fixtures.push(Fixture {
            round: field(fields, round_col, "Round Number", row)?.into(),
            home_team: canonical_name(home_team).into(),
            away_team: canonical_name(away_team).into(),
        });
    }
    Ok(fixtures)
}

fn locate(header: &[String], name: &'static str) -> Result<usize, DataError> {
    header
        .iter()
        .position(|column| column.trim() == name)
        .ok_or(DataError::MissingColumn(name))
}

fn field<'a>(
    fields: &'a [String],
    col: usize,
    name: &'static str,
    row: usize,
) -> Result<&'a str, DataError> {
    match fields.get(col).map(|value| value.trim()) {
        None | Some("") => Err(DataError::MissingField { row, field: name }),
        Some(value) => Ok(value),
    }
}

fn parse_score(
    fields: &[String],
    col: usize,
    name: &'static str,
    row: usize,
) -> Result<u16, DataError> {
    let value = field(fields, col, name, row)?;
    value.parse().map_err(|_| DataError::InvalidField {
        row,
        field: name,
        value: value.into(),
    })
}

fn parse_date(
    fields: &[String],
    col: usize,
    name: &'static str,
    row: usize,
) -> Result<NaiveDate, DataError> {
    let value = field(fields, col, name, row)?;
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    Err(DataError::InvalidField {
        row,
        field: name,
        value: value.into(),
    })
}

pub fn canonical_name(name: &str) -> &str {
    CANONICAL_NAMES
        .iter()
        .find(|(long, _)| *long == name)
        .map(|(_, short)| *short)
        .unwrap_or(name)
}

/// Drops matches older than the cutoff year and, unless requested, playoff
/// matches (their pairings are not representative of regular rounds).
pub fn filter_history(
    history: Vec<HistoricalMatch>,
    cutoff_year: i32,
    include_playoffs: bool,
) -> Vec<HistoricalMatch> {
    history
        .into_iter()
        .filter(|game| game.date.year() >= cutoff_year)
        .filter(|game| include_playoffs || !game.playoff)
        .collect()
}

/// Reshapes paired results into the long-format table consumed by the rate
/// estimator: each match contributes a team-as-home and a team-as-away row.
pub fn reshape(history: &[HistoricalMatch]) -> Vec<Observation> {
    let mut observations = Vec::with_capacity(history.len() * 2);
    for game in history {
        observations.push(Observation {
            team: game.home_team.clone(),
            opponent: game.away_team.clone(),
            home: true,
            score: game.home_score,
        });
        observations.push(Observation {
            team: game.away_team.clone(),
            opponent: game.home_team.clone(),
            home: false,
            score: game.away_score,
        });
    }
    observations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&str]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|line| line.split(',').map(ToString::to_string).collect())
            .collect()
    }

    fn sample_history_rows() -> Vec<Vec<String>> {
        rows(&[
            "Date,Home Team,Away Team,Home Score,Away Score,Play Off Game?",
            "2016-04-02,Adelaide Crows,Port Adelaide,108,89,N",
            "2017-09-23,Richmond,Geelong Cats,95,44,Y",
            "2015-05-16,Sydney Swans,Carlton,118,47,N",
        ])
    }

    #[test]
    fn parses_and_canonicalises_history() {
        let history = parse_history_rows(&sample_history_rows()).unwrap();
        assert_eq!(3, history.len());
        assert_eq!("Adelaide", history[0].home_team);
        assert_eq!("Port Adelaide", history[0].away_team);
        assert_eq!(108, history[0].home_score);
        assert!(!history[0].playoff);
        assert_eq!("Geelong", history[1].away_team);
        assert!(history[1].playoff);
        assert_eq!("Sydney", history[2].home_team);
    }

    #[test]
    fn rejects_non_numeric_score() {
        let rows = rows(&[
            "Date,Home Team,Away Team,Home Score,Away Score,Play Off Game?",
            "2016-04-02,Adelaide,Port Adelaide,abc,89,N",
        ]);
        match parse_history_rows(&rows) {
            Err(DataError::InvalidField { row: 2, field: "Home Score", value }) => {
                assert_eq!("abc", value);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_score() {
        let rows = rows(&[
            "Date,Home Team,Away Team,Home Score,Away Score,Play Off Game?",
            "2016-04-02,Adelaide,Port Adelaide,,89,N",
        ]);
        assert!(matches!(
            parse_history_rows(&rows),
            Err(DataError::MissingField { row: 2, field: "Home Score" })
        ));
    }

    #[test]
    fn rejects_missing_column() {
        let rows = rows(&["Date,Home Team,Away Team,Home Score,Away Score", ""]);
        assert!(matches!(
            parse_history_rows(&rows),
            Err(DataError::MissingColumn("Play Off Game?"))
        ));
    }

    #[test]
    fn parses_slash_dates() {
        let rows = rows(&[
            "Date,Home Team,Away Team,Home Score,Away Score,Play Off Game?",
            "02/04/2016,Adelaide,Port Adelaide,108,89,N",
        ]);
        let history = parse_history_rows(&rows).unwrap();
        assert_eq!(NaiveDate::from_ymd_opt(2016, 4, 2).unwrap(), history[0].date);
    }

    #[test]
    fn parses_fixtures_and_drops_undetermined() {
        let rows = rows(&[
            "Round Number,Date,Location,Home Team,Away Team",
            "1,22/03/2019,MCG,Carlton,Richmond",
            "2,28/03/2019,GMHBA,Geelong Cats,Melbourne",
            "Finals,TBC,TBC,To be announced,To be announced",
        ]);
        let fixtures = parse_fixture_rows(&rows).unwrap();
        assert_eq!(2, fixtures.len());
        assert_eq!("1", fixtures[0].round);
        assert_eq!("Geelong", fixtures[1].home_team);
    }

    #[test]
    fn filters_by_cutoff_and_playoff() {
        let history = parse_history_rows(&sample_history_rows()).unwrap();
        let filtered = filter_history(history.clone(), 2016, false);
        assert_eq!(1, filtered.len());
        assert_eq!("Adelaide", filtered[0].home_team);

        let with_playoffs = filter_history(history, 2016, true);
        assert_eq!(2, with_playoffs.len());
    }

    #[test]
    fn reshapes_both_perspectives() {
        let history = parse_history_rows(&sample_history_rows()).unwrap();
        let observations = reshape(&history);
        assert_eq!(6, observations.len());
        assert_eq!(
            Observation {
                team: "Adelaide".into(),
                opponent: "Port Adelaide".into(),
                home: true,
                score: 108,
            },
            observations[0]
        );
        assert_eq!(
            Observation {
                team: "Port Adelaide".into(),
                opponent: "Adelaide".into(),
                home: false,
                score: 89,
            },
            observations[1]
        );
    }
}

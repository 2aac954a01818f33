use super::*;
use assert_float_eq::*;

fn observation(team: &str, opponent: &str, home: bool, score: u16) -> Observation {
    Observation {
        team: team.into(),
        opponent: opponent.into(),
        home,
        score,
    }
}

fn lopsided_pair() -> Vec<Observation> {
    // A flogs B by the same margin in every match, half of them at home
    let mut observations = vec![];
    for index in 0..10 {
        let a_home = index % 2 == 0;
        observations.push(observation("A", "B", a_home, 100));
        observations.push(observation("B", "A", !a_home, 50));
    }
    observations
}

#[test]
fn dominant_team_outscores_opponent() {
    let model = fit(&lopsided_pair()).unwrap();
    let a_rate = model.predict("A", "B", true).unwrap();
    let b_rate = model.predict("B", "A", true).unwrap();
    assert!(
        a_rate > b_rate,
        "expected A ({a_rate:.2}) to outscore B ({b_rate:.2})"
    );
    assert_float_relative_eq!(100.0, model.predict("A", "B", true).unwrap(), 0.01);
    assert_float_relative_eq!(50.0, model.predict("B", "A", false).unwrap(), 0.01);
}

#[test]
fn uniform_league_recovers_the_mean() {
    let mut observations = vec![];
    for (team, opponent) in [("A", "B"), ("B", "C"), ("C", "A")] {
        observations.push(observation(team, opponent, true, 7));
        observations.push(observation(opponent, team, false, 7));
    }
    let model = fit(&observations).unwrap();
    for team in ["A", "B", "C"] {
        for opponent in ["A", "B", "C"] {
            if team != opponent {
                assert_float_relative_eq!(
                    7.0,
                    model.predict(team, opponent, false).unwrap(),
                    1e-3
                );
            }
        }
    }
}

#[test]
fn recovers_home_advantage() {
    // double round robin with every home side scoring twice the away side
    let mut observations = vec![];
    for (home_team, away_team) in [
        ("A", "B"),
        ("B", "A"),
        ("A", "C"),
        ("C", "A"),
        ("B", "C"),
        ("C", "B"),
    ] {
        observations.push(observation(home_team, away_team, true, 80));
        observations.push(observation(away_team, home_team, false, 40));
    }
    let model = fit(&observations).unwrap();
    assert_float_absolute_eq!(2.0f64.ln(), model.home_coefficient(), 0.01);
    assert_float_relative_eq!(80.0, model.predict("B", "C", true).unwrap(), 0.01);
    assert_float_relative_eq!(40.0, model.predict("B", "C", false).unwrap(), 0.01);
}

#[test]
fn predicts_for_team_with_no_home_games() {
    // C only ever plays away; the home effect is global, so predicting C at
    // home must still resolve
    let observations = vec![
        observation("A", "B", true, 90),
        observation("B", "A", false, 70),
        observation("A", "C", true, 95),
        observation("C", "A", false, 60),
        observation("B", "C", true, 85),
        observation("C", "B", false, 65),
    ];
    let model = fit(&observations).unwrap();
    let rate = model.predict("C", "A", true).unwrap();
    assert!(rate > 0.0, "expected a positive rate, got {rate}");
}

#[test]
fn unknown_team_is_a_hard_failure() {
    let model = fit(&lopsided_pair()).unwrap();
    let err = model.predict("Zzyzx", "A", true).unwrap_err();
    assert_eq!(
        "team 'Zzyzx' was not present in the training data",
        err.to_string()
    );
    assert!(model.predict("A", "Zzyzx", false).is_err());
}

#[test]
fn empty_input_cannot_be_fitted() {
    assert!(matches!(fit(&[]), Err(FitError::NoObservations)));
}

#[test]
fn single_team_cannot_be_fitted() {
    let observations = vec![observation("A", "A", true, 50)];
    assert!(matches!(
        fit(&observations),
        Err(FitError::InsufficientTeams(1))
    ));
}

#[test]
fn fitting_is_deterministic() {
    let observations = lopsided_pair();
    let first = fit(&observations).unwrap();
    let second = fit(&observations).unwrap();
    assert_eq!(
        first.predict("A", "B", true).unwrap(),
        second.predict("A", "B", true).unwrap()
    );
}

#[test]
fn teams_are_sorted() {
    let observations = vec![
        observation("Richmond", "Carlton", true, 80),
        observation("Carlton", "Richmond", false, 60),
    ];
    let model = fit(&observations).unwrap();
    assert_eq!(&["Carlton", "Richmond"], model.teams());
}

#[test]
fn tabulate_lists_every_team() {
    let model = fit(&lopsided_pair()).unwrap();
    let table = model.tabulate();
    assert_eq!(3, table.num_rows()); // header + two teams
}

#[test]
fn invalid_config_is_rejected() {
    let config = FitConfig {
        max_iterations: 0,
        tolerance: 1e-8,
    };
    assert!(config.validate().is_err());
}

//! Rendering of predictions and score histograms as tables, with sinks for
//! the console and a Markdown report file.

use std::fs;
use std::path::PathBuf;

use stanza::renderer::console::Console;
use stanza::renderer::markdown::Markdown;
use stanza::renderer::Renderer;
use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};
use tracing::info;

use crate::forecast::{MatchPrediction, ScoreHistogram};

pub fn tabulate_predictions(predictions: &[MatchPrediction]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(6)).with(Left)),
            Col::new(Styles::default().with(MinWidth(14)).with(Left)),
            Col::new(Styles::default().with(MinWidth(14)).with(Left)),
            Col::new(Styles::default().with(MinWidth(14)).with(Left)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Round".into(),
                "Home".into(),
                "Away".into(),
                "Tip".into(),
                "H pts".into(),
                "A pts".into(),
                "H win".into(),
                "Draw".into(),
                "A win".into(),
            ],
        ));
    for prediction in predictions {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                prediction.round.clone().into(),
                prediction.home_team.clone().into(),
                prediction.away_team.clone().into(),
                prediction.predicted_winner.clone().into(),
                format!("{:.1}", prediction.home_expected).into(),
                format!("{:.1}", prediction.away_expected).into(),
                format!("{:.2}%", prediction.home_win_prob * 100.0).into(),
                format!("{:.2}%", prediction.draw_prob * 100.0).into(),
                format!("{:.2}%", prediction.away_win_prob * 100.0).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_histogram(histogram: &ScoreHistogram) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(9)).with(Left)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Scores".into(),
                "H obs".into(),
                "H fit".into(),
                "A obs".into(),
                "A fit".into(),
            ],
        ));
    for bucket in &histogram.buckets {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}-{}", bucket.lower, bucket.upper - 1).into(),
                format!("{:.2}%", bucket.home_observed * 100.0).into(),
                format!("{:.2}%", bucket.home_poisson * 100.0).into(),
                format!("{:.2}%", bucket.away_observed * 100.0).into(),
                format!("{:.2}%", bucket.away_poisson * 100.0).into(),
            ],
        ));
    }
    table
}

/// A destination for the rendered report. Sinks receive fully aggregated
/// predictions and histograms; rendering never mutates them.
pub trait ReportSink {
    fn accept_predictions(&mut self, predictions: &[MatchPrediction]) -> anyhow::Result<()>;
    fn accept_histogram(&mut self, histogram: &ScoreHistogram) -> anyhow::Result<()>;
}

/// Renders straight to the log at `INFO`.
#[derive(Default)]
pub struct ConsoleSink {
    renderer: Console,
}
impl ReportSink for ConsoleSink {
    fn accept_predictions(&mut self, predictions: &[MatchPrediction]) -> anyhow::Result<()> {
        info!("\n{}", self.renderer.render(&tabulate_predictions(predictions)));
        Ok(())
    }

    fn accept_histogram(&mut self, histogram: &ScoreHistogram) -> anyhow::Result<()> {
        info!("\n{}", self.renderer.render(&tabulate_histogram(histogram)));
        Ok(())
    }
}

/// Accumulates a Markdown document in memory; nothing touches the filesystem
/// until [`MarkdownSink::flush`].
pub struct MarkdownSink {
    path: PathBuf,
    buffer: String,
    renderer: Markdown,
}
impl MarkdownSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            buffer: String::new(),
            renderer: Markdown::default(),
        }
    }

    pub fn flush(self) -> anyhow::Result<()> {
        fs::write(&self.path, &self.buffer)?;
        Ok(())
    }
}
impl ReportSink for MarkdownSink {
    fn accept_predictions(&mut self, predictions: &[MatchPrediction]) -> anyhow::Result<()> {
        self.buffer.push_str("# Tips\n\n");
        self.buffer
            .push_str(&self.renderer.render(&tabulate_predictions(predictions)).to_string());
        self.buffer.push_str("\n\n");
        Ok(())
    }

    fn accept_histogram(&mut self, histogram: &ScoreHistogram) -> anyhow::Result<()> {
        self.buffer.push_str("# Score distribution\n\n");
        self.buffer
            .push_str(&self.renderer.render(&tabulate_histogram(histogram)).to_string());
        self.buffer.push('\n');
        Ok(())
    }
}

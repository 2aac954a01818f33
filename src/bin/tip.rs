use std::env;
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use galah::forecast::{self, ScoreHistogram, TipConfig};
use galah::print::{ConsoleSink, MarkdownSink, ReportSink};
use galah::timed::Timed;
use galah::{data, file, regression};

const HISTOGRAM_BUCKET_WIDTH: usize = 10;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// file to source historical results from
    #[clap(long)]
    history: PathBuf,

    /// file to source the upcoming fixture list from
    #[clap(long)]
    fixtures: PathBuf,

    /// Markdown report to write
    #[clap(short = 'o', long)]
    output: PathBuf,

    /// also dump predictions as JSON
    #[clap(long)]
    json: Option<PathBuf>,

    /// discard matches played before this year
    #[clap(long, default_value_t = 2016)]
    cutoff_year: i32,

    /// per-side score bound for the simulated grids
    #[clap(long, default_value_t = 200)]
    max_score: usize,

    /// include playoff matches when fitting
    #[clap(long)]
    playoffs: bool,
}
impl Args {
    fn config(&self) -> TipConfig {
        TipConfig {
            cutoff_year: self.cutoff_year,
            max_score: self.max_score,
            include_playoffs: self.playoffs,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.config().validate()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");
    let config = args.config();

    let history = data::read_history(&args.history)?;
    info!("sourced {} historical matches", history.len());
    let history = data::filter_history(history, config.cutoff_year, config.include_playoffs);
    info!(
        "{} matches retained from {} onward",
        history.len(),
        config.cutoff_year
    );

    let observations = data::reshape(&history);
    let model = Timed::result(|| regression::fit(&observations))?;
    info!(
        "fitted {} teams from {} observations in {:?}",
        model.value.teams().len(),
        observations.len(),
        model.elapsed
    );
    let model = model.value;
    info!(
        "baseline score {:.1}, home multiplier {:.3}",
        model.intercept().exp(),
        model.home_coefficient().exp()
    );
    debug!(
        "coefficients:\n{}",
        Console::default().render(&model.tabulate())
    );

    let fixtures = data::read_fixtures(&args.fixtures)?;
    info!("sourced {} fixtures", fixtures.len());
    let predictions = forecast::tip_fixtures(&model, &fixtures, config.max_score);
    let histogram = ScoreHistogram::build(&history, HISTOGRAM_BUCKET_WIDTH, config.max_score);

    let mut console = ConsoleSink::default();
    console.accept_predictions(&predictions)?;
    console.accept_histogram(&histogram)?;

    let mut markdown = MarkdownSink::new(args.output.clone());
    markdown.accept_predictions(&predictions)?;
    markdown.accept_histogram(&histogram)?;
    markdown.flush()?;
    info!("report written to {}", args.output.display());

    if let Some(json) = &args.json {
        file::write_json(json, &predictions)?;
        info!("predictions dumped to {}", json.display());
    }
    Ok(())
}

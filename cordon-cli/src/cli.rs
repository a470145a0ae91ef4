//! Command-line interface for the cordon containment game.
//!
//! Exposes the game pipeline as four subcommands operating over JSON:
//! `new-game` emits a fresh playing field, `simulate` resolves a round of
//! firewall picks, `predict` asks the classifier for the most critical
//! nodes, and `score` recomputes a score from its inputs alone.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use thiserror::Error;

use cordon_core::{
    EngineBuilder, EngineError, GeneratorConfig, Graph, NodeId, NodeStatus, Prediction,
    RoundOutcome, Score, ScoreWeights, WireGame, WireGraph, score_round,
};
use cordon_model::ModelState;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "cordon", about = "Play the infection containment game.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Generate a new game and emit it as node-link JSON.
    NewGame(NewGameArgs),
    /// Resolve a round: propagate the infection and score the picks.
    Simulate(SimulateArgs),
    /// Rank the most critical nodes using the trained classifier.
    Predict(PredictArgs),
    /// Recompute a score from a round's inputs.
    Score(ScoreArgs),
}

/// Options accepted by the `new-game` command.
#[derive(Debug, Args, Clone)]
pub struct NewGameArgs {
    /// Smallest admissible node count.
    #[arg(long, default_value_t = 18)]
    pub nodes_min: usize,

    /// Largest admissible node count.
    #[arg(long, default_value_t = 28)]
    pub nodes_max: usize,

    /// Independent probability of each candidate edge.
    #[arg(long, default_value_t = 0.15)]
    pub edge_probability: f64,

    /// Minimum hop distance between source and target.
    #[arg(long, default_value_t = 2)]
    pub min_separation: u32,

    /// Attempts before generation gives up.
    #[arg(long, default_value_t = 32)]
    pub retry_budget: usize,

    /// Seed for reproducible generation; omitted means entropy-seeded.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Options accepted by the `simulate` command.
#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Path to a game JSON file as produced by `new-game`.
    #[arg(long)]
    pub game: PathBuf,

    /// Nodes to firewall, as comma-separated ids.
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub picks: Vec<u32>,

    /// Classifier artifact used to compute the overlap bonus.
    #[arg(long, requires = "columns")]
    pub model: Option<PathBuf>,

    /// Feature-column manifest accompanying the artifact.
    #[arg(long, requires = "model")]
    pub columns: Option<PathBuf>,
}

/// Options accepted by the `predict` command.
#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Path to a game JSON file as produced by `new-game`.
    #[arg(long)]
    pub game: PathBuf,

    /// Classifier artifact to load.
    #[arg(long)]
    pub model: PathBuf,

    /// Feature-column manifest accompanying the artifact.
    #[arg(long)]
    pub columns: PathBuf,
}

/// Options accepted by the `score` command.
#[derive(Debug, Args, Clone)]
pub struct ScoreArgs {
    /// Whether the target survived the round.
    #[arg(long, value_enum)]
    pub target_status: TargetStatusArg,

    /// The player's firewall picks, as comma-separated ids.
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub picks: Vec<u32>,

    /// The model's suggestions, for the overlap bonus.
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub model_picks: Option<Vec<u32>>,
}

/// Target outcomes accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TargetStatusArg {
    /// The target was never infected.
    Safe,
    /// The infection reached the target.
    Infected,
}

impl From<TargetStatusArg> for NodeStatus {
    fn from(value: TargetStatusArg) -> Self {
        match value {
            TargetStatusArg::Safe => Self::Safe,
            TargetStatusArg::Infected => Self::Infected,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while loading an input.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An input file held JSON of the wrong shape.
    #[error("failed to parse `{path}`: {source}")]
    Payload {
        /// Path whose contents were rejected.
        path: PathBuf,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
    /// The classifier could not be loaded.
    #[error("classifier is not available: {reason}")]
    ModelUnavailable {
        /// Why loading settled as unavailable.
        reason: String,
    },
    /// Engine execution failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl CliError {
    /// Returns the stable, machine-readable error code for logging.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CLI_IO",
            Self::Payload { .. } => "CLI_PAYLOAD",
            Self::ModelUnavailable { .. } => "CLI_MODEL_UNAVAILABLE",
            Self::Engine(error) => error.code(),
        }
    }
}

/// The JSON payload a command resolved to.
#[derive(Debug, Clone)]
pub enum Report {
    /// A freshly generated game.
    Game(WireGame),
    /// A resolved round: per-node statuses plus the score breakdown.
    Round(RoundOutcome),
    /// Ranked critical-node suggestions.
    Predictions(Vec<Prediction>),
    /// A recomputed score.
    Score(Score),
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when an input cannot be loaded or execution fails.
pub fn run_cli(cli: Cli) -> Result<Report, CliError> {
    match cli.command {
        Command::NewGame(args) => run_new_game(&args),
        Command::Simulate(args) => run_simulate(args),
        Command::Predict(args) => run_predict(&args),
        Command::Score(args) => Ok(run_score(&args)),
    }
}

fn run_new_game(args: &NewGameArgs) -> Result<Report, CliError> {
    let config = GeneratorConfig::new()
        .with_node_range(args.nodes_min, args.nodes_max)
        .with_edge_probability(args.edge_probability)
        .with_min_separation(args.min_separation)
        .with_retry_budget(args.retry_budget);
    let engine = EngineBuilder::new().with_generator(config).build()?;
    let game = match args.seed {
        Some(seed) => engine.new_game_with_rng(&mut SmallRng::seed_from_u64(seed))?,
        None => engine.new_game()?,
    };
    Ok(Report::Game(WireGame {
        graph: WireGraph::encode(game.graph()),
        source: game.source().get(),
        target: game.target().get(),
    }))
}

fn run_simulate(args: SimulateArgs) -> Result<Report, CliError> {
    let (graph, source, target) = load_game(&args.game)?;
    let user_picks = to_pick_set(&args.picks);

    let outcome = if let (Some(model), Some(columns)) = (&args.model, &args.columns) {
        let loaded = load_model(model, columns)?;
        let engine = EngineBuilder::new()
            .with_scorer(loaded.classifier(), loaded.columns().to_vec())
            .build()?;
        let suggested: BTreeSet<NodeId> = engine
            .predict(&graph, source, target)?
            .iter()
            .map(Prediction::node)
            .collect();
        engine.resolve_round(&graph, source, target, &user_picks, Some(&suggested))?
    } else {
        let engine = EngineBuilder::new().build()?;
        engine.resolve_round(&graph, source, target, &user_picks, None)?
    };
    Ok(Report::Round(outcome))
}

fn run_predict(args: &PredictArgs) -> Result<Report, CliError> {
    let (graph, source, target) = load_game(&args.game)?;
    let loaded = load_model(&args.model, &args.columns)?;
    let engine = EngineBuilder::new()
        .with_scorer(loaded.classifier(), loaded.columns().to_vec())
        .build()?;
    Ok(Report::Predictions(engine.predict(&graph, source, target)?))
}

fn run_score(args: &ScoreArgs) -> Report {
    let user_picks = to_pick_set(&args.picks);
    let model_picks = args.model_picks.as_deref().map(to_pick_set);
    Report::Score(score_round(
        &ScoreWeights::new(),
        args.target_status.into(),
        &user_picks,
        model_picks.as_ref(),
    ))
}

fn load_game(path: &Path) -> Result<(Graph, NodeId, NodeId), CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let wire = WireGame::from_json(&raw).map_err(|source| CliError::Payload {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = wire.graph.decode().map_err(EngineError::from)?;
    Ok((graph, NodeId::new(wire.source), NodeId::new(wire.target)))
}

fn load_model(
    artifact: &Path,
    manifest: &Path,
) -> Result<&'static cordon_model::LoadedModel, CliError> {
    match cordon_model::initialize(artifact, manifest) {
        ModelState::Loaded(model) => Ok(model),
        ModelState::Unavailable(reason) => Err(CliError::ModelUnavailable {
            reason: reason.clone(),
        }),
    }
}

fn to_pick_set(raw: &[u32]) -> BTreeSet<NodeId> {
    raw.iter().copied().map(NodeId::new).collect()
}

/// Renders `report` to `writer` as pretty-printed JSON.
///
/// # Errors
/// Returns [`io::Error`] if serialisation or writing fails.
pub fn render_report(report: &Report, mut writer: impl Write) -> io::Result<()> {
    let payload = match report {
        Report::Game(game) => serde_json::to_string_pretty(game),
        Report::Round(outcome) => serde_json::to_string_pretty(outcome),
        Report::Predictions(predictions) => serde_json::to_string_pretty(predictions),
        Report::Score(score) => serde_json::to_string_pretty(score),
    }
    .map_err(io::Error::other)?;
    writeln!(writer, "{payload}")
}

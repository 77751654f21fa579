//! `rrtune`: tune the penalty weights of a DP randomized response mechanism.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use rrtune::mechanism::PrivacyTarget;
use rrtune::tuning::{self, StorageConfig, TuningConfig};
use tracing_subscriber::EnvFilter;

/// Multi-objective search over the L2, distance and DP penalty weights.
#[derive(Parser, Debug)]
#[command(name = "rrtune", version, about)]
struct Args {
    /// Seed for the trainer's initialization and the sampler.
    #[arg(long, default_value_t = 123)]
    seed: u64,

    /// Target epsilon (> 0).
    #[arg(long, default_value_t = 1.0)]
    epsilon: f64,

    /// Target delta in [0, 1]; 0 selects pure DP.
    #[arg(long, default_value_t = 1e-5)]
    delta: f64,

    /// Training iterations per trial.
    #[arg(long, default_value_t = 100_000)]
    num_iters: usize,

    /// Number of trials to run.
    #[arg(long, default_value_t = 2)]
    num_trials: usize,

    /// Directory for the log file and the default database.
    #[arg(long, default_value = "./")]
    output_path: PathBuf,

    /// Identifies the study in storage and names the log file.
    #[arg(long, default_value = "hyperparam-opt-test1")]
    study_name: String,

    /// Persist trials to an SQLite database.
    #[arg(long)]
    save_results: bool,

    /// Database file, defaults to `<output-path>/<study-name>.db`.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Trainer step size.
    #[arg(long, default_value_t = 0.01)]
    learning_rate: f64,

    /// Debug-level logging and training progress.
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn into_config(self) -> TuningConfig {
        let storage = if self.save_results {
            let path = self
                .db_path
                .unwrap_or_else(|| self.output_path.join(format!("{}.db", self.study_name)));
            StorageConfig::Sqlite(path)
        } else {
            StorageConfig::Memory
        };

        TuningConfig {
            epsilon: self.epsilon,
            delta: self.delta,
            seed: self.seed,
            n_iters: self.num_iters,
            n_trials: self.num_trials,
            study_name: self.study_name,
            storage,
            learning_rate: self.learning_rate,
            silent: !self.debug,
        }
    }
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    fs::create_dir_all(&args.output_path)
        .with_context(|| format!("creating {}", args.output_path.display()))?;
    let log_path = args.output_path.join(format!("{}.log", args.study_name));
    let file = File::options()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    let default = if args.debug {
        "warn,rrtune=debug"
    } else {
        "warn,rrtune=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Nothing touches the disk until the target is known to be valid.
    PrivacyTarget::new(args.epsilon, args.delta)?;

    init_logging(&args)?;
    tracing::debug!(?args, "parsed arguments");

    let config = args.into_config();
    let study = tuning::run(&config)
        .with_context(|| format!("running study {}", config.study_name))?;

    for trial in study.best_trials() {
        println!("trial {}: {:?} -> {:?}", trial.id, trial.params, trial.values);
    }
    Ok(())
}

//! `playground` command-line entry point.

mod commands;
mod render;

use ap_protocol::stage_models::DeploymentMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "playground", version, about = "Replay a guided AutoML pipeline in the terminal")]
struct Cli {
    /// Project root containing the `.playground/` directory
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk all six stages for one dataset
    Run {
        /// Dataset id from the fixture catalog
        #[arg(short, long, default_value = ap_core::fixtures::DEFAULT_DATASET_ID)]
        dataset: String,

        /// Business objective id (defaults to the dataset's first objective)
        #[arg(short, long)]
        objective: Option<String>,

        /// Business goal recorded in stage 2
        #[arg(long, default_value = "Reduce customer churn by 15%")]
        goal: String,

        /// Deployment target recorded in stage 2
        #[arg(long, value_enum, default_value_t = Deploy::Cloud)]
        deploy: Deploy,

        /// Play timelines in wall-clock time instead of fast-forwarding
        #[arg(long)]
        realtime: bool,

        /// Seed for drift synthesis, overriding config.toml
        #[arg(long)]
        seed: Option<u64>,

        /// Print the final session snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Use the default dataset when `--dataset` is unknown
        #[arg(long)]
        fallback: bool,
    },

    /// Show simulated production drift for a dataset
    Drift {
        #[arg(short, long, default_value = ap_core::fixtures::DEFAULT_DATASET_ID)]
        dataset: String,

        /// Week to inspect in detail (1-12). Prints every week when omitted.
        #[arg(short, long)]
        week: Option<u8>,

        #[arg(long)]
        seed: Option<u64>,

        /// Use the default dataset when `--dataset` is unknown
        #[arg(long)]
        fallback: bool,
    },

    /// List available datasets and their objectives
    Datasets,
}

#[derive(Clone, Copy, ValueEnum)]
enum Deploy {
    Cloud,
    OnPremise,
    Edge,
}

impl From<Deploy> for DeploymentMode {
    fn from(deploy: Deploy) -> Self {
        match deploy {
            Deploy::Cloud => DeploymentMode::Cloud,
            Deploy::OnPremise => DeploymentMode::OnPremise,
            Deploy::Edge => DeploymentMode::Edge,
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            dataset,
            objective,
            goal,
            deploy,
            realtime,
            seed,
            json,
            fallback,
        } => {
            let args = commands::RunArgs {
                dataset,
                objective,
                goal,
                deployment_mode: deploy.into(),
                realtime,
                seed,
                json,
                fallback,
            };
            commands::run_pipeline(&cli.root, args).await
        }
        Commands::Drift {
            dataset,
            week,
            seed,
            fallback,
        } => commands::show_drift(&cli.root, &dataset, week, seed, fallback).await,
        Commands::Datasets => commands::list_datasets(&cli.root).await,
    }
}

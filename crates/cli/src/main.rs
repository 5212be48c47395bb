use anyhow::Result;
use clap::{Parser, Subcommand};
use servio_cli::commands::{self, Overrides};
use servio_core::config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Evaluate {
            registry,
            dataset,
            report,
            strategies,
            workers,
        } => {
            commands::apply_overrides(
                &mut cfg,
                Overrides {
                    registry,
                    dataset,
                    report,
                    strategies,
                    workers,
                },
            );
            commands::run_evaluate(&cfg).await?;
            Ok(())
        }
        Commands::Predict {
            query,
            registry,
            strategies,
        } => {
            commands::apply_overrides(
                &mut cfg,
                Overrides {
                    registry,
                    strategies,
                    ..Overrides::default()
                },
            );
            commands::run_predict(&cfg, &query).await
        }
    }
}

#[derive(Parser)]
#[command(name = "servio")]
#[command(about = "Service registry matcher and strategy evaluator", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every strategy over the evaluation set and write the report
    Evaluate {
        /// Registry JSONL file
        #[arg(long)]
        registry: Option<String>,
        /// Evaluation dataset JSON; derived from the registry when omitted
        #[arg(long)]
        dataset: Option<String>,
        /// Output CSV path
        #[arg(long)]
        report: Option<String>,
        /// Strategies to run (comma-separated)
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        strategies: Vec<String>,
        /// Worker count for the parallel strategy
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Print the top-1 service for a single query
    Predict {
        /// Free-text query
        query: String,
        /// Registry JSONL file
        #[arg(long)]
        registry: Option<String>,
        /// Strategies to query (comma-separated)
        #[arg(long = "strategy", value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        strategies: Vec<String>,
    },
}

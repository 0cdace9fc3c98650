pub mod acquire;
pub mod config;
pub mod extract;
pub mod filter;
pub mod generate;
pub mod intent;
pub mod load_config;
pub mod pipeline;
pub mod render;
pub mod summarise;
pub mod workspace;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use generate::OpenAiClient;
use load_config::load_config;
use pipeline::{run_pipeline, PipelineError, PipelineReport};

#[derive(Parser)]
#[clap(
    name = "repo-report",
    version,
    about = "Clone a git repository, filter its content around a topic with an LLM, and render a PDF report"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline to completion using the given config file
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted CLI logic entrypoint for integration tests and main().
pub async fn run(cli: Cli) -> Result<PipelineReport, PipelineError> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Run { config } => {
            let config =
                load_config(config).map_err(|e| PipelineError::Config(format!("{e:#}")))?;
            let client = OpenAiClient::new(&config.generation).map_err(PipelineError::Generation)?;
            println!("Pipeline starting...");
            match run_pipeline(&config, &client).await {
                Ok(report) => {
                    println!("Pipeline complete.\nReport:");
                    println!("{:#?}", report);
                    Ok(report)
                }
                Err(e) => {
                    eprintln!("[ERROR] Pipeline failed: {}", e);
                    Err(e)
                }
            }
        }
    }
}

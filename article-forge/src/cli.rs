/// # article-forge CLI Interface (Module)
///
/// Command parsing and orchestration for the `article-forge` binary. Segmentation,
/// planning, generation and publish gating all live in [`article-forge-core`]; this
/// module reads input files, loads config and wires the HTTP bridge in.
///
/// ## Commands
/// - `segment --input <file>`: print the display segments of an article, one per line.
/// - `plan --input <file>`: print the image placeholder plan as JSON.
/// - `publish --config <yaml> --input <file>`: run prompts, asset generation and
///   publish through the bridge, then print the run report as JSON.
///
/// For programmatic/integration use call [`run`] with a constructed [`Cli`].
///
/// [`article-forge-core`]: ../../article-forge-core/
use crate::bridge::BridgeClient;
use crate::load_config::load_config;
use anyhow::{Context, Result};
use article_forge_core::placeholder::plan;
use article_forge_core::segment::segment;
use article_forge_core::workflow::{Collaborators, Workflow, WorkflowSettings};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CLI for article-forge: segment, illustrate and publish generated articles.
#[derive(Parser)]
#[clap(
    name = "article-forge",
    version,
    about = "Segment generated articles, fill image placeholders and publish the result"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the display segments of an article
    Segment {
        /// Path to the article text
        #[clap(long)]
        input: PathBuf,
    },
    /// Print the image placeholder plan of an article as JSON
    Plan {
        /// Path to the article text
        #[clap(long)]
        input: PathBuf,
    },
    /// Generate every image through the bridge and publish the assembled article
    Publish {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Path to the article text
        #[clap(long)]
        input: PathBuf,
    },
}

fn read_article(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read article {path:?}"))
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Segment { input } => {
            let content = read_article(&input)?;
            let segments = segment(&content);
            tracing::info!(command = "segment", segments = segments.len(), "Segmented article");
            for part in segments {
                println!("{}", part.text);
            }
            Ok(())
        }
        Commands::Plan { input } => {
            let content = read_article(&input)?;
            let placeholders = plan(&content);
            tracing::info!(command = "plan", placeholders = placeholders.len(), "Planned placeholders");
            println!("{}", serde_json::to_string_pretty(&placeholders)?);
            Ok(())
        }
        Commands::Publish { config, input } => {
            let config = load_config(config)?;
            let content = read_article(&input)?;
            tracing::info!(command = "publish", "Starting generation and publish cycle");

            let bridge = Arc::new(
                BridgeClient::new(&config.bridge)
                    .map_err(|e| anyhow::Error::msg(format!("Bridge setup failed: {e}")))?,
            );
            let collaborators = Collaborators {
                prompts: bridge.clone(),
                assets: bridge.clone(),
                publisher: bridge,
            };
            let settings = WorkflowSettings {
                prompts: config.prompts,
                assets: config.assets,
                pipeline: config.pipeline,
                segment: config.segment,
            };

            let mut workflow = Workflow::new(content, collaborators, settings);
            match workflow.run_to_publish().await {
                Ok(report) => {
                    tracing::info!(command = "publish", ?report, "Publish complete");
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "publish", error = %e, "Publish failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}

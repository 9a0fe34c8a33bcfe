use anyhow::Result;
use article_forge::cli::{run, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // ARTICLE_FORGE_API_KEY may come from a local .env
    dotenv::dotenv().ok();

    tracing_subscriber::fmt::init();
    tracing::info!("article-forge starting");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("article-forge finished"),
        Err(e) => tracing::error!(error = %e, "article-forge failed"),
    }
    result
}

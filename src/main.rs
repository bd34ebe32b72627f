mod agents;
mod cli;
mod commands;
mod config;
mod gemini;
mod kb;
mod markdown;
mod plan;
mod planner;

pub const USER_AGENT: &str = concat!("rinkside/", env!("CARGO_PKG_VERSION"));

use clap::Parser;
use cli::{Cli, Command};
use gemini::GeminiClient;
use kb::McpKnowledgeBase;
use planner::Domain;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rinkside=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let (domain, args) = match cli.command {
        Command::Drills(args) => (Domain::Drills, args),
        Command::OffIce(args) => (Domain::OffIce, args),
    };

    let settings = config::Settings::from_args(&args);
    let gemini = GeminiClient::from_env(config::http_client()?)
        .inspect_err(|e| tracing::error!("Gemini client not available: {e}"))?;
    info!(model = gemini.model(), "starting rinkside");

    let kb = McpKnowledgeBase::connect(&settings.kb_url, domain.search_tool(), settings.n_results)
        .await
        .inspect_err(|e| tracing::error!("knowledge base not available: {e}"))?;
    info!(url = %settings.kb_url, tool = kb.tool(), "knowledge base connected");

    let today = chrono::Local::now().date_naive();
    let result = commands::run_plan(domain, &args, &settings, gemini, &kb, today).await;
    kb.close().await;
    let report = result.inspect_err(|e| tracing::error!("planning failed: {e}"))?;

    println!("{}", report.markdown);
    if let Some(path) = &report.written_to {
        println!("Plan saved to {}", path.display());
    }
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autoresearch::{Config, ResearchPipeline};

/// Autonomous arXiv research agent
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of search-analyze cycles to run
    #[arg(short = 'i', long)]
    iterations: Option<u32>,

    /// Number of papers to analyze in each iteration
    #[arg(short = 'p', long)]
    papers_per_iteration: Option<usize>,

    /// Seconds to pause between iterations
    #[arg(short = 'd', long)]
    delay: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autoresearch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Load configuration; an unusable credential aborts here, before the loop.
    let mut config = Config::from_env()?;
    if let Some(iterations) = args.iterations {
        config.research.iterations = iterations;
    }
    if let Some(papers) = args.papers_per_iteration {
        config.research.papers_per_iteration = papers;
    }
    if let Some(delay) = args.delay {
        config.research.iteration_delay_secs = delay;
    }

    info!(
        iterations = config.research.iterations,
        papers_per_iteration = config.research.papers_per_iteration,
        "Configuration loaded"
    );

    let mut pipeline = ResearchPipeline::new(config)?;
    pipeline.run().await;

    Ok(())
}

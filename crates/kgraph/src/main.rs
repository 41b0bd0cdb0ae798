mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    dispatch(cli.command).await
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Build(args) => cli::build::run(args).await,
        Commands::Render { graph, format } => cli::render::run(&graph, format),
        Commands::Query { graph, text } => cli::query::run(&graph, &text),
        Commands::Check { graph } => cli::check::run(&graph),
        Commands::Stats { graph } => cli::stats::run(&graph),
        Commands::Demo { format } => cli::demo::run(format).await,
    }
}

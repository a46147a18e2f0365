//! M.U.S.E pipeline runner binary

mod cli;

use clap::Parser;
use cli::output::Output;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("muse=info")),
        )
        .with_target(false)
        .init();

    let args = Cli::parse();
    let out = if args.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match args.command {
        Commands::Run {
            config,
            inputs,
            no_planning,
            drafts_dir,
        } => cli::run_command(config, inputs, no_planning, drafts_dir, &out).await,
        Commands::Validate { config } => cli::validate_command(config, &out),
        Commands::Init { dir, force } => cli::init::run(&dir, force, &out),
    }
}

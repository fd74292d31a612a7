//! BuildKit CLI - Main entry point

mod cli;
mod init;

use buildkit_foundation::{ConfigLoader, DEFAULT_CONFIG_FILE};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// BuildKit - bump, decorate and build iOS apps
#[derive(Parser, Debug)]
#[command(name = "buildkit")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Project file (TOML, or JSON with a .json extension)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the configured pipeline
    Run {
        /// Run only these tasks, in the given order
        #[arg(short, long = "task")]
        tasks: Vec<String>,
    },
    /// Check task preconditions without changing anything
    Check {
        /// Check only these tasks
        #[arg(short, long = "task")]
        tasks: Vec<String>,
    },
    /// Put back icon originals left behind by an interrupted run
    Restore,
    /// Write a starter project file
    Init {
        /// Overwrite an existing project file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Command::Init { force } = args.command {
        return init::init_project(&args.config, force);
    }

    let project = ConfigLoader::new().load(&args.config)?;
    tracing::debug!(
        "Loaded {} with {} pipeline tasks",
        args.config.display(),
        project.pipeline.len()
    );

    match args.command {
        Command::Run { tasks } => {
            let built = cli::run_pipeline(project, &tasks).await?;
            if !built {
                anyhow::bail!("the project failed to build");
            }
        }
        Command::Check { tasks } => cli::check_pipeline(&project, &tasks)?,
        Command::Restore => cli::restore_icons(&project)?,
        Command::Init { .. } => {}
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::config;
use cli::image::{self, OutputTarget};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the images a Dockerfile is built from
    #[command(visible_alias = "ls")]
    #[command(visible_alias = "l")]
    List {
        /// Dockerfile to read ('-' for stdin). Defaults to the configured path or ./Dockerfile
        #[arg(long, short)]
        file: Option<String>,
    },
    /// Show the full reference of one image
    #[command(visible_alias = "g")]
    Get {
        /// Image name without tag or digest (e.g., ubuntu, library/alpine)
        image: String,
        /// Dockerfile to read ('-' for stdin). Defaults to the configured path or ./Dockerfile
        #[arg(long, short)]
        file: Option<String>,
    },
    /// Change the version of an image
    #[command(visible_alias = "s")]
    #[command(visible_alias = "bump")]
    Set {
        /// Image name without tag or digest (e.g., ubuntu, library/alpine)
        image: String,
        /// New version: a tag (16.04), a digest (sha256:...) or both (16.04@sha256:...)
        version: String,
        /// Dockerfile to read ('-' for stdin). Defaults to the configured path or ./Dockerfile
        #[arg(long, short)]
        file: Option<String>,
        /// Write the result back to the Dockerfile instead of stdout
        #[arg(long, short, conflicts_with = "output")]
        write: bool,
        /// Write the result to this file instead of stdout
        #[arg(long, short)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep stdout clean for Dockerfile output; logs go to stderr
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let project_config = config::load_project_config(&cwd)?.unwrap_or_default();

    match &cli.command {
        Commands::List { file } => {
            image::list_images(&project_config.dockerfile_path(file.as_deref()))?;
        }
        Commands::Get { image: name, file } => {
            image::get_image(&project_config.dockerfile_path(file.as_deref()), name)?;
        }
        Commands::Set {
            image: name,
            version,
            file,
            write,
            output,
        } => {
            let target = match (*write, output) {
                (true, _) => OutputTarget::InPlace,
                (false, Some(output)) => OutputTarget::File(output.clone()),
                (false, None) => OutputTarget::Stdout,
            };

            image::set_image_version(
                &project_config.dockerfile_path(file.as_deref()),
                name,
                version,
                &target,
            )?;
        }
    }

    Ok(())
}

//! pagediff command-line entry point.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;

use pagediff_cli::commands::{self, diff::DiffArgs, images::ImagesArgs, text::TextArgs, Context};
use pagediff_cli::config::{load_detector_config, resolve_output_dir, DescriberConfig};

#[derive(Parser)]
#[command(
    name = "pagediff",
    about = "Find, outline and describe what changed between two renderings of a document",
    version
)]
struct Cli {
    /// JSON file with detector settings.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory (also reads PAGEDIFF_OUT).
    #[arg(short, long, global = true)]
    out: Option<String>,

    /// Model for the description service (also reads PAGEDIFF_MODEL).
    #[arg(long, global = true)]
    model: Option<String>,

    /// Prompt sent with the cropped regions (also reads PAGEDIFF_PROMPT).
    #[arg(long, global = true)]
    prompt: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find additions and removals between two page images.
    Images(ImagesArgs),

    /// Find every region where two page images differ.
    Diff(DiffArgs),

    /// Rasterize two PDFs and compare each page pair.
    #[cfg(feature = "pdfium")]
    Pdf(commands::pdf::PdfArgs),

    /// Line diff of two documents' text.
    Text(TextArgs),

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   pagediff completions bash > ~/.local/share/bash-completion/completions/pagediff
    ///   pagediff completions zsh > ~/.zfunc/_pagediff
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let detector_config = cli
        .config
        .as_deref()
        .map(load_detector_config)
        .transpose()?;
    let ctx = Context {
        detector_config,
        out_dir: resolve_output_dir(cli.out.as_deref()),
        describer: DescriberConfig::resolve(cli.model, cli.prompt),
    };

    match cli.command {
        Commands::Images(args) => {
            let comparison = commands::images::run(&ctx, &args).await?;
            tracing::info!("Output: {}", ctx.out_dir.display());
            print_json(&comparison)?;
        }

        Commands::Diff(args) => {
            let changes = commands::diff::run(&ctx, &args).await?;
            tracing::info!("Output: {}", ctx.out_dir.display());
            print_json(&changes)?;
        }

        #[cfg(feature = "pdfium")]
        Commands::Pdf(args) => {
            let reports = commands::pdf::run(&ctx, &args).await?;
            tracing::info!("Output: {}", ctx.out_dir.display());
            print_json(&reports)?;
        }

        Commands::Text(args) => {
            let report = commands::text::run(&args)?;
            print_json(&report)?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "pagediff", &mut std::io::stdout());
        }
    }

    Ok(())
}

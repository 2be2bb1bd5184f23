use anyhow::Context;
use batchforge::{generate_from_idea, create_client, Pipeline, Provider, RunConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "batchforge",
    version,
    author,
    about = "Generate structured data using a language model",
    long_about = "Batch structured-output generation against a hosted LLM provider.\n\n\
    The tool loads a JSON Schema, a system/user prompt pair, and a batch data \
    array, submits every record through a schema-constrained chat call, and \
    writes the ordered results to a JSON file, optionally rendering them as \
    Markdown and PDF reports.\n\n\
    USAGE EXAMPLES:\n  \
      # Run a batch job with the default file names\n  \
      batchforge\n\n  \
      # Use OpenAI and render reports\n  \
      batchforge --provider openai --markdown --pdf\n\n  \
      # Bootstrap the three input files from an idea\n  \
      batchforge --idea \"compare the ten longest rivers\""
)]
struct Cli {
    /// Path to the configuration file (JSON Schema constraining each result)
    #[arg(long, default_value = "config.json", value_name = "PATH")]
    config: PathBuf,

    /// Path to the prompts file ({"system": ..., "user": ...})
    #[arg(long, default_value = "prompts.json", value_name = "PATH")]
    prompts: PathBuf,

    /// Path to the batch data file (JSON array of input records)
    #[arg(long, default_value = "batch_data.json", value_name = "PATH")]
    batch_data: PathBuf,

    /// Path to the output file
    #[arg(long, default_value = "output.json", value_name = "PATH")]
    output: PathBuf,

    /// LLM provider to submit requests to
    #[arg(short, long, value_enum, default_value = "google")]
    provider: CliProvider,

    /// Also render the results as a Markdown report next to the output file
    #[arg(long)]
    markdown: bool,

    /// Also convert the Markdown report to PDF (renders Markdown implicitly)
    #[arg(long)]
    pdf: bool,

    /// Generate config, prompts, and batch data from this high level idea
    #[arg(long, value_name = "TEXT")]
    idea: Option<String>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliProvider {
    Google,
    Openai,
}

impl From<CliProvider> for Provider {
    fn from(p: CliProvider) -> Self {
        match p {
            CliProvider::Google => Self::Google,
            CliProvider::Openai => Self::OpenAi,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    // Bootstrap mode short-circuits the pipeline entirely.
    if let Some(idea) = cli.idea {
        let client = create_client(cli.provider.into())
            .context("Failed to create LLM client")?;
        generate_from_idea(
            client.as_ref(),
            &idea,
            &cli.config,
            &cli.prompts,
            &cli.batch_data,
        )
        .context("Failed to generate files from idea")?;
        println!(
            "Generated {}, {}, and {} from idea.",
            cli.config.display(),
            cli.prompts.display(),
            cli.batch_data.display()
        );
        return Ok(());
    }

    let config = RunConfig::builder()
        .config_path(cli.config)
        .prompts_path(cli.prompts)
        .batch_path(cli.batch_data)
        .output_path(cli.output)
        .provider(cli.provider.into())
        .emit_markdown(cli.markdown)
        .emit_pdf(cli.pdf)
        .build()
        .context("Failed to build configuration")?;

    let stats = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Pipeline execution failed")?;

    if cli.verbose > 0 {
        stats.print_summary();
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("batchforge=info"),
        1 => EnvFilter::new("batchforge=debug"),
        _ => EnvFilter::new("batchforge=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .init();

    Ok(())
}

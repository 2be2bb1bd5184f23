use crate::{
    chain::Chain,
    config::{load_batch, load_json, load_prompts, required_fields, write_json_pretty, RunConfig},
    error::Result,
    pdfmd,
    provider::{create_client, ChatModel},
    render::render_markdown,
};
use std::fs;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Statistics collected during one batch run.
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Number of batch input records
    pub batch_items: usize,

    /// Number of structured results produced
    pub results: usize,

    /// Total execution time
    pub duration: Duration,

    /// Time spent loading the input documents
    pub load_duration: Duration,

    /// Time spent in provider calls
    pub generate_duration: Duration,

    /// Time spent writing outputs
    pub write_duration: Duration,

    /// Output JSON path
    pub output_path: String,

    /// Markdown report path, when one was written
    pub markdown_path: Option<String>,

    /// PDF report path, when conversion succeeded
    pub pdf_path: Option<String>,
}

impl RunStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║                 Batch Run Summary                     ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Batch items:          {:>8}                        ║",
            self.batch_items
        );
        println!(
            "║ Results written:      {:>8}                        ║",
            self.results
        );
        println!("║ Output file:                                          ║");
        println!("║   {}                                              ║", self.output_path);
        if let Some(path) = &self.markdown_path {
            println!("║ Markdown report:                                      ║");
            println!("║   {}                                              ║", path);
        }
        if let Some(path) = &self.pdf_path {
            println!("║ PDF report:                                           ║");
            println!("║   {}                                              ║", path);
        }
        println!("║                                                       ║");
        println!("║ Timing Breakdown:                                     ║");
        println!(
            "║   - Loading:          {:>8.2}s                     ║",
            self.load_duration.as_secs_f64()
        );
        println!(
            "║   - Generating:       {:>8.2}s                     ║",
            self.generate_duration.as_secs_f64()
        );
        println!(
            "║   - Writing:          {:>8.2}s                     ║",
            self.write_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Batch generation pipeline: load, generate, write, render.
pub struct Pipeline {
    config: RunConfig,
    client: Option<Box<dyn ChatModel>>,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// The provider client is constructed lazily at [`Pipeline::run`] time,
    /// after the input documents have loaded, so a bad path fails before the
    /// operator is prompted for a credential.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            client: None,
        })
    }

    /// Creates a pipeline bound to a preconfigured chat model.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn with_client(config: RunConfig, client: Box<dyn ChatModel>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            client: Some(client),
        })
    }

    /// Executes the complete pipeline and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Load**: schema, prompts and batch data from their JSON files
    /// 2. **Generate**: every batch item through the schema-constrained chain
    /// 3. **Write**: the ordered result array, then the optional reports
    ///
    /// Markdown rendering and PDF conversion failures are logged as warnings;
    /// everything else aborts the run.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, generation or the output write fails.
    #[instrument(skip(self), fields(provider = %self.config.provider))]
    pub fn run(self) -> Result<RunStats> {
        let start_time = Instant::now();

        info!("Starting batch pipeline");

        let load_start = Instant::now();
        let schema = load_json(&self.config.config_path)?;
        let prompts = load_prompts(&self.config.prompts_path)?;
        let batch = load_batch(&self.config.batch_path)?;
        let load_duration = load_start.elapsed();

        info!(
            "✓ Loaded schema, prompts and {} batch item(s) in {:.2}s",
            batch.len(),
            load_duration.as_secs_f64()
        );

        let client = match self.client {
            Some(client) => client,
            None => create_client(self.config.provider)?,
        };
        let chain = Chain::new(client.as_ref(), &schema, &prompts);

        let generate_start = Instant::now();
        info!(
            "Submitting {} request(s) to {}",
            batch.len(),
            self.config.provider
        );
        let results = chain.batch(&batch)?;
        let generate_duration = generate_start.elapsed();

        info!(
            "✓ Generated {} result(s) in {:.2}s",
            results.len(),
            generate_duration.as_secs_f64()
        );

        let write_start = Instant::now();
        write_json_pretty(&self.config.output_path, &results)?;
        info!("✓ Wrote {}", self.config.output_path.display());

        let mut markdown_path = None;
        if self.config.emit_markdown || self.config.emit_pdf {
            let order = required_fields(&schema);
            match render_markdown(&results, &order, Some(&batch)) {
                Ok(document) => {
                    let path = self.config.markdown_path();
                    match fs::write(&path, format!("{document}\n")) {
                        Ok(()) => {
                            info!("✓ Wrote {}", path.display());
                            markdown_path = Some(path);
                        }
                        Err(err) => warn!("Could not write {}: {err}", path.display()),
                    }
                }
                Err(err) => warn!("Markdown rendering failed: {err}"),
            }
        }

        let pdf_path = if self.config.emit_pdf {
            markdown_path
                .as_deref()
                .and_then(|path| pdfmd::convert_or_warn(path, None))
        } else {
            None
        };
        let write_duration = write_start.elapsed();

        let total_duration = start_time.elapsed();
        info!(
            "✓ Pipeline completed in {:.2}s",
            total_duration.as_secs_f64()
        );

        Ok(RunStats {
            batch_items: batch.len(),
            results: results.len(),
            duration: total_duration,
            load_duration,
            generate_duration,
            write_duration,
            output_path: self.config.output_path.display().to_string(),
            markdown_path: markdown_path.map(|p| p.display().to_string()),
            pdf_path: pdf_path.map(|p| p.display().to_string()),
        })
    }
}

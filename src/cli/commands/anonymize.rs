//! Anonymize command implementation
//!
//! Reads documents, anonymizes them in bounded concurrent chunks and writes
//! them back in the input layout. Documents that fail are left out of the
//! output and listed in the batch report.

use super::load_engine;
use crate::anonymization::{AnonymizationStrategy, BatchReport};
use crate::cli::input::{read_documents, render_documents, write_output};
use crate::cli::{EXIT_CONFIG, EXIT_PARTIAL, EXIT_SUCCESS};
use crate::{log_run_complete, log_run_start};
use clap::Args;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Documents scheduled per worker before the shutdown signal is checked again
const CHUNK_PER_WORKER: usize = 4;

/// Arguments for the anonymize command
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// Input file: JSON document, JSON array or JSON Lines (`-` for stdin)
    pub input: String,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write the batch report as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<String>,

    /// Override the strategy (custom, redact_all, replace_all)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Override the number of concurrent workers
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Do not print the batch report to stderr
    #[arg(short, long)]
    pub quiet: bool,
}

impl AnonymizeArgs {
    /// Execute the anonymize command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let Some((config, engine)) = load_engine(config_path, |config| {
            if let Some(strategy) = &self.strategy {
                tracing::info!(strategy = %strategy, "Overriding strategy from CLI");
                config.engine.anonymization.strategy = strategy.parse::<AnonymizationStrategy>()?;
            }
            if let Some(workers) = self.max_workers {
                tracing::info!(workers, "Overriding max workers from CLI");
                config.engine.anonymization.max_workers = workers;
            }
            Ok(())
        }) else {
            return Ok(EXIT_CONFIG);
        };

        let input = read_documents(&self.input)?;
        let total = input.documents.len();
        log_run_start!("anonymize", self.input, total);

        let start = Instant::now();
        let engine = Arc::new(engine);
        let workers = config.engine.anonymization.max_workers;
        let chunk_size = workers * CHUNK_PER_WORKER;

        let mut report = BatchReport::new();
        let mut output = Vec::with_capacity(total);
        let mut interrupted = false;
        let mut documents = input.documents.into_iter().peekable();
        let mut offset = 0;

        while documents.peek().is_some() {
            if *shutdown_signal.borrow() {
                tracing::warn!(
                    processed = offset,
                    remaining = total - offset,
                    "Shutdown requested; not scheduling remaining documents"
                );
                report.add_warning(format!(
                    "Interrupted: {} of {} documents not processed",
                    total - offset,
                    total
                ));
                interrupted = true;
                break;
            }

            let chunk: Vec<_> = documents.by_ref().take(chunk_size).collect();
            let chunk_len = chunk.len();

            for (index, result) in engine
                .anonymize_batch(chunk, workers)
                .await
                .into_iter()
                .enumerate()
            {
                match result {
                    Ok(document) => {
                        report.add_document(&document);
                        output.push(document.anonymized_data);
                    }
                    Err(e) => {
                        tracing::error!(index = offset + index, error = %e, "Failed to anonymize document");
                        report.add_failure(format!("Document {}: {e}", offset + index));
                    }
                }
            }
            offset += chunk_len;
        }

        let rendered =
            render_documents(&output, input.format, config.application.pretty_output)?;
        write_output(self.output.as_deref(), &rendered)?;

        if let Some(path) = &self.report {
            report.write_to_file(std::path::Path::new(path))?;
        }
        if !self.quiet {
            eprint!("{}", report.format_console());
        }

        log_run_complete!(report.total_documents, report.failed_documents, start.elapsed());

        if interrupted || !report.is_complete() {
            Ok(EXIT_PARTIAL)
        } else {
            Ok(EXIT_SUCCESS)
        }
    }
}

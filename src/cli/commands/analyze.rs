//! Analyze command implementation
//!
//! Runs detection only and prints a per-document report. Documents are
//! never modified.

use super::load_engine;
use crate::anonymization::AnalysisReport;
use crate::cli::input::{read_documents, write_output};
use crate::cli::{EXIT_CONFIG, EXIT_PARTIAL, EXIT_SUCCESS};
use crate::{log_run_complete, log_run_start};
use clap::{Args, ValueEnum};
use std::time::Instant;

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable boxes
    #[default]
    Console,
    /// JSON array with one report per document
    Json,
}

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input file: JSON document, JSON array or JSON Lines (`-` for stdin)
    pub input: String,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    pub format: ReportFormat,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,
}

impl AnalyzeArgs {
    /// Execute the analyze command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some((_, engine)) = load_engine(config_path, |_| Ok(())) else {
            return Ok(EXIT_CONFIG);
        };

        let input = read_documents(&self.input)?;
        log_run_start!("analyze", self.input, input.documents.len());
        let start = Instant::now();

        let mut reports: Vec<AnalysisReport> = Vec::with_capacity(input.documents.len());
        let mut failed = 0usize;
        for (index, document) in input.documents.iter().enumerate() {
            match engine.analyze(document) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!(index, error = %e, "Failed to analyze document");
                    eprintln!("❌ Document {index}: {e}");
                    failed += 1;
                }
            }
        }

        let rendered = match self.format {
            ReportFormat::Console => reports
                .iter()
                .map(AnalysisReport::format_console)
                .collect::<Vec<_>>()
                .join("\n"),
            ReportFormat::Json => {
                let mut json = serde_json::to_string_pretty(&reports)?;
                json.push('\n');
                json
            }
        };
        write_output(self.output.as_deref(), &rendered)?;

        log_run_complete!(reports.len(), failed, start.elapsed());

        let incomplete = reports.iter().any(|r| !r.complete);
        if failed > 0 || incomplete {
            Ok(EXIT_PARTIAL)
        } else {
            Ok(EXIT_SUCCESS)
        }
    }
}

mod dataset;
mod metrics;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::LmStudio;
use mlmradar_common::Verdict;
use mlmradar_pipeline::{Classifier, ReasoningFormat};

use dataset::load_labeled_rows;
use metrics::ModelMetrics;

/// Offline evaluation harness: classify labeled posts with each candidate
/// model and report accuracy/precision/recall/F1 per model.
#[derive(Parser)]
#[command(name = "mlmradar-eval", version, about)]
struct Cli {
    /// CSV of posts labeled as MLM content
    #[arg(long)]
    mlm_data: PathBuf,

    /// CSV of posts labeled as non-MLM content
    #[arg(long)]
    non_mlm_data: PathBuf,

    /// Model identifier to evaluate (repeatable)
    #[arg(long = "model", required = true)]
    models: Vec<String>,

    /// Where to write per-row predictions
    #[arg(long, default_value = "evaluation_results.csv")]
    output: PathBuf,

    /// Chat endpoint base URL
    #[arg(long, default_value = "http://localhost:1234/v1")]
    base_url: String,

    /// API key for the endpoint
    #[arg(long, default_value = "lm-studio")]
    api_key: String,

    /// Spacing between model calls, in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,
}

#[derive(Serialize)]
struct PredictionRow {
    model_id: String,
    post_link: String,
    is_mlm: u8,
    predicted_label: i8,
    raw_verdict: String,
    certainty: Option<u8>,
    reasoning: String,
    error_info: Option<String>,
    raw_response: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mlmradar=info".parse()?))
        .init();

    let cli = Cli::parse();
    let delay = Duration::from_millis(cli.delay_ms);

    let rows = load_labeled_rows(&cli.mlm_data, &cli.non_mlm_data)?;

    let mut writer = csv::Writer::from_path(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;

    let mut summary: BTreeMap<String, ModelMetrics> = BTreeMap::new();

    for model_id in &cli.models {
        info!(model_id, rows = rows.len(), "evaluating model");
        let model = LmStudio::new(&cli.api_key, model_id).with_base_url(&cli.base_url);
        let classifier = Classifier::new(Arc::new(model), ReasoningFormat::Brief);

        let metrics = summary.entry(model_id.clone()).or_default();
        let started = Instant::now();

        for (i, row) in rows.iter().enumerate() {
            tokio::time::sleep(delay).await;

            let record = row.to_canonical();
            let classification = classifier.classify(&record).await;

            let predicted: i8 = match (&classification.error, classification.verdict) {
                (None, Some(Verdict::Yes)) => 1,
                (None, Some(Verdict::No)) => 0,
                _ => -1,
            };
            metrics.record(row.is_mlm, predicted);

            writer.serialize(PredictionRow {
                model_id: model_id.clone(),
                post_link: row.post_link.clone(),
                is_mlm: row.is_mlm as u8,
                predicted_label: predicted,
                raw_verdict: classification
                    .verdict
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                certainty: classification.certainty,
                reasoning: classification.reasoning,
                error_info: classification.error,
                raw_response: classification.raw_response,
            })?;

            if (i + 1) % 50 == 0 {
                info!(model_id, processed = i + 1, total = rows.len(), "progress");
            }
        }

        info!(
            model_id,
            elapsed_secs = started.elapsed().as_secs(),
            "finished model"
        );
    }

    writer.flush()?;
    info!(output = %cli.output.display(), "detailed results written");

    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &BTreeMap<String, ModelMetrics>) {
    println!("\n--- Evaluation Summary ---");
    println!("{}", "-".repeat(70));
    for (model_id, metrics) in summary {
        println!("Model: {model_id}");
        println!("  - Total Predictions: {}", metrics.total);
        println!("  - Valid Predictions: {}", metrics.valid());
        println!("  - Error Rate:        {:.2}%", metrics.error_rate());
        println!("  - Accuracy:          {:.4}", metrics.accuracy());
        println!("  - Precision (MLM):   {:.4}", metrics.precision());
        println!("  - Recall (MLM):      {:.4}", metrics.recall());
        println!("  - F1-Score (MLM):    {:.4}", metrics.f1());
        println!("{}", "-".repeat(70));
    }
}

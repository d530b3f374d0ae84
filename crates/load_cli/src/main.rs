//! Loadcast command line interface
//!
//! Builds catalog request templates, runs predictions locally or against a
//! running service, and exports results or raw feature matrices as CSV.

mod report;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use loadcast_core::{
    parse_flight_date, MetadataStore, ModelArtifact, PredictionRequest, PredictionResult,
    Predictor,
};
use serde::Deserialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loadcast-cli")]
#[command(about = "Optimal catering load prediction tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    artifacts: ArtifactArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ArtifactArgs {
    /// Column schema (JSON array of feature names)
    #[arg(long, global = true, default_value = "artifacts/columns.json")]
    columns: PathBuf,

    /// Training metadata JSON
    #[arg(long, global = true, default_value = "artifacts/metadata.json")]
    metadata: PathBuf,

    /// Model artifact JSON
    #[arg(long, global = true, default_value = "artifacts/model.json")]
    model: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a request covering every catalog product at its default quantity
    Template(TemplateCommand),
    /// Predict optimal loads for a request file
    Predict(PredictCommand),
    /// Write the feature matrix a request produces
    Features(FeaturesCommand),
    /// Print the metadata option lists
    Metadata,
}

#[derive(Args)]
struct TemplateCommand {
    /// Flight date, YYYY-MM-DD
    #[arg(long)]
    date: String,
    #[arg(long)]
    origin: String,
    #[arg(long)]
    flight_type: String,
    #[arg(long)]
    service_type: String,
    #[arg(long)]
    passengers: i64,
}

#[derive(Args)]
struct PredictCommand {
    /// Request JSON file
    #[arg(long, value_name = "PATH")]
    request: PathBuf,
    /// Base URL of a running loadcast service; predicts locally when omitted
    #[arg(long)]
    server: Option<String>,
    /// Also write results to this CSV file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
}

#[derive(Args)]
struct FeaturesCommand {
    /// Request JSON file
    #[arg(long, value_name = "PATH")]
    request: PathBuf,
    /// Output CSV file; stdout when omitted
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Template(cmd) => handle_template(cmd, &cli.artifacts),
        Commands::Predict(cmd) => handle_predict(cmd, &cli.artifacts).await,
        Commands::Features(cmd) => handle_features(cmd, &cli.artifacts),
        Commands::Metadata => handle_metadata(&cli.artifacts),
    }
}

fn load_store(artifacts: &ArtifactArgs) -> Result<MetadataStore> {
    MetadataStore::load(&artifacts.columns, &artifacts.metadata)
        .context("failed to load column schema and metadata")
}

fn load_predictor(artifacts: &ArtifactArgs) -> Result<Predictor> {
    let store = load_store(artifacts)?;
    let model = ModelArtifact::load_json(&artifacts.model).with_context(|| {
        format!(
            "failed to load model artifact {}",
            artifacts.model.display()
        )
    })?;
    Ok(Predictor::new(Arc::new(store), Arc::new(model))?)
}

fn read_request(path: &Path) -> Result<PredictionRequest> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read request file {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("request file {} is not a valid prediction request", path.display()))
}

fn handle_template(cmd: TemplateCommand, artifacts: &ArtifactArgs) -> Result<()> {
    parse_flight_date(&cmd.date)?;
    if cmd.passengers < 0 {
        bail!("passengers must not be negative (got {})", cmd.passengers);
    }

    let store = load_store(artifacts)?;
    let request = PredictionRequest::for_catalog(
        &store,
        cmd.date,
        cmd.origin,
        cmd.flight_type,
        cmd.service_type,
        cmd.passengers,
    );
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

async fn handle_predict(cmd: PredictCommand, artifacts: &ArtifactArgs) -> Result<()> {
    let request = read_request(&cmd.request)?;

    let results = match &cmd.server {
        Some(server) => predict_remote(server, &request).await?,
        None => load_predictor(artifacts)?.predict(&request)?,
    };

    print!("{}", report::render_table(&results));

    if let Some(path) = &cmd.csv {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        report::write_results_csv(file, &results)?;
        println!("\nWrote {} rows to {}", results.len(), path.display());
    }
    Ok(())
}

async fn predict_remote(server: &str, request: &PredictionRequest) -> Result<Vec<PredictionResult>> {
    let url = format!("{}/api/predict", server.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .json(request)
        .send()
        .await
        .with_context(|| format!("failed to reach {url}"))?;

    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        bail!("server rejected request ({status}): {message}");
    }
    Ok(response.json().await?)
}

fn handle_features(cmd: FeaturesCommand, artifacts: &ArtifactArgs) -> Result<()> {
    let request = read_request(&cmd.request)?;
    let predictor = load_predictor(artifacts)?;
    let matrix = predictor.features(&request)?;
    let columns = predictor.store().schema().names();

    match &cmd.csv {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            report::write_features_csv(file, columns, &matrix)?;
            eprintln!(
                "Wrote {} rows x {} columns to {}",
                matrix.n_rows(),
                matrix.width(),
                path.display()
            );
        }
        None => report::write_features_csv(io::stdout().lock(), columns, &matrix)?,
    }
    Ok(())
}

fn handle_metadata(artifacts: &ArtifactArgs) -> Result<()> {
    let store = load_store(artifacts)?;
    println!("{}", serde_json::to_string_pretty(&store.view())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::NamedTempFile;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_template_arguments() {
        let cli = Cli::parse_from([
            "loadcast-cli",
            "template",
            "--date",
            "2025-09-15",
            "--origin",
            "JFK",
            "--flight-type",
            "Long-Haul",
            "--service-type",
            "Economy",
            "--passengers",
            "180",
            "--columns",
            "/tmp/columns.json",
        ]);
        assert_eq!(cli.artifacts.columns, PathBuf::from("/tmp/columns.json"));
        assert_eq!(cli.artifacts.model, PathBuf::from("artifacts/model.json"));
        match cli.command {
            Commands::Template(cmd) => {
                assert_eq!(cmd.flight_type, "Long-Haul");
                assert_eq!(cmd.passengers, 180);
            }
            _ => panic!("expected template command"),
        }
    }

    #[test]
    fn read_request_reports_bad_files() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "{\"products\": []}").unwrap();
        let err = read_request(file.path()).unwrap_err();
        assert!(err.to_string().contains("not a valid prediction request"));

        assert!(read_request(Path::new("/nonexistent/request.json")).is_err());
    }
}

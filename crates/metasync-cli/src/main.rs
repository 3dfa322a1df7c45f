//! metasync CLI
//!
//! Reconciles asset metadata held in a CSV sheet with a remote data
//! catalog, optionally enriching short descriptions through a
//! chat-completion API first.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use metasync_client::{CatalogClient, ClientConfig, OpenAiClient, OpenAiConfig};
use metasync_core::{dataset, Enricher, ReconcileEngine};

#[derive(Parser)]
#[command(name = "metasync")]
#[command(version, about = "Reconcile CSV asset metadata with a data catalog", long_about = None)]
struct Cli {
    /// Path to the asset metadata CSV
    #[arg(long, default_value = "assetinfo.csv")]
    csv_file: PathBuf,

    /// Skip description generation and load the CSV as-is
    #[arg(long)]
    skip_openai: bool,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Base URL of the catalog API
    #[arg(long, env = "METASYNC_CATALOG_ENDPOINT")]
    endpoint: String,

    /// Bearer token for the catalog API
    #[arg(long, env = "METASYNC_CATALOG_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Chat model used for description generation
    #[arg(long, default_value = "gpt-4")]
    model: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.csv_file.exists() {
        return Err(format!("CSV file not found: {}", cli.csv_file.display()).into());
    }

    let api_key = if cli.skip_openai {
        None
    } else {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Some(key),
            _ => {
                return Err(
                    "OPENAI_API_KEY not set. Export it or pass --skip-openai.".into(),
                )
            }
        }
    };

    println!("Starting metadata reconciliation");
    println!("CSV file: {}", cli.csv_file.display());
    println!(
        "Description generation: {}",
        if cli.skip_openai { "disabled" } else { "enabled" }
    );
    println!("Dry run: {}", if cli.dry_run { "yes" } else { "no" });
    println!("{}", "-".repeat(60));

    let mut rows = dataset::load(&cli.csv_file)?;
    println!("Loaded {} rows from CSV", rows.len());

    if let Some(api_key) = api_key {
        println!("=== STEP 1: Enriching descriptions ===");
        let generator = OpenAiClient::new(OpenAiConfig::new(api_key).with_model(&cli.model))?;
        let enricher = Enricher::new(generator);
        let stats = enricher.enrich_rows(&mut rows, cli.dry_run).await;
        println!(
            "Enriched {} of {} short descriptions",
            stats.generated, stats.candidates
        );

        if cli.dry_run {
            println!("[dry run] CSV left untouched");
        } else {
            dataset::write(&rows, &cli.csv_file)?;
            println!(
                "Backup saved to: {}",
                dataset::backup_path(&cli.csv_file).display()
            );
            println!("Updated CSV saved to: {}", cli.csv_file.display());
        }
    } else {
        println!("=== STEP 1: Loading existing CSV (generation skipped) ===");
    }

    println!();
    println!("=== STEP 2: Updating the catalog ===");

    let mut config = ClientConfig::builder(&cli.endpoint);
    if let Some(ref token) = cli.token {
        config = config.token(token);
    }
    let client = CatalogClient::new(config.build()?)?;

    let engine = ReconcileEngine::new(client, cli.dry_run);
    let summary = engine.run(&rows).await;

    println!(
        "Processed {} collections ({} skipped)",
        summary.collections_processed, summary.collections_skipped
    );
    println!(
        "Assets: {} matched, {} updated, {} failed",
        summary.assets_matched, summary.assets_updated, summary.assets_failed
    );
    println!("Owners set: {}", summary.owners_set);
    println!(
        "Columns: {} updated, {} propagation failures",
        summary.columns_updated, summary.column_failures
    );

    println!();
    println!("=== UPDATE COMPLETE ===");
    println!("Summary:");
    if cli.skip_openai {
        println!("1. CSV file loaded (description generation skipped)");
    } else if cli.dry_run {
        println!("1. CSV enrichment simulated (dry run)");
    } else {
        println!("1. CSV file updated with generated descriptions");
    }
    if cli.dry_run {
        println!("2. Catalog description updates simulated (dry run)");
        println!("3. Asset owner updates simulated (dry run)");
        println!("4. Column description updates simulated (dry run)");
    } else {
        println!("2. Catalog assets updated with enhanced descriptions");
        println!("3. Asset owners updated where provided");
        println!("4. Column descriptions updated where applicable");
    }

    Ok(())
}

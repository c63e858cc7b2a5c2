use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use titree_bore_export::bore_list::load_bore_list;
use titree_bore_export::datasets::DATASETS;
use titree_bore_export::exporter::{print_summary, run_export};
use titree_bore_export::fetcher::{TimeseriesFetcher, DEFAULT_BASE_URL};

#[derive(Parser)]
#[command(name = "titree-bore-export")]
#[command(about = "Export Ti Tree bore time-series data to per-dataset CSV files", long_about = None)]
struct Cli {
    /// Path to the CSV file listing bores in its 'bore_name' column
    #[arg(long, env = "BORE_LIST", default_value = "bores.csv")]
    bore_list: PathBuf,

    /// Directory the per-dataset CSV files are written under
    #[arg(long, env = "OUTPUT_DIR", default_value = "output/TiTree")]
    output_dir: PathBuf,

    /// Water data portal export endpoint
    #[arg(long, env = "EXPORT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let bores = load_bore_list(&cli.bore_list);
    if bores.is_empty() {
        println!("No bores to process, nothing to do.");
        return Ok(());
    }

    info!(
        "Exporting {} datasets for {} bores to {:?}",
        DATASETS.len(),
        bores.len(),
        cli.output_dir
    );

    let fetcher = TimeseriesFetcher::with_base_url(cli.base_url);
    let outcome = run_export(&fetcher, &bores, &DATASETS, &cli.output_dir).await;

    print_summary(&outcome);

    Ok(())
}

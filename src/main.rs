use clap::{Parser, Subcommand};
use nps_scraper::config::Config;
use nps_scraper::infra::http_client::ReqwestConnector;
use nps_scraper::logging;
use nps_scraper::pipeline::{Pipeline, PipelineResult, Stages};
use std::path::PathBuf;
use tracing::{error, warn};

#[derive(Parser)]
#[command(name = "nps_scraper")]
#[command(about = "U.S. National Parks reference data scraper")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory the JSON tables are written to
    #[arg(long, global = true, default_value = "output")]
    output_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the National Park unit catalog
    Units,
    /// Fetch monthly visitation reports
    Visits {
        /// Park codes to fetch (comma-separated). Defaults to every park.
        #[arg(long)]
        parks: Option<String>,
    },
    /// Fetch the Wikipedia park descriptions and join them to park codes
    Parks,
    /// Run every stage
    Run {
        /// Park codes for the visitation stage (comma-separated)
        #[arg(long)]
        parks: Option<String>,
    },
}

fn split_codes(list: Option<String>) -> Option<Vec<String>> {
    list.map(|l| {
        l.split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn print_summary(result: &PipelineResult) {
    println!("\n📊 Results:");
    println!("   Park units: {}", result.catalog.len());
    if let Some(visits) = &result.visits {
        println!("   Parks with visitation: {}", visits.table.park_count());
        println!("   Months covered: {}", visits.table.index().len());
        if !visits.failures.is_empty() {
            warn!("{} parks failed during the visitation run", visits.failures.len());
            println!("\n⚠️  Failed parks:");
            for failure in &visits.failures {
                println!("   - {}: {}", failure.code, failure.message);
            }
        }
    }
    if let Some(parks) = &result.parks {
        println!("   Park descriptions: {}", parks.len());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let connector = ReqwestConnector::new(config.http.clone());
    let pipeline = Pipeline::new(config, Box::new(connector));

    let (stages, only) = match cli.command {
        Commands::Units => {
            println!("🔄 Fetching park units...");
            (Stages::UNITS_ONLY, None)
        }
        Commands::Visits { parks } => {
            println!("🔄 Fetching park visitation...");
            (Stages { visits: true, parks: false }, split_codes(parks))
        }
        Commands::Parks => {
            println!("🔄 Fetching park descriptions...");
            (Stages { visits: false, parks: true }, None)
        }
        Commands::Run { parks } => {
            println!("🔄 Running full pipeline...");
            (Stages::ALL, split_codes(parks))
        }
    };

    let result = match pipeline.run(stages, only.as_deref()).await {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            println!("❌ Pipeline failed: {}", e);
            return Err(e.into());
        }
    };

    print_summary(&result);
    for path in Pipeline::persist_to_json(&result, &cli.output_dir)? {
        println!("💾 Saved {}", path);
    }
    Ok(())
}

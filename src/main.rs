use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use tap_autopilot::client::AutopilotClient;
use tap_autopilot::config::Config;
use tap_autopilot::logging;
use tap_autopilot::messages::StdoutSink;
use tap_autopilot::normalize::RecordNormalizer;
use tap_autopilot::schema::SchemaRegistry;
use tap_autopilot::sync::SyncRunner;

#[derive(Parser)]
#[command(name = "tap-autopilot")]
#[command(about = "Autopilot CRM data extraction tap")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the stream catalog (schemas and key properties) as JSON
    Discover,
    /// Sync streams from the Autopilot API to stdout
    Sync {
        /// Specific streams to sync (comma-separated). Default: all streams
        #[arg(long)]
        streams: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();
    let registry = Arc::new(SchemaRegistry::new());

    match cli.command {
        Commands::Discover => {
            info!("Loading schemas");
            println!("{}", serde_json::to_string_pretty(&registry.catalog())?);
        }
        Commands::Sync { streams } => {
            let config = Config::load(&cli.config)?;

            let selected: Vec<String> = match streams {
                Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
                None => registry.stream_names().iter().map(|s| s.to_string()).collect(),
            };

            let runner = SyncRunner::new(
                AutopilotClient::new(&config)?,
                RecordNormalizer::new(registry.clone()),
                Box::new(StdoutSink),
                config.strict,
            );
            runner.sync(&selected).await?;
        }
    }

    Ok(())
}

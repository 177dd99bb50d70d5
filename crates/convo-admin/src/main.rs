use std::time::Duration;

use clap::{Parser, Subcommand};
use convo_history::{HistoryConfig, HistoryError, RewriteOutcome, S3HistoryService};
use convo_storage::{ObjectStore, SignedUrlMethod};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "convo-admin",
    about = "Inspect and migrate stored conversation history"
)]
struct Cli {
    /// Bucket holding history objects (overrides CONVO_BUCKET)
    #[arg(long, global = true)]
    bucket: Option<String>,
    /// Key prefix for history objects (overrides CONVO_KEY_PREFIX)
    #[arg(long, global = true)]
    prefix: Option<String>,
    /// S3-compatible endpoint (overrides CONVO_S3_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Per-operation storage timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a source's history and generation
    Show { source_id: String },
    /// Re-encode a source's history in the current record format
    Rewrite { source_id: String },
    /// Issue a presigned URL for a media object
    SignUrl {
        key: String,
        /// Sign an upload instead of a download
        #[arg(long)]
        put: bool,
        #[arg(long, default_value_t = 900)]
        ttl_secs: u64,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = resolve_config(&cli)?;
    let service = convo_history::connect(&config).await;

    let result = run(&service, cli.command).await;
    service.store().close().await?;
    result
}

fn resolve_config(cli: &Cli) -> eyre::Result<HistoryConfig> {
    let mut config = HistoryConfig::from_env()?;
    if let Some(bucket) = &cli.bucket {
        config.bucket = bucket.clone();
    }
    if let Some(prefix) = &cli.prefix {
        config.key_prefix = prefix.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(ms) = cli.timeout_ms {
        if ms == 0 {
            return Err(eyre::eyre!("--timeout-ms must be greater than zero"));
        }
        config.storage_timeout = Duration::from_millis(ms);
    }
    Ok(config)
}

async fn run(service: &S3HistoryService, command: Command) -> eyre::Result<()> {
    match command {
        Command::Show { source_id } => {
            let history = service.get_history(&source_id).await?;
            info!(
                source_id,
                generation = %history.generation,
                messages = history.messages.len(),
                "history fetched"
            );
            println!("generation: {}", history.generation);
            println!("{}", serde_json::to_string_pretty(&history.messages)?);
        }
        Command::Rewrite { source_id } => match service.rewrite(&source_id).await {
            Ok(RewriteOutcome::Absent) => {
                println!("{source_id}: no history stored, nothing to rewrite");
            }
            Ok(RewriteOutcome::Unchanged { generation }) => {
                println!("{source_id}: already current at generation {generation}, no write made");
            }
            Ok(RewriteOutcome::Rewritten { messages, from, to }) => {
                println!("{source_id}: rewrote {messages} messages, generation {from} -> {to}");
            }
            Err(HistoryError::ConcurrentModification { expected, .. }) => {
                return Err(eyre::eyre!(
                    "{source_id} changed while rewriting (read generation {expected}); run again"
                ));
            }
            Err(e) => return Err(e.into()),
        },
        Command::SignUrl { key, put, ttl_secs } => {
            let method = if put {
                SignedUrlMethod::Put
            } else {
                SignedUrlMethod::Get
            };
            let url = service
                .store()
                .signed_url(&key, method, Duration::from_secs(ttl_secs))
                .await?;
            info!(key, ?method, ttl_secs, "signed URL issued");
            println!("{url}");
        }
    }
    Ok(())
}

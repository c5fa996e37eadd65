mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use applyhub::config::Config;
use applyhub::files::InMemoryFileStorage;
use applyhub::telemetry;
use applyhub::workflows::{ApplicationWorkflow, PostWorkflow};
use applyhub_core::files::FileStorage;
use applyhub_core::store::KeyValueStore;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();

    telemetry::init(config.log_format);

    let store = create_store(&config).await;
    let files: Arc<dyn FileStorage> = Arc::new(InMemoryFileStorage::new(
        &config.bucket_name,
        config.presign_ttl(),
    ));

    let applications = ApplicationWorkflow::new(store.clone(), &config, files.clone());
    let posts = PostWorkflow::new(store, &config, files);

    let output = cli::run(cli.command, &applications, &posts).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(feature = "dynamodb")]
async fn create_store(config: &Config) -> Arc<dyn KeyValueStore> {
    use applyhub::storage::DynamoDbStore;

    tracing::info!("Using {}", config.target_display());
    Arc::new(DynamoDbStore::from_config(config).await)
}

#[cfg(not(feature = "dynamodb"))]
async fn create_store(config: &Config) -> Arc<dyn KeyValueStore> {
    use applyhub::storage::InMemoryStore;

    tracing::warn!(
        table = %config.table_name,
        "Using in-memory store; build with --features dynamodb to reach a real table"
    );
    Arc::new(InMemoryStore::single_table(
        &config.table_name,
        &config.created_index,
        &config.identity_index,
    ))
}

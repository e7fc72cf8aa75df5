//! Filestore command-line driver.
//!
//! Runs the upload lifecycle hooks against the configured database and
//! storage adapters, standing in for a host application's save and delete.

mod args;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::{Map, Value, json};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::{Cli, Command};
use filestore_core::storage::AdapterRegistry;
use filestore_core::upload::{
    HookOutcome, LifecycleDispatcher, OwnerEntity, UploadOutcome, UploadRegistry, UploadService,
};
use filestore_db::{FileStorageRepository, connect};
use filestore_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filestore=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let registry = Arc::new(UploadRegistry::from_bindings(&config.uploads)?);
    if let Command::Models = cli.command {
        print_models(&registry);
        return Ok(());
    }

    let adapters = Arc::new(AdapterRegistry::from_providers(&config.adapters)?);
    info!(adapters = ?adapters.names(), models = registry.len(), "Upload behaviour configured");

    let db = connect(&config.database).await?;
    info!("Connected to database");

    let service = UploadService::new(adapters, Arc::new(FileStorageRepository::new(db)));
    let dispatcher = LifecycleDispatcher::new(registry, service);

    match cli.command {
        Command::Attach {
            model,
            id,
            file,
            mime_type,
        } => attach(&dispatcher, model, id, &file, mime_type).await,
        Command::Purge {
            model,
            id,
            no_cascade,
        } => purge(&dispatcher, model, id, !no_cascade).await,
        Command::Models => Ok(()),
    }
}

async fn attach(
    dispatcher: &LifecycleDispatcher<FileStorageRepository>,
    model: String,
    id: String,
    file: &Path,
    mime_type: Option<String>,
) -> anyhow::Result<()> {
    let config = dispatcher
        .registry()
        .get(&model)
        .with_context(|| format!("model {model} has no upload behaviour"))?;
    let metadata = tokio::fs::metadata(file)
        .await
        .with_context(|| format!("cannot read {}", file.display()))?;

    let payload = json!({
        "name": file.file_name().map(|n| n.to_string_lossy()),
        "type": mime_type,
        "tmp_name": file,
        "error": 0,
        "size": metadata.len(),
    });
    let mut data = Map::new();
    data.insert(config.file_field.clone(), payload);
    let mut owner = OwnerEntity::new(model).with_data(Value::Object(data));

    // The owner is only persisted between the two hooks.
    dispatcher.before_save(&mut owner).await?;
    owner.id = Some(id);
    let outcome = dispatcher.after_save(&mut owner).await?;

    match outcome {
        HookOutcome::Upload(UploadOutcome::Stored(record)) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        _ => {
            let mirrored = owner
                .data
                .get(&config.association.name)
                .cloned()
                .unwrap_or(Value::Null);
            println!("{}", serde_json::to_string_pretty(&mirrored)?);
        }
    }
    Ok(())
}

async fn purge(
    dispatcher: &LifecycleDispatcher<FileStorageRepository>,
    model: String,
    id: String,
    cascade: bool,
) -> anyhow::Result<()> {
    let owner = OwnerEntity::new(model).with_id(id);

    for outcome in [
        dispatcher.before_delete(&owner, cascade).await?,
        dispatcher.after_delete(&owner, cascade).await?,
    ] {
        if let HookOutcome::Delete(report) = outcome {
            println!("removed {} of {} stored files", report.removed, report.matched);
        }
    }
    Ok(())
}

fn print_models(registry: &UploadRegistry) {
    for descriptor in registry.descriptors() {
        println!(
            "{}: {:?} {} -> {} ({})",
            descriptor.owner,
            descriptor.cardinality,
            descriptor.name,
            descriptor.class_name,
            descriptor.foreign_key,
        );
    }
    for model in registry.models() {
        if let Some(config) = registry.get(model) {
            println!(
                "{model}: uploads in {}, deletes in {} via {}",
                config.upload_trigger.phase(),
                config.delete_trigger.phase(),
                config.adapter_name,
            );
        }
    }
}

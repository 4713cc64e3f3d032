use anyhow::Context;
use npmreg::config::RegistryConfig;
use npmreg::events;
use npmreg::pipeline;
use npmreg::store::{HttpObjectStore, RegistryStore};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

pub async fn run(file: Option<PathBuf>) -> anyhow::Result<()> {
    let json = match file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("reading notification batch {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading notification batch from stdin")?;
            buffer
        }
    };

    let notifications = events::parse_notification_batch(&json)?;
    let config = RegistryConfig::load()?;
    let store = RegistryStore::new(HttpObjectStore::new(&config)?, &config);

    let outcome = pipeline::process_event_batch(&store, &config.bucket, notifications).await;
    println!(
        "Processed {} package(s): {} manifest(s) published, {} failed",
        outcome.packages, outcome.published, outcome.publish_failures
    );

    Ok(())
}

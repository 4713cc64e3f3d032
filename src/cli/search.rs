use npmreg::config::RegistryConfig;
use npmreg::resolver;
use npmreg::store::{HttpObjectStore, RegistryStore};

pub async fn run(text: Option<&str>) -> anyhow::Result<()> {
    let config = RegistryConfig::load()?;
    let store = RegistryStore::new(HttpObjectStore::new(&config)?, &config);

    let response = resolver::search_packages(&store, text).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

use anyhow::bail;
use npmreg::config::RegistryConfig;
use npmreg::resolver;
use npmreg::store::{HttpObjectStore, RegistryStore};

pub async fn run(package: &str) -> anyhow::Result<()> {
    let config = RegistryConfig::load()?;
    let store = RegistryStore::new(HttpObjectStore::new(&config)?, &config);

    // Serve the materialized manifest when there is one; otherwise fall
    // back to synthesizing it from the version objects.
    let manifest = match store.get_manifest(package).await {
        Some(manifest) => Some(manifest),
        None => resolver::resolve_package(&store, package).await?,
    };

    match manifest {
        Some(manifest) => {
            println!("{}", serde_json::to_string_pretty(&manifest)?);
            Ok(())
        }
        None => bail!("package {} not found", package),
    }
}

use crate::store::{ObjectStore, RegistryStore};
use npmreg_core::PackageManifest;
use tracing::{debug, error};

/// Write merged manifests back to the store.
///
/// Failures are isolated per package: an error is logged and the remaining
/// manifests are still written. Returns the number of failed writes; the
/// batch counts as processed either way, and redelivery of the triggering
/// notification is the upstream retry mechanism.
pub async fn publish_manifests<S: ObjectStore>(
    store: &RegistryStore<S>,
    manifests: &[PackageManifest],
) -> usize {
    let mut failures = 0;

    for manifest in manifests {
        match store.put_manifest(&manifest.name, manifest).await {
            Ok(()) => {
                debug!("Published manifest for {}", manifest.name);
            }
            Err(e) => {
                error!(
                    "Error occurred while trying to upload package manifest for {}: {}",
                    manifest.name, e
                );
                failures += 1;
            }
        }
    }

    failures
}

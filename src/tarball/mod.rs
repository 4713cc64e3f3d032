use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use npmreg_core::{
    PackageData, PackageDist, PackageVersion, RegistryError, RegistryResult, VersionRecord,
};
use sha1::{Digest, Sha1};
use std::fs;
use tar::Archive;
use tempfile::TempDir;

/// Relative path of the descriptor inside an unpacked tarball.
const DESCRIPTOR_PATH: &str = "package/package.json";

/// Lower-case hex SHA-1 of a byte slice.
pub fn shasum(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Recover a version record from compressed tarball bytes.
///
/// The checksum is computed over the compressed bytes as uploaded, not the
/// unpacked contents. Every call unpacks into its own freshly created
/// temporary directory, removed on every exit path, so concurrent
/// extractions never share scratch space.
pub fn extract_version_record(
    bytes: &[u8],
    tarball_url: String,
    last_modified: DateTime<Utc>,
) -> RegistryResult<VersionRecord> {
    let data = read_descriptor(bytes)?;
    let dist = PackageDist {
        shasum: shasum(bytes),
        tarball: tarball_url,
    };

    Ok(VersionRecord {
        package: PackageVersion {
            id: String::new(),
            data,
            dist,
        },
        last_modified,
    })
}

/// Gunzip + untar into scratch space and parse the embedded descriptor.
fn read_descriptor(bytes: &[u8]) -> RegistryResult<PackageData> {
    let scratch = TempDir::new()
        .map_err(|e| RegistryError::Extraction(format!("scratch directory: {}", e)))?;

    let decoder = GzDecoder::new(bytes);
    let mut archive = Archive::new(decoder);
    archive
        .unpack(scratch.path())
        .map_err(|e| RegistryError::Extraction(format!("unpack: {}", e)))?;

    let descriptor_path = scratch.path().join(DESCRIPTOR_PATH);
    let content = fs::read_to_string(&descriptor_path)
        .map_err(|e| RegistryError::Extraction(format!("read {}: {}", DESCRIPTOR_PATH, e)))?;

    serde_json::from_str(&content)
        .map_err(|e| RegistryError::Extraction(format!("parse {}: {}", DESCRIPTOR_PATH, e)))
}

/// Build a gzipped tarball holding `package/package.json` with the given
/// descriptor text. Test helper shared by the pipeline and resolver tests.
#[cfg(test)]
pub(crate) fn make_tarball(descriptor: &str) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut builder = tar::Builder::new(Vec::new());
    let bytes = descriptor.as_bytes();
    let mut header = tar::Header::new_gnu();
    header.set_path(DESCRIPTOR_PATH).unwrap();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append(&header, bytes).unwrap();
    let tar_bytes = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes).unwrap();
    encoder.finish().unwrap()
}

use crate::core::error::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A strict major.minor.patch version.
///
/// Ordering is lexicographic over (major, minor, patch), which is all the
/// registry needs: version object keys carry no pre-release or build
/// metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string (e.g., "1.2.3").
    ///
    /// Requires at least three dot-separated integer components; anything
    /// past the third component is ignored.
    pub fn parse(s: &str) -> RegistryResult<Self> {
        let parts: Vec<&str> = s.split('.').collect();

        if parts.len() < 3 {
            return Err(RegistryError::Version(format!(
                "Invalid version format: {}",
                s
            )));
        }

        let major = parts[0]
            .parse()
            .map_err(|_| RegistryError::Version(format!("Invalid major version: {}", s)))?;
        let minor = parts[1]
            .parse()
            .map_err(|_| RegistryError::Version(format!("Invalid minor version: {}", s)))?;
        let patch = parts[2]
            .parse()
            .map_err(|_| RegistryError::Version(format!("Invalid patch version: {}", s)))?;

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Sort items by descending semantic version.
///
/// The sort is stable: items with equal versions keep their input order.
pub fn sort_descending<T, F>(items: &mut [T], version_of: F)
where
    F: Fn(&T) -> SemanticVersion,
{
    items.sort_by(|a, b| version_of(b).cmp(&version_of(a)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let v = SemanticVersion::parse("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
    }

    #[test]
    fn test_parse_roundtrip() {
        for s in ["0.0.0", "1.2.3", "10.20.30", "999.0.1"] {
            let v = SemanticVersion::parse(s).unwrap();
            assert_eq!(v.to_string(), s);
        }
    }

    #[test]
    fn test_parse_ignores_extra_components() {
        let v = SemanticVersion::parse("1.2.3.4").unwrap();
        assert_eq!(v, SemanticVersion::new(1, 2, 3));
    }

    #[test]
    fn test_parse_rejects_short_versions() {
        assert!(SemanticVersion::parse("1.2").is_err());
        assert!(SemanticVersion::parse("1").is_err());
        assert!(SemanticVersion::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(SemanticVersion::parse("1.2.x").is_err());
        assert!(SemanticVersion::parse("a.b.c").is_err());
        assert!(SemanticVersion::parse("1.-2.3").is_err());
    }

    #[test]
    fn test_ordering() {
        let a = SemanticVersion::new(1, 2, 3);
        let b = SemanticVersion::new(1, 10, 0);
        let c = SemanticVersion::new(2, 0, 0);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.cmp(&a), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_sort_descending() {
        let mut items = vec!["1.0.0", "2.1.0", "0.9.9", "2.0.5"];
        sort_descending(&mut items, |s| SemanticVersion::parse(s).unwrap());
        assert_eq!(items, vec!["2.1.0", "2.0.5", "1.0.0", "0.9.9"]);
    }

    #[test]
    fn test_sort_descending_is_stable() {
        let mut items = vec![("1.0.0", 'a'), ("2.0.0", 'b'), ("1.0.0", 'c')];
        sort_descending(&mut items, |(s, _)| SemanticVersion::parse(s).unwrap());
        assert_eq!(
            items,
            vec![("2.0.0", 'b'), ("1.0.0", 'a'), ("1.0.0", 'c')]
        );
    }
}

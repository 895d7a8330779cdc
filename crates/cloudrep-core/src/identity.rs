use std::fmt;

/// Prefix shared by every benchmark cluster name.
pub const CLUSTER_PREFIX: &str = "cldrprt";

/// Stable name of a target's transient cluster.
///
/// Format: `cldrprt{edition}-{machine}-{checksum}` where
/// - `edition` is `(year + 1) % 1000` (reports are named after the following year),
/// - `checksum` is CRC-32 (IEEE) over `cloud`, `group` and the report version,
///
/// sanitized to ASCII letters, digits and `-`. Identical inputs always produce the
/// same name, so re-running the generator within a year targets the same cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterIdentity(String);

impl ClusterIdentity {
    pub fn derive(cloud: &str, group: &str, version: &str, year: i32, machine_type: &str) -> Self {
        let edition = (year + 1).rem_euclid(1000);
        let checksum = checksum(&[cloud, group, version]);
        Self(sanitize(&format!(
            "{CLUSTER_PREFIX}{edition}-{machine_type}-{checksum}"
        )))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: &str) -> Self {
        Self(sanitize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Script file stem for a machine shape: `m5.large` -> `m5-large`.
pub fn format_machine_type(machine_type: &str) -> String {
    machine_type.replace('.', "-")
}

fn checksum(parts: &[&str]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hasher.finalize()
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_repeatable() {
        let a = ClusterIdentity::derive("aws", "us-east-2", "2022", 2026, "m5.large");
        let b = ClusterIdentity::derive("aws", "us-east-2", "2022", 2026, "m5.large");
        assert_eq!(a, b);
    }

    #[test]
    fn layout_matches_prefix_edition_shape_checksum() {
        let id = ClusterIdentity::derive("aws", "us-east-2", "2022", 2026, "m5.large");
        let sum = checksum(&["aws", "us-east-2", "2022"]);
        assert_eq!(id.as_str(), format!("cldrprt27-m5-large-{sum}"));
    }

    #[test]
    fn checksum_is_crc32_of_concatenation() {
        assert_eq!(
            checksum(&["gce", "us-east1", "2022"]),
            crc32fast::hash(b"gceus-east12022")
        );
    }

    #[test]
    fn any_input_change_changes_identity() {
        let base = ClusterIdentity::derive("gce", "us-east1", "2022", 2026, "n2-standard-8");
        let variants = [
            ClusterIdentity::derive("aws", "us-east1", "2022", 2026, "n2-standard-8"),
            ClusterIdentity::derive("gce", "us-west1", "2022", 2026, "n2-standard-8"),
            ClusterIdentity::derive("gce", "us-east1", "2023", 2026, "n2-standard-8"),
            ClusterIdentity::derive("gce", "us-east1", "2022", 2027, "n2-standard-8"),
            ClusterIdentity::derive("gce", "us-east1", "2022", 2026, "n2-standard-16"),
        ];
        for v in variants {
            assert_ne!(v, base);
        }
    }

    #[test]
    fn output_is_sanitized() {
        let id = ClusterIdentity::derive("az ure", "east_us|2", "v1.0", 2026, "Standard_D8s_v3.x");
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-'),
            "{id}"
        );
        assert!(id.as_str().contains("Standard-D8s-v3-x"));
    }

    #[test]
    fn machine_type_file_stem() {
        assert_eq!(format_machine_type("m5.2xlarge"), "m5-2xlarge");
        assert_eq!(format_machine_type("n2-standard-8"), "n2-standard-8");
    }
}

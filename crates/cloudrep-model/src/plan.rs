use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Arguments, DeployArgs, NodeCount};

/// Everything a generated target script needs at execution time.
///
/// Produced once per (cloud, machine shape) by the generator and embedded in the
/// script; the driver deserializes it back and never consults the report config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPlan {
    /// Provider name passed to cluster creation.
    pub cloud: String,
    pub group: String,
    /// Cluster identity; the driver prefixes it with the invoking user.
    pub cluster: String,
    /// Default cluster size; the driver may override it.
    pub nodes: NodeCount,
    /// Cluster lifetime (e.g. `24h`).
    pub lifetime: String,
    pub machine_type: String,
    /// Local directory uploaded to the cluster as `./scripts`.
    pub scripts_dir: PathBuf,
    /// Rendered cluster-creation flags.
    #[serde(default, skip_serializing_if = "DeployArgs::is_empty")]
    pub deploy_args: DeployArgs,
    /// Resolved per-benchmark extra arguments keyed by benchmark name.
    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub bench_args: Arguments,
}

impl TargetPlan {
    /// Cluster name as seen by the cluster-management tool.
    ///
    /// Clusters are namespaced per user; an empty user yields the bare identity.
    pub fn cluster_for_user(&self, user: &str) -> String {
        let user = user.trim();
        if user.is_empty() {
            self.cluster.clone()
        } else {
            format!("{user}-{}", self.cluster)
        }
    }

    /// Default extra arguments for a benchmark (empty when not configured).
    pub fn bench_extra(&self, name: &str) -> &str {
        self.bench_args.get(name).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeployArg;

    fn plan() -> TargetPlan {
        let mut bench_args = Arguments::new();
        bench_args.insert("cpu", "-c 8");
        TargetPlan {
            cloud: "aws".into(),
            group: "us-east-2".into(),
            cluster: "cldrprt23-m5-large-123".into(),
            nodes: 4,
            lifetime: "24h".into(),
            machine_type: "m5.large".into(),
            scripts_dir: PathBuf::from("./scripts"),
            deploy_args: [DeployArg::new("aws-zones", "us-east-2a")]
                .into_iter()
                .collect(),
            bench_args,
        }
    }

    #[test]
    fn cluster_is_namespaced_by_user() {
        let p = plan();
        assert_eq!(p.cluster_for_user("alice"), "alice-cldrprt23-m5-large-123");
        assert_eq!(p.cluster_for_user(""), "cldrprt23-m5-large-123");
    }

    #[test]
    fn bench_extra_defaults_to_empty() {
        let p = plan();
        assert_eq!(p.bench_extra("cpu"), "-c 8");
        assert_eq!(p.bench_extra("io"), "");
    }

    #[test]
    fn json_roundtrip_keeps_argument_order() {
        let p = plan();
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains(r#""machineType":"m5.large""#));

        let back: TargetPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    Arguments,
    error::{ModelError, ModelResult},
};

/// Report edition used when the document does not name one.
pub const DEFAULT_REPORT_VERSION: &str = "2022";

/// Root directory for generated scripts and logs when not configured.
pub const DEFAULT_OUTPUT_DIR: &str = "./report-data";

/// Top-level report configuration: every cloud and machine shape to benchmark.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    /// Format version folded into every cluster identity.
    #[serde(default = "default_report_version")]
    pub report_version: String,
    /// Root for per-cloud script and log directories.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Deployment targets grouped by cloud.
    #[serde(default)]
    pub clouds: Vec<CloudDetails>,
}

/// One cloud provider (and region group) with its machine shapes.
///
/// Arguments declared here are defaults shared by every machine shape of the cloud.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDetails {
    /// Provider name as understood by the cluster-management tool (`gce`, `aws`, `azure`).
    pub cloud: String,
    /// Free-form group (usually region) distinguishing several configs of one cloud.
    pub group: String,
    /// Cluster-creation flags shared by all machine shapes; values may be templated.
    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub deploy_args: Arguments,
    /// Benchmark runner extras shared by all machine shapes.
    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub bench_args: Arguments,
    /// Machine shape name to shape-specific overrides.
    #[serde(default)]
    pub machine_types: BTreeMap<String, MachineConfig>,
}

/// Per-machine-shape overrides.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineConfig {
    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub deploy_args: Arguments,
    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub bench_args: Arguments,
}

fn default_report_version() -> String {
    DEFAULT_REPORT_VERSION.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl ReportConfig {
    /// Parse and validate a JSON report document.
    pub fn from_json(raw: &str) -> ModelResult<Self> {
        let cfg: ReportConfig = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate the configuration.
    ///
    /// Rules:
    /// - `reportVersion` is not blank;
    /// - each cloud has a non-blank `cloud` and `group`;
    /// - machine shape names are not blank.
    pub fn validate(&self) -> ModelResult<()> {
        if self.report_version.trim().is_empty() {
            return Err(ModelError::Invalid("reportVersion cannot be empty".into()));
        }
        for cloud in &self.clouds {
            if cloud.cloud.trim().is_empty() {
                return Err(ModelError::Invalid("cloud name cannot be empty".into()));
            }
            if cloud.group.trim().is_empty() {
                return Err(ModelError::Invalid(format!(
                    "cloud '{}' has an empty group",
                    cloud.cloud
                )));
            }
            if cloud.machine_types.keys().any(|m| m.trim().is_empty()) {
                return Err(ModelError::Invalid(format!(
                    "cloud '{}' declares an empty machine type",
                    cloud.cloud
                )));
            }
        }
        Ok(())
    }
}

impl CloudDetails {
    /// `<root>/<version>/<cloud>/<group>`
    pub fn base_path(&self, root: &Path, version: &str) -> PathBuf {
        root.join(version).join(&self.cloud).join(&self.group)
    }

    /// Directory receiving the generated per-machine scripts.
    pub fn script_dir(&self, root: &Path, version: &str) -> PathBuf {
        self.base_path(root, version).join("scripts")
    }

    /// Directory the generated scripts write their logs and results into.
    pub fn log_dir(&self, root: &Path, version: &str) -> PathBuf {
        self.base_path(root, version).join("logs")
    }
}

//! Cluster-management capability consumed by the driver.
//!
//! Everything the driver does to a cluster goes through [`ClusterOps`]; the
//! production backend shells out to `roachprod` (see [`Roachprod`]).
mod command;
mod roachprod;

pub use command::{CommandLine, LogConfig};
pub use roachprod::Roachprod;

use std::{fmt, path::Path};

use async_trait::async_trait;
use cloudrep_model::{DeployArgs, NodeCount};

use crate::error::ExecResult;

/// A cluster, a single node of it, or an inclusive node range.
///
/// Renders the way the cluster tool addresses nodes: `name`, `name:2`, `name:1-3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSelector {
    cluster: String,
    nodes: Option<(NodeCount, NodeCount)>,
}

impl NodeSelector {
    /// Every node of the cluster.
    pub fn all(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            nodes: None,
        }
    }

    /// A single 1-based node.
    pub fn node(cluster: impl Into<String>, node: NodeCount) -> Self {
        Self {
            cluster: cluster.into(),
            nodes: Some((node, node)),
        }
    }

    /// An inclusive 1-based node range.
    pub fn range(cluster: impl Into<String>, first: NodeCount, last: NodeCount) -> Self {
        Self {
            cluster: cluster.into(),
            nodes: Some((first, last)),
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }
}

impl fmt::Display for NodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nodes {
            None => f.write_str(&self.cluster),
            Some((a, b)) if a == b => write!(f, "{}:{a}", self.cluster),
            Some((a, b)) => write!(f, "{}:{a}-{b}", self.cluster),
        }
    }
}

/// Parameters of cluster creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSpec {
    pub nodes: NodeCount,
    pub lifetime: String,
    /// Provider name (`gce`, `aws`, `azure`).
    pub cloud: String,
    pub machine_type: String,
    pub deploy_args: DeployArgs,
}

/// Operations the driver needs from the cluster-management layer.
///
/// Any non-zero exit of the underlying tool surfaces as
/// [`ExecError::CommandFailed`](crate::ExecError::CommandFailed).
#[async_trait]
pub trait ClusterOps: Send + Sync {
    async fn create(&self, cluster: &str, spec: &CreateSpec) -> ExecResult<()>;

    /// Run `command` on the selected nodes and return its stdout.
    async fn run(&self, target: &NodeSelector, command: &[String]) -> ExecResult<String>;

    async fn put(&self, target: &NodeSelector, local: &Path, remote: &str) -> ExecResult<()>;

    async fn get(&self, target: &NodeSelector, remote: &str, local: &Path) -> ExecResult<()>;

    /// Stage a pre-built artifact (e.g. `cockroach`) on every node.
    async fn stage(&self, cluster: &str, artifact: &str) -> ExecResult<()>;

    /// Start the database service on the selected nodes with extra arguments.
    async fn start(&self, target: &NodeSelector, args: &str) -> ExecResult<()>;

    async fn ip(&self, target: &NodeSelector) -> ExecResult<String>;

    /// Connection URLs for the selected nodes, in node order.
    async fn pgurl(&self, target: &NodeSelector) -> ExecResult<Vec<String>>;

    async fn destroy(&self, cluster: &str) -> ExecResult<()>;
}

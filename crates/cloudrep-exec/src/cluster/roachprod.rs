use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    cluster::{ClusterOps, CommandLine, CreateSpec, LogConfig, NodeSelector},
    error::ExecResult,
};

/// [`ClusterOps`] backed by the `roachprod` command-line tool.
#[derive(Debug, Clone)]
pub struct Roachprod {
    binary: String,
}

impl Default for Roachprod {
    fn default() -> Self {
        Self::new("roachprod")
    }
}

impl Roachprod {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, verb: &str) -> CommandLine {
        CommandLine::new(self.binary.as_str()).arg(verb)
    }

    /// Argument vector for `create`.
    pub(crate) fn create_command(&self, cluster: &str, spec: &CreateSpec) -> CommandLine {
        self.command("create")
            .arg(cluster)
            .args(["-n".to_string(), spec.nodes.to_string()])
            .args(["--lifetime", spec.lifetime.as_str()])
            .args(["--clouds", spec.cloud.as_str()])
            .arg(format!("--{}-machine-type", spec.cloud))
            .arg(spec.machine_type.as_str())
            .args(spec.deploy_args.to_argv())
    }

    /// Argument vector for `run`; the remote command follows `--`.
    pub(crate) fn run_command(&self, target: &NodeSelector, command: &[String]) -> CommandLine {
        self.command("run")
            .arg(target.to_string())
            .arg("--")
            .args(command.iter().cloned())
    }
}

#[async_trait]
impl ClusterOps for Roachprod {
    async fn create(&self, cluster: &str, spec: &CreateSpec) -> ExecResult<()> {
        let cmd = self.create_command(cluster, spec);
        debug!(cluster, command = %cmd, "creating cluster");
        cmd.output().await.map(drop)
    }

    async fn run(&self, target: &NodeSelector, command: &[String]) -> ExecResult<String> {
        let cmd = self.run_command(target, command);
        debug!(target_name = %target, command = %cmd, "running remote command");
        cmd.output().await
    }

    async fn put(&self, target: &NodeSelector, local: &Path, remote: &str) -> ExecResult<()> {
        self.command("put")
            .arg(target.to_string())
            .arg(local.to_string_lossy())
            .arg(remote)
            .output()
            .await
            .map(drop)
    }

    async fn get(&self, target: &NodeSelector, remote: &str, local: &Path) -> ExecResult<()> {
        self.command("get")
            .arg(target.to_string())
            .arg(remote)
            .arg(local.to_string_lossy())
            .output()
            .await
            .map(drop)
    }

    async fn stage(&self, cluster: &str, artifact: &str) -> ExecResult<()> {
        self.command("stage")
            .args([cluster, artifact])
            .output()
            .await
            .map(drop)
    }

    async fn start(&self, target: &NodeSelector, args: &str) -> ExecResult<()> {
        self.command("start")
            .arg(target.to_string())
            .arg(format!("--args={args}"))
            .output()
            .await
            .map(drop)
    }

    async fn ip(&self, target: &NodeSelector) -> ExecResult<String> {
        let out = self
            .command("ip")
            .arg(target.to_string())
            .with_log(LogConfig::query())
            .output()
            .await?;
        Ok(out.trim().to_string())
    }

    async fn pgurl(&self, target: &NodeSelector) -> ExecResult<Vec<String>> {
        let out = self
            .command("pgurl")
            .arg(target.to_string())
            .with_log(LogConfig::query())
            .output()
            .await?;
        Ok(out.split_whitespace().map(unquote).collect())
    }

    async fn destroy(&self, cluster: &str) -> ExecResult<()> {
        self.command("destroy").arg(cluster).output().await.map(drop)
    }
}

/// `roachprod pgurl` prints shell-quoted URLs.
fn unquote(url: &str) -> String {
    url.trim_matches(|c| c == '\'' || c == '"').to_string()
}

use std::{borrow::Cow, fmt, path::PathBuf};

use cloudrep_model::{Arguments, CloudDetails, DeployArgs, NodeCount, TargetPlan};

use crate::{identity::ClusterIdentity, template::TemplateScope};

/// Per-target values visible to argument templates and the script template.
///
/// Built once per (cloud, machine shape). Deployment arguments are evaluated
/// against the context first, then stored back via [`RenderContext::with_deploy_args`]
/// before the script is rendered.
#[derive(Clone)]
pub struct RenderContext {
    cloud: String,
    group: String,
    cluster: ClusterIdentity,
    lifetime: String,
    machine_type: String,
    scripts_dir: PathBuf,
    nodes: NodeCount,
    bench_args: Arguments,
    deploy_args: DeployArgs,
}

impl RenderContext {
    pub fn new(
        cloud: &CloudDetails,
        machine_type: &str,
        cluster: ClusterIdentity,
        lifetime: &str,
        scripts_dir: PathBuf,
        nodes: NodeCount,
        bench_args: Arguments,
    ) -> Self {
        Self {
            cloud: cloud.cloud.clone(),
            group: cloud.group.clone(),
            cluster,
            lifetime: lifetime.to_string(),
            machine_type: machine_type.to_string(),
            scripts_dir,
            nodes,
            bench_args,
            deploy_args: DeployArgs::new(),
        }
    }

    pub fn cluster(&self) -> &ClusterIdentity {
        &self.cluster
    }

    pub fn machine_type(&self) -> &str {
        &self.machine_type
    }

    pub fn bench_args(&self) -> &Arguments {
        &self.bench_args
    }

    pub fn deploy_args(&self) -> &DeployArgs {
        &self.deploy_args
    }

    /// Attach the evaluated deployment arguments and return updated context.
    pub fn with_deploy_args(mut self, deploy_args: DeployArgs) -> Self {
        self.deploy_args = deploy_args;
        self
    }

    /// Consume the context into the plan embedded in the generated script.
    pub fn into_plan(self) -> TargetPlan {
        TargetPlan {
            cloud: self.cloud,
            group: self.group,
            cluster: self.cluster.into_string(),
            nodes: self.nodes,
            lifetime: self.lifetime,
            machine_type: self.machine_type,
            scripts_dir: self.scripts_dir,
            deploy_args: self.deploy_args,
            bench_args: self.bench_args,
        }
    }

    /// Human-readable target label for logs and errors: `<cloud>/<group>/<machine>`.
    pub fn target(&self) -> String {
        format!("{}/{}/{}", self.cloud, self.group, self.machine_type)
    }
}

impl TemplateScope for RenderContext {
    fn lookup(&self, path: &[&str]) -> Option<Cow<'_, str>> {
        let value = match path {
            ["Cloud"] | ["CloudDetails", "Cloud"] => Cow::Borrowed(self.cloud.as_str()),
            ["Group"] | ["CloudDetails", "Group"] => Cow::Borrowed(self.group.as_str()),
            ["Cluster"] => Cow::Borrowed(self.cluster.as_str()),
            ["Lifetime"] => Cow::Borrowed(self.lifetime.as_str()),
            ["MachineType"] => Cow::Borrowed(self.machine_type.as_str()),
            ["ScriptsDir"] => self.scripts_dir.to_string_lossy(),
            ["Nodes"] => Cow::Owned(self.nodes.to_string()),
            ["EvaledArgs"] => Cow::Owned(self.deploy_args.to_string()),
            ["BenchArgs", key] => Cow::Borrowed(self.bench_args.get(key)?),
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("target", &self.target())
            .field("cluster", &self.cluster.as_str())
            .field("bench_args_len", &self.bench_args.len())
            .field("deploy_args_len", &self.deploy_args.len())
            .finish()
    }
}

impl fmt::Display for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderContext({}, cluster={})", self.target(), self.cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudrep_model::DeployArg;

    fn ctx() -> RenderContext {
        let cloud = CloudDetails {
            cloud: "gce".into(),
            group: "us-east1".into(),
            deploy_args: Arguments::new(),
            bench_args: Arguments::new(),
            machine_types: Default::default(),
        };
        let bench: Arguments = [("cpu", "-c 8")].into_iter().collect();
        RenderContext::new(
            &cloud,
            "n2-standard-8",
            ClusterIdentity::from_raw("cldrprt23-n2-standard-8-42"),
            "24h",
            PathBuf::from("./scripts"),
            4,
            bench,
        )
    }

    #[test]
    fn resolves_known_fields() {
        let c = ctx();
        assert_eq!(c.lookup(&["Cloud"]).as_deref(), Some("gce"));
        assert_eq!(c.lookup(&["CloudDetails", "Group"]).as_deref(), Some("us-east1"));
        assert_eq!(c.lookup(&["Nodes"]).as_deref(), Some("4"));
        assert_eq!(c.lookup(&["ScriptsDir"]).as_deref(), Some("./scripts"));
        assert_eq!(c.lookup(&["BenchArgs", "cpu"]).as_deref(), Some("-c 8"));
    }

    #[test]
    fn unknown_fields_are_undefined() {
        let c = ctx();
        assert!(c.lookup(&["BenchArgs", "io"]).is_none());
        assert!(c.lookup(&["Nope"]).is_none());
        assert!(c.lookup(&["Cluster", "Name"]).is_none());
    }

    #[test]
    fn evaled_args_follow_attached_deploy_args() {
        let c = ctx();
        assert_eq!(c.lookup(&["EvaledArgs"]).as_deref(), Some(""));

        let c = c.with_deploy_args([DeployArg::new("local-ssd", "")].into_iter().collect());
        assert_eq!(c.lookup(&["EvaledArgs"]).as_deref(), Some("--local-ssd"));
    }

    #[test]
    fn into_plan_carries_everything() {
        let plan = ctx().into_plan();
        assert_eq!(plan.cluster, "cldrprt23-n2-standard-8-42");
        assert_eq!(plan.machine_type, "n2-standard-8");
        assert_eq!(plan.nodes, 4);
        assert_eq!(plan.bench_extra("cpu"), "-c 8");
    }

    #[test]
    fn display_names_target() {
        assert_eq!(
            ctx().to_string(),
            "RenderContext(gce/us-east1/n2-standard-8, cluster=cldrprt23-n2-standard-8-42)"
        );
    }
}

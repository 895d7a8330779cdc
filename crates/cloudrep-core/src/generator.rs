//! Generation run over every target of a report config.
use std::{
    fs,
    path::{Path, PathBuf},
};

use cloudrep_model::{CloudDetails, NodeCount, ReportConfig};
use time::OffsetDateTime;
use tracing::{debug, info, instrument};

use crate::{
    context::RenderContext,
    error::CoreError,
    identity::ClusterIdentity,
    render::ScriptRenderer,
    resolver::{resolve_bench_args, resolve_deploy_args},
};

/// Default cluster size written into every plan.
pub const DEFAULT_NODES: NodeCount = 4;

/// Default cluster lifetime.
pub const DEFAULT_LIFETIME: &str = "24h";

/// Generator settings that do not come from the report config.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Local directory of runner scripts uploaded to each cluster.
    pub scripts_dir: PathBuf,
    pub lifetime: String,
    pub nodes: NodeCount,
    /// Overrides `ReportConfig::output_dir` when set.
    pub output_dir: Option<PathBuf>,
    /// Calendar year folded into cluster identities.
    pub year: i32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            scripts_dir: PathBuf::from("./scripts"),
            lifetime: DEFAULT_LIFETIME.to_string(),
            nodes: DEFAULT_NODES,
            output_dir: None,
            year: OffsetDateTime::now_utc().year(),
        }
    }
}

/// Produces one driver script per (cloud, machine shape).
pub struct Generator {
    config: ReportConfig,
    options: GenerateOptions,
    renderer: ScriptRenderer,
}

impl Generator {
    pub fn new(config: ReportConfig, options: GenerateOptions) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            config,
            options,
            renderer: ScriptRenderer::new()?,
        })
    }

    /// Load a JSON report config from disk.
    pub fn from_file(path: &Path, options: GenerateOptions) -> Result<Self, CoreError> {
        let raw = fs::read_to_string(path).map_err(|source| CoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(ReportConfig::from_json(&raw)?, options)
    }

    fn output_root(&self) -> &Path {
        self.options
            .output_dir
            .as_deref()
            .unwrap_or(&self.config.output_dir)
    }

    /// Generate scripts for every cloud; stops at the first failing target.
    ///
    /// Returns written script paths in config order.
    #[instrument(level = "debug", skip(self), fields(clouds = self.config.clouds.len()))]
    pub fn generate_all(&self) -> Result<Vec<PathBuf>, CoreError> {
        let mut written = Vec::new();
        for cloud in &self.config.clouds {
            written.extend(self.generate_cloud(cloud)?);
        }
        info!(scripts = written.len(), "generation finished");
        Ok(written)
    }

    /// Generate scripts for all machine shapes of one cloud.
    pub fn generate_cloud(&self, cloud: &CloudDetails) -> Result<Vec<PathBuf>, CoreError> {
        let root = self.output_root();
        let version = self.config.report_version.as_str();
        let script_dir = cloud.script_dir(root, version);

        make_dirs(&[
            cloud.base_path(root, version),
            script_dir.clone(),
            cloud.log_dir(root, version),
        ])?;

        let mut written = Vec::with_capacity(cloud.machine_types.len());
        for (machine_type, machine) in &cloud.machine_types {
            let ctx = self.context_for(cloud, machine_type, machine.bench_args.clone());
            let deploy_args = resolve_deploy_args(machine.deploy_args.clone(), &cloud.deploy_args, &ctx)?;
            let ctx = ctx.with_deploy_args(deploy_args);

            written.push(self.renderer.write(&ctx, &script_dir)?);
        }
        Ok(written)
    }

    fn context_for(
        &self,
        cloud: &CloudDetails,
        machine_type: &str,
        bench_args: cloudrep_model::Arguments,
    ) -> RenderContext {
        let cluster = ClusterIdentity::derive(
            &cloud.cloud,
            &cloud.group,
            &self.config.report_version,
            self.options.year,
            machine_type,
        );
        debug!(cloud = %cloud.cloud, machine_type, cluster = %cluster, "target identity derived");

        RenderContext::new(
            cloud,
            machine_type,
            cluster,
            &self.options.lifetime,
            self.options.scripts_dir.clone(),
            self.options.nodes,
            resolve_bench_args(bench_args, &cloud.bench_args),
        )
    }
}

fn make_dirs(dirs: &[PathBuf]) -> Result<(), CoreError> {
    for dir in dirs {
        fs::create_dir_all(dir).map_err(|source| CoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudrep_model::TargetPlan;

    fn config(root: &Path, deploy_zone: &str) -> ReportConfig {
        let raw = format!(
            r#"{{
                "reportVersion": "2022",
                "outputDir": "{}",
                "clouds": [{{
                    "cloud": "aws",
                    "group": "us-east-2",
                    "deployArgs": {{ "aws-zones": "{deploy_zone}", "local-ssd": "" }},
                    "benchArgs": {{ "cpu": "-c 2" }},
                    "machineTypes": {{
                        "m5.large": {{}},
                        "c5.4xlarge": {{ "benchArgs": {{ "cpu": "-c 16" }} }}
                    }}
                }}]
            }}"#,
            root.display()
        );
        ReportConfig::from_json(&raw).unwrap()
    }

    fn options() -> GenerateOptions {
        GenerateOptions {
            year: 2026,
            ..Default::default()
        }
    }

    fn read_plan(path: &Path) -> TargetPlan {
        let script = fs::read_to_string(path).unwrap();
        let json = script
            .lines()
            .skip_while(|l| !l.ends_with("<<'CLOUDREP_PLAN'"))
            .nth(1)
            .unwrap();
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn writes_one_script_per_machine_type() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(config(dir.path(), "us-east-2a"), options()).unwrap();

        let written = generator.generate_all().unwrap();
        let base = dir.path().join("2022/aws/us-east-2");
        assert_eq!(
            written,
            vec![
                base.join("scripts/c5-4xlarge.sh"),
                base.join("scripts/m5-large.sh")
            ]
        );
        assert!(base.join("logs").is_dir());

        let plan = read_plan(&written[0]);
        assert_eq!(plan.machine_type, "c5.4xlarge");
        assert_eq!(plan.bench_extra("cpu"), "-c 16");
        assert!(plan.cluster.starts_with("cldrprt27-c5-4xlarge-"));
        assert_eq!(plan.deploy_args.to_string(), r#"--aws-zones="us-east-2a" --local-ssd"#);

        let plan = read_plan(&written[1]);
        assert_eq!(plan.bench_extra("cpu"), "-c 2");
    }

    #[test]
    fn regenerating_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(config(dir.path(), "us-east-2a"), options()).unwrap();

        let first = generator.generate_all().unwrap();
        let before = fs::read_to_string(&first[0]).unwrap();
        let second = generator.generate_all().unwrap();
        assert_eq!(first, second);
        assert_eq!(before, fs::read_to_string(&second[0]).unwrap());
    }

    #[test]
    fn bad_argument_template_aborts_generation() {
        let dir = tempfile::tempdir().unwrap();
        let generator =
            Generator::new(config(dir.path(), "{{.BenchArgs.zone}}"), options()).unwrap();

        let err = generator.generate_all().unwrap_err();
        assert_eq!(err.offending_arg(), Some("aws-zones"));
    }

    #[test]
    fn unwritable_output_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let generator = Generator::new(
            config(&blocker, "us-east-2a"),
            options(),
        )
        .unwrap();
        let err = generator.generate_all().unwrap_err();
        assert!(matches!(err, CoreError::CreateDir { .. }));
    }

    #[test]
    fn output_dir_option_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let generator = Generator::new(
            config(dir.path(), "us-east-2a"),
            GenerateOptions {
                output_dir: Some(other.path().to_path_buf()),
                ..options()
            },
        )
        .unwrap();

        let written = generator.generate_all().unwrap();
        assert!(written.iter().all(|p| p.starts_with(other.path())));
    }
}

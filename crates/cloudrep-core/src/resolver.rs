//! Effective argument resolution for a single target.
use cloudrep_model::{Arguments, DeployArg, DeployArgs};
use tracing::{debug, trace};

use crate::{context::RenderContext, error::CoreError, template::Template};

/// Layer machine-specific benchmark arguments over the cloud defaults.
pub fn resolve_bench_args(specific: Arguments, defaults: &Arguments) -> Arguments {
    specific.merge_onto(defaults)
}

/// Layer machine-specific deployment arguments over the cloud defaults and
/// evaluate every value as a template against `ctx`.
///
/// The first argument that fails evaluation aborts resolution; the error names it.
/// Output is sorted by argument name.
pub fn resolve_deploy_args(
    specific: Arguments,
    defaults: &Arguments,
    ctx: &RenderContext,
) -> Result<DeployArgs, CoreError> {
    let merged = specific.merge_onto(defaults);
    let mut out = DeployArgs::new();

    for (name, raw) in merged.iter() {
        let value = Template::parse(raw)
            .and_then(|t| t.render(ctx))
            .map_err(|source| CoreError::EvalArg {
                arg: name.to_string(),
                source,
            })?;
        trace!(arg = name, raw, value = %value, "deploy arg evaluated");
        out.push(DeployArg::new(name, value));
    }

    debug!(target_name = %ctx.target(), count = out.len(), "deploy args resolved");
    Ok(out)
}

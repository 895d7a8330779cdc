//! Script rendering: one executable driver per target.
mod script;
pub use script::SCRIPT_TEMPLATE;

use std::{
    borrow::Cow,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    context::RenderContext,
    error::CoreError,
    identity::format_machine_type,
    template::{Template, TemplateScope},
};

/// Renders [`SCRIPT_TEMPLATE`] for each target and writes it to disk.
#[derive(Debug, Clone)]
pub struct ScriptRenderer {
    template: Template,
}

/// Render context extended with the serialized plan.
struct ScriptScope<'a> {
    ctx: &'a RenderContext,
    plan: &'a str,
}

impl TemplateScope for ScriptScope<'_> {
    fn lookup(&self, path: &[&str]) -> Option<Cow<'_, str>> {
        match path {
            ["Plan"] => Some(Cow::Borrowed(self.plan)),
            // Everything else lands in `#` comment lines.
            _ => self.ctx.lookup(path).map(comment_safe),
        }
    }
}

/// Replace control characters so a value cannot end its comment line.
fn comment_safe(value: Cow<'_, str>) -> Cow<'_, str> {
    if !value.chars().any(char::is_control) {
        return value;
    }
    Cow::Owned(
        value
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect(),
    )
}

impl ScriptRenderer {
    /// Renderer for the built-in driver template.
    pub fn new() -> Result<Self, CoreError> {
        Self::from_source(SCRIPT_TEMPLATE)
    }

    /// Renderer for a custom template source.
    pub fn from_source(src: &str) -> Result<Self, CoreError> {
        let template = Template::parse(src).map_err(|source| CoreError::Render {
            target: "<template>".into(),
            source,
        })?;
        Ok(Self { template })
    }

    /// Produce the script body for one target.
    pub fn render(&self, ctx: &RenderContext) -> Result<String, CoreError> {
        let plan = serde_json::to_string(&ctx.clone().into_plan())?;
        let scope = ScriptScope { ctx, plan: &plan };
        self.template
            .render(&scope)
            .map_err(|source| CoreError::Render {
                target: ctx.target(),
                source,
            })
    }

    /// Render and write `<script_dir>/<machine-type>.sh` with mode 0755,
    /// replacing any previous content.
    pub fn write(&self, ctx: &RenderContext, script_dir: &Path) -> Result<PathBuf, CoreError> {
        let body = self.render(ctx)?;
        let path = script_dir.join(format!("{}.sh", format_machine_type(ctx.machine_type())));

        write_executable(&path, body.as_bytes()).map_err(|source| CoreError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(bytes = body.len(), path = %path.display(), "script written");
        info!(target_name = %ctx.target(), cluster = %ctx.cluster(), path = %path.display(), "generated driver script");
        Ok(path)
    }
}

#[cfg(unix)]
fn write_executable(path: &Path, body: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o755)
        .open(path)?;
    file.write_all(body)?;
    // `mode` only applies on creation.
    file.set_permissions(std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn write_executable(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(body)
}

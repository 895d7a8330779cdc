//! Generation engine: turns a layered report config into one executable
//! orchestration script per (cloud, machine shape) target.
pub mod context;
pub mod error;
pub mod generator;
pub mod identity;
pub mod render;
pub mod resolver;
pub mod template;

pub use context::RenderContext;
pub use error::{CoreError, TemplateError};
pub use generator::{GenerateOptions, Generator};
pub use identity::{ClusterIdentity, format_machine_type};
pub use render::ScriptRenderer;
pub use resolver::{resolve_bench_args, resolve_deploy_args};
pub use template::{Template, TemplateScope};

pub mod prelude {
    pub use crate::error::CoreError;
    pub use crate::generator::{GenerateOptions, Generator};
    pub use crate::identity::ClusterIdentity;
}

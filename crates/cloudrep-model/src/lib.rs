mod domain;
pub use domain::{Arguments, DeployArg, DeployArgs, NodeCount};

mod error;
pub use error::{ModelError, ModelResult};

mod config;
pub use config::{CloudDetails, DEFAULT_OUTPUT_DIR, DEFAULT_REPORT_VERSION, MachineConfig, ReportConfig};

mod kind;
pub use kind::{Benchmark, Bootstrap};

mod strategy;
pub use strategy::{LevelVerdict, PassRule, Ramp};

mod plan;
pub use plan::TargetPlan;

mod run;
pub use run::{LevelReport, RunRecord, RunStatus};

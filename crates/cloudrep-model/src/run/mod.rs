mod record;
pub use record::{LevelReport, RunRecord, RunStatus};

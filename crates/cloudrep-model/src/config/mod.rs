mod report;
pub use report::{CloudDetails, DEFAULT_OUTPUT_DIR, DEFAULT_REPORT_VERSION, MachineConfig, ReportConfig};

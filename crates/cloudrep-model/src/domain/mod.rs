mod args;
pub use args::Arguments;

mod deploy;
pub use deploy::{DeployArg, DeployArgs};

/// Number of nodes in a benchmark cluster.
///
/// The last node drives client-side workloads; the rest host the database.
pub type NodeCount = u32;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Cluster lifecycle steps that may precede benchmark execution.
///
/// Each step is gated independently so an operator can re-run only what is left
/// after a partial failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bootstrap {
    /// Provision the cluster and open the detached session.
    Create,
    /// Push the runner scripts and stage the database binary.
    Upload,
    /// Run the provider-specific setup script on every node.
    Setup,
}

impl Bootstrap {
    /// Every step, in execution order.
    pub const ALL: [Bootstrap; 3] = [Bootstrap::Create, Bootstrap::Upload, Bootstrap::Setup];

    pub fn name(&self) -> &'static str {
        match self {
            Bootstrap::Create => "create",
            Bootstrap::Upload => "upload",
            Bootstrap::Setup => "setup",
        }
    }

    /// Parse a `-b` value, expanding `all`.
    pub fn parse_selection(s: &str) -> ModelResult<Vec<Bootstrap>> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::ALL.to_vec());
        }
        Ok(vec![s.parse()?])
    }
}

impl FromStr for Bootstrap {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Bootstrap::Create),
            "upload" => Ok(Bootstrap::Upload),
            "setup" => Ok(Bootstrap::Setup),
            _ => Err(ModelError::UnknownBootstrap(s.to_string())),
        }
    }
}

impl fmt::Display for Bootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_expands_to_every_step() {
        assert_eq!(
            Bootstrap::parse_selection("ALL").unwrap(),
            vec![Bootstrap::Create, Bootstrap::Upload, Bootstrap::Setup]
        );
    }

    #[test]
    fn single_step() {
        assert_eq!(
            Bootstrap::parse_selection("upload").unwrap(),
            vec![Bootstrap::Upload]
        );
    }

    #[test]
    fn rejects_unknown_step() {
        let err = "destroy".parse::<Bootstrap>().unwrap_err();
        assert!(matches!(err, ModelError::UnknownBootstrap(ref v) if v == "destroy"));
    }
}

use std::fmt;

/// Driver lifecycle.
///
/// Phases only move forward; gated phases (`Creating`, `Uploading`,
/// `SettingUp`, `Running`, `Destroying`) are skipped when not requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Idle,
    Creating,
    Uploading,
    SettingUp,
    Running,
    Waiting,
    Destroying,
    Terminal,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Creating => "creating",
            Phase::Uploading => "uploading",
            Phase::SettingUp => "setting-up",
            Phase::Running => "running",
            Phase::Waiting => "waiting",
            Phase::Destroying => "destroying",
            Phase::Terminal => "terminal",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Concurrency ramp for the load-escalation benchmark.
///
/// Levels run from `start` up to `max` (inclusive when aligned) in steps of `increment`.
/// An increment of zero runs exactly one level at `max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ramp {
    pub start: u32,
    pub max: u32,
    /// `None` derives the step from the range, see [`Ramp::effective_increment`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment: Option<u32>,
}

impl Ramp {
    /// Number of steps the range is split into when no increment is configured.
    pub const DEFAULT_STEPS: u32 = 10;

    pub fn new(start: u32, max: u32, increment: Option<u32>) -> Self {
        Self {
            start,
            max,
            increment,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.max == 0 {
            return Err(ModelError::Invalid("ramp max level cannot be zero".into()));
        }
        if self.start > self.max {
            return Err(ModelError::Invalid(format!(
                "ramp start level {} exceeds max level {}",
                self.start, self.max
            )));
        }
        Ok(())
    }

    /// Configured increment, or `(max - start) / DEFAULT_STEPS` when unset.
    pub fn effective_increment(&self) -> u32 {
        self.increment
            .unwrap_or_else(|| self.max.saturating_sub(self.start) / Self::DEFAULT_STEPS)
    }

    /// Concrete levels in execution order.
    pub fn levels(&self) -> ModelResult<Vec<u32>> {
        self.validate()?;

        let inc = self.effective_increment();
        if inc == 0 {
            return Ok(vec![self.max]);
        }

        let mut out = Vec::new();
        let mut level = self.start;
        while level <= self.max {
            out.push(level);
            match level.checked_add(inc) {
                Some(next) => level = next,
                None => break,
            }
        }
        Ok(out)
    }
}

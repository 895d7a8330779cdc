use serde::{Deserialize, Serialize};

/// Outcome of evaluating one escalation level against a [`PassRule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelVerdict {
    Pass,
    Fail,
}

impl LevelVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, LevelVerdict::Pass)
    }
}

/// Threshold rule applied to the summary line of a level report.
///
/// Columns are 1-based and whitespace separated. A level passes when the
/// throughput column is strictly above `min_throughput` and the latency column
/// strictly below `max_latency`. A trailing `%` on a value is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassRule {
    pub throughput_column: usize,
    pub min_throughput: f64,
    pub latency_column: usize,
    pub max_latency: f64,
}

impl Default for PassRule {
    /// Efficiency (column 3) above 85% and p95 latency (column 7) below 10s.
    fn default() -> Self {
        Self {
            throughput_column: 3,
            min_throughput: 85.0,
            latency_column: 7,
            max_latency: 10_000.0,
        }
    }
}

impl PassRule {
    /// Evaluate a single report line. Missing or non-numeric columns fail the level.
    pub fn evaluate(&self, line: &str) -> LevelVerdict {
        let cols: Vec<&str> = line.split_whitespace().collect();
        let throughput = column(&cols, self.throughput_column);
        let latency = column(&cols, self.latency_column);

        match (throughput, latency) {
            (Some(t), Some(l)) if t > self.min_throughput && l < self.max_latency => {
                LevelVerdict::Pass
            }
            _ => LevelVerdict::Fail,
        }
    }

    /// Evaluate the last non-empty line of a report.
    pub fn evaluate_report(&self, report: &str) -> LevelVerdict {
        match report.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(last) => self.evaluate(last),
            None => LevelVerdict::Fail,
        }
    }
}

fn column(cols: &[&str], idx: usize) -> Option<f64> {
    let raw = cols.get(idx.checked_sub(1)?)?;
    raw.trim_end_matches('%').parse().ok()
}

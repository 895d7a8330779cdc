//! Adaptive load ramp: run one workload at rising concurrency until the pass
//! rule fails, leaving a run record and per-level reports behind.
mod lease;
mod record;
mod wait;
mod workload;

pub use lease::{RunLease, pid_alive, read_holder};
pub use record::{RUN_RECORD_FILE, RecordStore};
pub use wait::wait_for_run;
pub use workload::{CAPACITY_SETTINGS, CockroachWorkload, Workload};

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use cloudrep_model::{LevelReport, PassRule, Ramp, RunRecord, RunStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ExecError, ExecResult};

/// Settings of one escalation run.
#[derive(Debug, Clone)]
pub struct EscalateOptions {
    pub ramp: Ramp,
    pub rule: PassRule,
    pub skip_load: bool,
    /// Take over the run marker even if another instance holds it.
    pub force: bool,
    /// Wiped and recreated at the start of every run.
    pub results_dir: PathBuf,
    pub marker: PathBuf,
}

/// Why the level loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopEnd {
    Exhausted,
    FailedAt(u32),
}

pub struct EscalationController {
    workload: Arc<dyn Workload>,
    opts: EscalateOptions,
}

impl EscalationController {
    pub fn new(workload: Arc<dyn Workload>, opts: EscalateOptions) -> ExecResult<Self> {
        opts.ramp.validate()?;
        Ok(Self { workload, opts })
    }

    /// Run the ramp under an exclusive lease.
    ///
    /// A failed pass rule is not an error: the record ends `succeeded` if the ramp
    /// was exhausted or any level passed, `failed` otherwise. Workload errors and
    /// cancellation are recorded and then returned. Cancellation takes effect at
    /// the next phase or level boundary.
    pub async fn run(&self, cancel: &CancellationToken) -> ExecResult<RunRecord> {
        let lease = RunLease::acquire(&self.opts.marker, self.opts.force)?;
        reset_dir(&self.opts.results_dir)?;

        let store = RecordStore::new(&self.opts.results_dir);
        let mut record = RunRecord::started(lease.pid(), now_ms());
        store.save(&record)?;
        info!(
            results = %self.opts.results_dir.display(),
            start = self.opts.ramp.start,
            max = self.opts.ramp.max,
            "escalation started"
        );

        let outcome = self.escalate(&mut record, &store, cancel).await;
        let (status, reason, err) = match outcome {
            Ok(LoopEnd::Exhausted) => (RunStatus::Succeeded, None, None),
            Ok(LoopEnd::FailedAt(level)) => {
                let reason = format!("level {level} failed the pass rule");
                if record.any_passed() {
                    (RunStatus::Succeeded, Some(reason), None)
                } else {
                    (RunStatus::Failed, Some(reason), None)
                }
            }
            Err(ExecError::Canceled) => (RunStatus::Canceled, Some("canceled".into()), Some(ExecError::Canceled)),
            Err(e) => (RunStatus::Failed, Some(e.to_string()), Some(e)),
        };

        record.finish(status, now_ms(), reason);
        store.save(&record)?;
        info!(status = %record.status, levels = record.levels.len(), "escalation finished");
        drop(lease);

        match err {
            Some(e) => Err(e),
            None => Ok(record),
        }
    }

    async fn escalate(
        &self,
        record: &mut RunRecord,
        store: &RecordStore,
        cancel: &CancellationToken,
    ) -> ExecResult<LoopEnd> {
        let levels = self.opts.ramp.levels()?;

        check(cancel)?;
        self.workload.tune().await?;

        if self.opts.skip_load {
            debug!("skipping data load");
        } else {
            check(cancel)?;
            self.workload.load().await?;
        }

        for level in levels {
            check(cancel)?;
            let report = self.opts.results_dir.join(format!("level-{level}.log"));
            info!(level, "running level");
            self.workload.run_level(level, &report).await?;

            let verdict = self.opts.rule.evaluate_report(&fs::read_to_string(&report)?);
            record.levels.push(LevelReport {
                level,
                report,
                verdict,
            });
            store.save(record)?;

            if !verdict.is_pass() {
                warn!(level, "pass rule failed; stopping");
                return Ok(LoopEnd::FailedAt(level));
            }
            info!(level, "level passed");
        }
        Ok(LoopEnd::Exhausted)
    }
}

fn check(cancel: &CancellationToken) -> ExecResult<()> {
    if cancel.is_cancelled() {
        return Err(ExecError::Canceled);
    }
    Ok(())
}

fn reset_dir(dir: &Path) -> ExecResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use cloudrep_model::LevelVerdict;

    use super::*;

    /// Writes canned report lines per level and records what ran.
    #[derive(Default)]
    struct ScriptedWorkload {
        lines: Vec<(u32, &'static str)>,
        calls: Mutex<Vec<String>>,
        fail_at: Option<u32>,
        cancel_after_level: Option<(u32, CancellationToken)>,
        /// Marker whose presence is checked while levels run.
        marker: Option<PathBuf>,
    }

    impl ScriptedWorkload {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Workload for ScriptedWorkload {
        async fn tune(&self) -> ExecResult<()> {
            self.calls.lock().unwrap().push("tune".into());
            Ok(())
        }

        async fn load(&self) -> ExecResult<()> {
            self.calls.lock().unwrap().push("load".into());
            Ok(())
        }

        async fn run_level(&self, level: u32, report: &Path) -> ExecResult<()> {
            self.calls.lock().unwrap().push(format!("level {level}"));
            if let Some(marker) = &self.marker {
                assert!(marker.exists(), "lease must be held while running");
            }
            if self.fail_at == Some(level) {
                return Err(ExecError::CommandFailed {
                    command: "workload run".into(),
                    code: Some(1),
                    output: "connection refused".into(),
                });
            }
            let line = self
                .lines
                .iter()
                .find(|(l, _)| *l == level)
                .map(|(_, line)| *line)
                .unwrap_or("");
            fs::write(report, format!("_elapsed___errors\n{line}\n")).unwrap();
            if let Some((after, token)) = &self.cancel_after_level {
                if *after == level {
                    token.cancel();
                }
            }
            Ok(())
        }
    }

    const PASS: &str = "600.0s 0 86.0% 120.0 100.0 200.0 9000.0 12000.0";
    const FAIL: &str = "600.0s 0 84.0% 120.0 100.0 200.0 9500.0 12000.0";

    fn options(dir: &Path, skip_load: bool) -> EscalateOptions {
        EscalateOptions {
            ramp: Ramp::new(2500, 3000, Some(250)),
            rule: PassRule::default(),
            skip_load,
            force: false,
            results_dir: dir.join("tpcc-results"),
            marker: dir.join("tpcc.pid"),
        }
    }

    #[tokio::test]
    async fn stops_at_first_failed_level_but_keeps_success() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), false);
        let workload = Arc::new(ScriptedWorkload {
            lines: vec![(2500, PASS), (2750, FAIL), (3000, PASS)],
            marker: Some(opts.marker.clone()),
            ..Default::default()
        });

        let ctl = EscalationController::new(workload.clone(), opts.clone()).unwrap();
        let record = ctl.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(workload.calls(), vec!["tune", "load", "level 2500", "level 2750"]);
        assert_eq!(record.status, RunStatus::Succeeded);
        let verdicts: Vec<_> = record.levels.iter().map(|l| (l.level, l.verdict)).collect();
        assert_eq!(
            verdicts,
            vec![(2500, LevelVerdict::Pass), (2750, LevelVerdict::Fail)]
        );
        assert!(opts.results_dir.join("level-2750.log").exists());
        assert!(!opts.results_dir.join("level-3000.log").exists());

        let stored = RecordStore::new(&opts.results_dir).load().unwrap().unwrap();
        assert_eq!(stored, record);
        assert!(!opts.marker.exists());
    }

    #[tokio::test]
    async fn exhausted_ramp_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        let workload = Arc::new(ScriptedWorkload {
            lines: vec![(2500, PASS), (2750, PASS), (3000, PASS)],
            ..Default::default()
        });

        let record = EscalationController::new(workload.clone(), opts.clone())
            .unwrap()
            .run(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(record.status, RunStatus::Succeeded);
        assert_eq!(record.levels.len(), 3);
        assert!(!workload.calls().contains(&"load".to_string()));
        assert!(!opts.marker.exists());
    }

    #[tokio::test]
    async fn failing_first_level_is_a_failed_run_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        let workload = Arc::new(ScriptedWorkload {
            lines: vec![(2500, FAIL)],
            ..Default::default()
        });

        let record = EscalationController::new(workload, opts.clone())
            .unwrap()
            .run(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(record.status, RunStatus::Failed);
        assert!(record.reason.unwrap().contains("2500"));
        assert!(!RecordStore::new(&opts.results_dir).succeeded().unwrap());
        assert!(!opts.marker.exists());
    }

    #[tokio::test]
    async fn unparsable_report_fails_the_level() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        let workload = Arc::new(ScriptedWorkload {
            lines: vec![(2500, PASS), (2750, "garbage")],
            ..Default::default()
        });

        let record = EscalationController::new(workload.clone(), opts)
            .unwrap()
            .run(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(record.levels.last().unwrap().verdict, LevelVerdict::Fail);
        assert_eq!(workload.calls().last().unwrap(), "level 2750");
    }

    #[tokio::test]
    async fn workload_error_is_recorded_and_releases_lease() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        let workload = Arc::new(ScriptedWorkload {
            lines: vec![(2500, PASS)],
            fail_at: Some(2750),
            ..Default::default()
        });

        let err = EscalationController::new(workload, opts.clone())
            .unwrap()
            .run(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::CommandFailed { .. }));

        let stored = RecordStore::new(&opts.results_dir).load().unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Failed);
        assert!(stored.reason.unwrap().contains("connection refused"));
        assert!(!opts.marker.exists());
    }

    #[tokio::test]
    async fn cancellation_stops_at_level_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        let cancel = CancellationToken::new();
        let workload = Arc::new(ScriptedWorkload {
            lines: vec![(2500, PASS), (2750, PASS), (3000, PASS)],
            cancel_after_level: Some((2500, cancel.clone())),
            ..Default::default()
        });

        let err = EscalationController::new(workload.clone(), opts.clone())
            .unwrap()
            .run(&cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Canceled));
        assert_eq!(workload.calls(), vec!["tune", "level 2500"]);

        let stored = RecordStore::new(&opts.results_dir).load().unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Canceled);
        assert_eq!(stored.levels.len(), 1);
        assert!(!opts.marker.exists());
    }

    #[tokio::test]
    async fn held_lease_refuses_to_start_and_keeps_marker() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        fs::write(&opts.marker, "12345\n").unwrap();
        let workload = Arc::new(ScriptedWorkload::default());

        let err = EscalationController::new(workload.clone(), opts.clone())
            .unwrap()
            .run(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::LeaseHeld { pid: Some(12345), .. }));
        assert!(workload.calls().is_empty());
        assert!(opts.marker.exists());
    }

    #[tokio::test]
    async fn previous_results_are_wiped() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), true);
        fs::create_dir_all(&opts.results_dir).unwrap();
        fs::write(opts.results_dir.join("level-9999.log"), "stale").unwrap();

        let workload = Arc::new(ScriptedWorkload {
            lines: vec![(2500, FAIL)],
            ..Default::default()
        });
        EscalationController::new(workload, opts.clone())
            .unwrap()
            .run(&CancellationToken::new())
            .await
            .unwrap();
        assert!(!opts.results_dir.join("level-9999.log").exists());
    }

    #[test]
    fn invalid_ramp_is_rejected_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let opts = EscalateOptions {
            ramp: Ramp::new(3000, 2500, None),
            ..options(dir.path(), true)
        };
        let res = EscalationController::new(Arc::new(ScriptedWorkload::default()), opts);
        assert!(matches!(res, Err(ExecError::Model(_))));
    }
}

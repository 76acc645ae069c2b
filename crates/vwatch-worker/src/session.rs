//! Single active run per session, with supersession.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use vwatch_media::VideoSource;
use vwatch_models::{RunId, RunSnapshot, RunStatus};

use crate::metrics;
use crate::orchestrator::PipelineOrchestrator;

/// What the session knows about a run ID.
#[derive(Debug, Clone)]
pub enum RunLookup {
    /// The run is the session's current run.
    Current(RunSnapshot),
    /// The run was replaced by a newer one or handed off to the library.
    Retired,
    /// The ID was never issued by this session.
    Unknown,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TakeError {
    #[error("no current run")]
    NoRun,
    #[error("run is {0}, not completed")]
    NotCompleted(RunStatus),
}

struct CurrentRun {
    snapshot: RunSnapshot,
    task: Option<JoinHandle<()>>,
}

/// How many retired run IDs are remembered. Older IDs look never issued.
pub const MAX_RETIRED_RUNS: usize = 1024;

/// Recently retired run IDs, oldest evicted first.
struct RetiredRuns {
    capacity: usize,
    order: VecDeque<RunId>,
    ids: HashSet<RunId>,
}

impl RetiredRuns {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
        }
    }

    fn insert(&mut self, run_id: RunId) {
        if !self.ids.insert(run_id.clone()) {
            return;
        }
        self.order.push_back(run_id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn contains(&self, run_id: &RunId) -> bool {
        self.ids.contains(run_id)
    }

    fn remove(&mut self, run_id: &RunId) {
        if self.ids.remove(run_id) {
            self.order.retain(|id| id != run_id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.order.len()
    }
}

impl Default for RetiredRuns {
    fn default() -> Self {
        Self::with_capacity(MAX_RETIRED_RUNS)
    }
}

#[derive(Default)]
struct SessionState {
    current: Option<CurrentRun>,
    retired: RetiredRuns,
}

impl SessionState {
    fn retire_current(&mut self) -> Option<CurrentRun> {
        let previous = self.current.take()?;
        self.retired.insert(previous.snapshot.run_id.clone());
        Some(previous)
    }
}

/// Holder of the current run.
///
/// Starting a run aborts the previous run's task. Snapshots published under
/// any ID other than the current one are dropped. Clones share state.
#[derive(Clone, Default)]
pub struct RunSession {
    state: Arc<RwLock<SessionState>>,
}

impl RunSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a run over `source`, superseding any run in flight.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        &self,
        orchestrator: Arc<PipelineOrchestrator>,
        mut source: Box<dyn VideoSource>,
        name: impl Into<String>,
    ) -> RunSnapshot {
        let name = name.into();
        let run_id = RunId::new();
        let initial = RunSnapshot::new(run_id.clone(), source.source_ref(), name.clone());

        let previous = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let previous = state.retire_current();
            state.current = Some(CurrentRun {
                snapshot: initial.clone(),
                task: None,
            });
            previous
        };
        if let Some(previous) = previous {
            if let Some(task) = previous.task {
                task.abort();
            }
            if !previous.snapshot.is_terminal() {
                metrics::record_run_superseded();
                info!(
                    superseded = %previous.snapshot.run_id,
                    run_id = %run_id,
                    "Superseding in-flight run"
                );
            }
        }

        let session = self.clone();
        let task_run_id = run_id.clone();
        let task = tokio::spawn(async move {
            let snapshot = orchestrator
                .run_with_progress(task_run_id, source.as_mut(), &name, |snapshot| {
                    session.publish(snapshot);
                })
                .await;
            session.publish(&snapshot);
        });

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.current.as_mut() {
            Some(current) if current.snapshot.run_id == run_id => current.task = Some(task),
            _ => task.abort(),
        }

        initial
    }

    /// Record a snapshot. Returns `false` when it belongs to a stale run.
    pub fn publish(&self, snapshot: &RunSnapshot) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.current.as_mut() {
            Some(current) if current.snapshot.run_id == snapshot.run_id => {
                if current.snapshot.is_terminal() {
                    return false;
                }
                current.snapshot = snapshot.clone();
                true
            }
            _ => {
                debug!(run_id = %snapshot.run_id, "Discarding update from stale run");
                false
            }
        }
    }

    /// Snapshot of the current run, if any.
    pub fn current(&self) -> Option<RunSnapshot> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.current.as_ref().map(|c| c.snapshot.clone())
    }

    pub fn lookup(&self, run_id: &RunId) -> RunLookup {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match state.current.as_ref() {
            Some(current) if &current.snapshot.run_id == run_id => {
                RunLookup::Current(current.snapshot.clone())
            }
            _ if state.retired.contains(run_id) => RunLookup::Retired,
            _ => RunLookup::Unknown,
        }
    }

    /// Hand off the current run if it completed, clearing it from the session.
    pub fn take_completed(&self) -> Result<RunSnapshot, TakeError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let status = state
            .current
            .as_ref()
            .map(|c| c.snapshot.status)
            .ok_or(TakeError::NoRun)?;
        if status != RunStatus::Completed {
            return Err(TakeError::NotCompleted(status));
        }
        state
            .retire_current()
            .map(|c| c.snapshot)
            .ok_or(TakeError::NoRun)
    }

    /// Put a previously taken run back, e.g. after the hand-off failed.
    pub fn restore(&self, snapshot: RunSnapshot) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.current.is_some() {
            return false;
        }
        state.retired.remove(&snapshot.run_id);
        state.current = Some(CurrentRun {
            snapshot,
            task: None,
        });
        true
    }
}

//! Background risk runs over a shared repository.
//!
//! At most one run is in flight per runner. A second `spawn` while the busy
//! flag is held is refused with [`RunnerError::Busy`]; the flag is released
//! when the worker finishes, panics, or never starts.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use taxrisk_core::{
    RiskRepository, RiskRunError, RunReport, ScoringParams, compute_and_update_risk_with,
};

const WORKER_THREAD_NAME: &str = "taxrisk-run";

// --- Runner error ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RunnerError {
    /// Another run holds the repository.
    Busy,
    /// A previous run panicked while holding the repository lock.
    Poisoned,
    /// The worker thread could not be started.
    Spawn(String),
    Run(RiskRunError),
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "a risk run is already in progress"),
            Self::Poisoned => write!(f, "repository lock poisoned by an earlier run"),
            Self::Spawn(reason) => write!(f, "failed to start risk run worker: {reason}"),
            Self::Run(e) => write!(f, "risk run failed: {e}"),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Run(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RiskRunError> for RunnerError {
    fn from(e: RiskRunError) -> Self {
        Self::Run(e)
    }
}

// --- Metrics --------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RunnerMetrics {
    runs_started: AtomicU64,
    runs_completed: AtomicU64,
    runs_failed: AtomicU64,
    runs_rejected_busy: AtomicU64,
}

impl RunnerMetrics {
    pub fn runs_started(&self) -> u64 {
        self.runs_started.load(Ordering::Relaxed)
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }

    pub fn runs_failed(&self) -> u64 {
        self.runs_failed.load(Ordering::Relaxed)
    }

    pub fn runs_rejected_busy(&self) -> u64 {
        self.runs_rejected_busy.load(Ordering::Relaxed)
    }
}

// --- Busy guard -----------------------------------------------------------

struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// --- Runner ---------------------------------------------------------------

/// Owns a repository and runs scoring passes over it, one at a time.
pub struct RiskRunner<R> {
    repo: Arc<Mutex<R>>,
    busy: Arc<AtomicBool>,
    params: ScoringParams,
    metrics: Arc<RunnerMetrics>,
}

impl<R: RiskRepository + Send + 'static> RiskRunner<R> {
    /// Runner with the reference scoring parameters.
    pub fn new(repo: R) -> Self {
        Self::with_params(repo, ScoringParams::default())
    }

    pub fn with_params(repo: R, params: ScoringParams) -> Self {
        Self {
            repo: Arc::new(Mutex::new(repo)),
            busy: Arc::new(AtomicBool::new(false)),
            params,
            metrics: Arc::new(RunnerMetrics::default()),
        }
    }

    /// Shared handle to the repository. Lock it only while no run is in flight
    /// to observe a consistent snapshot.
    pub fn repository(&self) -> Arc<Mutex<R>> {
        Arc::clone(&self.repo)
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    pub fn metrics(&self) -> &RunnerMetrics {
        &self.metrics
    }

    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start a run on a worker thread. The handle yields the run's report.
    pub fn spawn(
        &self,
        seed: u64,
    ) -> Result<JoinHandle<Result<RunReport, RunnerError>>, RunnerError> {
        let guard = self.acquire_busy(seed)?;
        let repo = Arc::clone(&self.repo);
        let metrics = Arc::clone(&self.metrics);
        let params = self.params;

        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _guard = guard;
                run_locked(&repo, seed, &params, &metrics)
            })
            .map_err(|e| RunnerError::Spawn(e.to_string()))
    }

    /// Run on the calling thread, still honoring the one-run-at-a-time rule.
    pub fn run_blocking(&self, seed: u64) -> Result<RunReport, RunnerError> {
        let _guard = self.acquire_busy(seed)?;
        run_locked(&self.repo, seed, &self.params, &self.metrics)
    }

    fn acquire_busy(&self, seed: u64) -> Result<BusyGuard, RunnerError> {
        match BusyGuard::acquire(&self.busy) {
            Some(guard) => Ok(guard),
            None => {
                self.metrics.runs_rejected_busy.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("RiskRunner refused run: busy seed={}", seed);
                Err(RunnerError::Busy)
            }
        }
    }
}

fn run_locked<R: RiskRepository>(
    repo: &Mutex<R>,
    seed: u64,
    params: &ScoringParams,
    metrics: &RunnerMetrics,
) -> Result<RunReport, RunnerError> {
    metrics.runs_started.fetch_add(1, Ordering::Relaxed);
    let mut guard = match repo.lock() {
        Ok(guard) => guard,
        Err(_) => {
            metrics.runs_failed.fetch_add(1, Ordering::Relaxed);
            return Err(RunnerError::Poisoned);
        }
    };
    match compute_and_update_risk_with(&mut *guard, seed, params) {
        Ok(report) => {
            metrics.runs_completed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                "RiskRunner finished seed={} companies={}",
                seed,
                report.companies.len()
            );
            Ok(report)
        }
        Err(e) => {
            metrics.runs_failed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("RiskRunner failed seed={} error={}", seed, e);
            Err(e.into())
        }
    }
}

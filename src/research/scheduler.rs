//! Background job scheduling
//!
//! Each submitted user message gets one research job. A message id stays
//! claimed while its job runs, so a retried submit cannot start a second job
//! for the same message; the claim is released when the job ends.

use crate::research::orchestrator::ResearchOrchestrator;
use crate::types::ModelKind;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Releases a message id when the job holding it ends, even by panic
struct Claim {
    running: Arc<Mutex<HashSet<String>>>,
    message_id: String,
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.running.lock().remove(&self.message_id);
    }
}

pub struct JobScheduler {
    orchestrator: Arc<ResearchOrchestrator>,
    running: Arc<Mutex<HashSet<String>>>,
    jobs: Mutex<Vec<(String, JoinHandle<()>)>>,
}

impl JobScheduler {
    pub fn new(orchestrator: Arc<ResearchOrchestrator>) -> Self {
        Self {
            orchestrator,
            running: Arc::new(Mutex::new(HashSet::new())),
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the research job for `message_id`.
    ///
    /// Returns `false` without spawning while a job for the message is running.
    pub fn schedule(&self, message_id: &str, model: ModelKind) -> bool {
        if !self.running.lock().insert(message_id.to_string()) {
            warn!(message_id, "Research job already running, ignoring");
            return false;
        }

        let claim = Claim {
            running: Arc::clone(&self.running),
            message_id: message_id.to_string(),
        };
        let orchestrator = Arc::clone(&self.orchestrator);
        let handle = tokio::spawn(async move {
            if let Err(e) = orchestrator.run(&claim.message_id, model).await {
                error!(message_id = %claim.message_id, error = %e, "Research job aborted");
            }
        });

        let mut jobs = self.jobs.lock();
        jobs.retain(|(_, job)| !job.is_finished());
        jobs.push((message_id.to_string(), handle));
        true
    }

    /// Jobs spawned and not yet finished
    pub fn in_flight(&self) -> usize {
        self.running.lock().len()
    }

    /// Wait until every spawned job has finished, including jobs scheduled
    /// while waiting.
    pub async fn wait_idle(&self) {
        loop {
            let pending: Vec<(String, JoinHandle<()>)> = self.jobs.lock().drain(..).collect();
            if pending.is_empty() {
                return;
            }
            for (message_id, job) in pending {
                if let Err(e) = job.await {
                    error!(message_id, error = %e, "Research job panicked");
                }
            }
        }
    }
}

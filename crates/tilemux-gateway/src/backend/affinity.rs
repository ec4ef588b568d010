//! In-memory [`AffinityTable`] implementation.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tilemux_kernel::{AffinityTable, BackendNode, JobId};
use tracing::debug;

struct Binding {
    node: Arc<BackendNode>,
    added_at: Instant,
}

/// [`AffinityTable`] backed by a `DashMap`.
///
/// With a retention window set, [`gc`](InMemoryAffinityTable::gc) forgets
/// jobs recorded longer ago than the window.  Without one, entries live
/// for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryAffinityTable {
    jobs: DashMap<JobId, Binding>,
    retention: Option<Duration>,
}

impl InMemoryAffinityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: forget jobs older than `retention` on each `gc`.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Remove entries outside the retention window.
    ///
    /// Call this periodically from a background task.
    pub fn gc(&self) {
        let Some(retention) = self.retention else {
            return;
        };
        let before = self.jobs.len();
        let now = Instant::now();
        self.jobs
            .retain(|_, binding| now.duration_since(binding.added_at) < retention);
        let removed = before.saturating_sub(self.jobs.len());
        if removed > 0 {
            debug!(removed, "expired job affinities");
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl AffinityTable for InMemoryAffinityTable {
    fn initialize(&self) {
        self.jobs.clear();
    }

    fn add(&self, job: JobId, node: Arc<BackendNode>) {
        self.jobs.insert(
            job,
            Binding {
                node,
                added_at: Instant::now(),
            },
        );
    }

    fn lookup(&self, job: &JobId) -> Option<Arc<BackendNode>> {
        self.jobs.get(job).map(|binding| Arc::clone(&binding.node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = "11111111-1111-1111-1111-111111111111";

    fn node(id: &str) -> Arc<BackendNode> {
        Arc::new(BackendNode::parse(id, "http://localhost:3000").unwrap())
    }

    #[test]
    fn add_then_lookup() {
        let table = InMemoryAffinityTable::new();
        let job = JobId::parse(JOB).unwrap();
        assert!(table.lookup(&job).is_none());

        table.add(job.clone(), node("n1"));
        assert_eq!(table.lookup(&job).unwrap().id(), "n1");
    }

    #[test]
    fn add_overwrites() {
        let table = InMemoryAffinityTable::new();
        let job = JobId::parse(JOB).unwrap();
        table.add(job.clone(), node("n1"));
        table.add(job.clone(), node("n2"));
        assert_eq!(table.lookup(&job).unwrap().id(), "n2");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn initialize_clears_entries() {
        let table = InMemoryAffinityTable::new();
        table.add(JobId::parse(JOB).unwrap(), node("n1"));
        table.initialize();
        assert!(table.is_empty());
    }

    #[test]
    fn gc_respects_retention() {
        let keep = InMemoryAffinityTable::new();
        keep.add(JobId::parse(JOB).unwrap(), node("n1"));
        keep.gc();
        assert_eq!(keep.len(), 1);

        let expire = InMemoryAffinityTable::new().with_retention(Duration::ZERO);
        expire.add(JobId::parse(JOB).unwrap(), node("n1"));
        expire.gc();
        assert!(expire.is_empty());
    }
}

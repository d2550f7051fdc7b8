//! Findings store: the shared, append-only collection of findings.

use crate::ports::usage_log::{UsageEvent, UsageLog};
use council_domain::{DedupGranularity, Dedupe, ExpertKind, Finding, FindingId, dedupe_findings};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct StoreInner {
    findings: Vec<Finding>,
    next_id: u32,
}

/// Concurrency-safe accumulator of findings from all expert sessions.
///
/// Appends are serialized through one mutex that is never held across an
/// await, so arrival order is the global order and no append is lost. Each
/// append assigns the next [`FindingId`].
pub struct FindingsStore {
    inner: Mutex<StoreInner>,
    granularity: DedupGranularity,
    usage: Option<Arc<dyn UsageLog>>,
}

impl FindingsStore {
    pub fn new(granularity: DedupGranularity) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                findings: Vec::new(),
                next_id: 1,
            }),
            granularity,
            usage: None,
        }
    }

    /// Mirror every appended finding to a usage log
    pub fn with_usage_log(mut self, usage: Arc<dyn UsageLog>) -> Self {
        self.usage = Some(usage);
        self
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn granularity(&self) -> DedupGranularity {
        self.granularity
    }

    /// Append a finding, returning the id it was assigned
    pub fn append(&self, finding: Finding) -> FindingId {
        let stored = {
            let mut inner = self.lock();
            let id = FindingId(inner.next_id);
            inner.next_id += 1;
            let stored = finding.with_id(id);
            inner.findings.push(stored.clone());
            stored
        };
        if let Some(usage) = &self.usage {
            usage.record(UsageEvent::finding(&stored));
        }
        stored.id
    }

    /// Append findings in order; they stay contiguous
    pub fn append_all(&self, findings: impl IntoIterator<Item = Finding>) -> Vec<FindingId> {
        let stored: Vec<Finding> = {
            let mut inner = self.lock();
            findings
                .into_iter()
                .map(|finding| {
                    let id = FindingId(inner.next_id);
                    inner.next_id += 1;
                    let stored = finding.with_id(id);
                    inner.findings.push(stored.clone());
                    stored
                })
                .collect()
        };
        if let Some(usage) = &self.usage {
            for finding in &stored {
                usage.record(UsageEvent::finding(finding));
            }
        }
        stored.into_iter().map(|f| f.id).collect()
    }

    /// Every finding, in arrival order
    pub fn all(&self) -> Vec<Finding> {
        self.lock().findings.clone()
    }

    pub fn get(&self, id: FindingId) -> Option<Finding> {
        self.lock().findings.iter().find(|f| f.id == id).cloned()
    }

    pub fn by_expert(&self, expert: ExpertKind) -> Vec<Finding> {
        self.lock()
            .findings
            .iter()
            .filter(|f| f.expert == expert)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.lock().findings.len()
    }

    /// Collapse duplicates with the store's granularity
    pub fn dedupe(&self) -> Dedupe {
        let snapshot = self.all();
        dedupe_findings(&snapshot, self.granularity)
    }

    /// Explicit revisions as `(revision, revised)` pairs
    pub fn supersessions(&self) -> Vec<(FindingId, FindingId)> {
        self.lock()
            .findings
            .iter()
            .filter_map(|f| f.supersedes.map(|previous| (f.id, previous)))
            .collect()
    }
}

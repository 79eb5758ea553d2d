// In-process submission store.
// Invariants: the log stays ascending by timestamp even when appends race;
// purging trims submitter records with the same cutoff as the log.

use std::collections::{HashMap, VecDeque};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::RwLock;
use viridis_core::model::{Submission, SubmitterRecord};

use super::{StoreResult, SubmissionStore};

#[derive(Default)]
struct MemoryInner {
    current_color: Option<String>,
    log: VecDeque<Submission>,
    submitters: HashMap<String, SubmitterRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.log.len()
    }
}

impl SubmissionStore for MemoryStore {
    fn set_current_color<'a>(&'a self, hex: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            self.inner.write().await.current_color = Some(hex.to_string());
            Ok(())
        }
        .boxed()
    }

    fn current_color(&self) -> BoxFuture<'_, StoreResult<Option<String>>> {
        async move { Ok(self.inner.read().await.current_color.clone()) }.boxed()
    }

    fn record_submission<'a>(&'a self, submission: &'a Submission) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            let mut inner = self.inner.write().await;
            let at = match inner.log.back() {
                Some(last) if last.timestamp > submission.timestamp => inner
                    .log
                    .partition_point(|existing| existing.timestamp <= submission.timestamp),
                _ => inner.log.len(),
            };
            inner.log.insert(at, submission.clone());
            inner
                .submitters
                .insert(submission.id.clone(), SubmitterRecord::from(submission));
            Ok(())
        }
        .boxed()
    }

    fn recent_submissions(&self, window_ms: u64, now_ms: u64) -> BoxFuture<'_, StoreResult<Vec<Submission>>> {
        async move {
            let since_ms = now_ms.saturating_sub(window_ms);
            let inner = self.inner.read().await;
            let start = inner.log.partition_point(|existing| existing.timestamp < since_ms);
            Ok(inner.log.iter().skip(start).cloned().collect())
        }
        .boxed()
    }

    fn purge_older_than(&self, cutoff_ms: u64) -> BoxFuture<'_, StoreResult<usize>> {
        async move {
            let mut inner = self.inner.write().await;
            let stale = inner.log.partition_point(|existing| existing.timestamp < cutoff_ms);
            inner.log.drain(..stale);
            inner.submitters.retain(|_, record| record.timestamp >= cutoff_ms);
            Ok(stale)
        }
        .boxed()
    }

    fn submitter<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<SubmitterRecord>>> {
        async move { Ok(self.inner.read().await.submitters.get(id).cloned()) }.boxed()
    }
}

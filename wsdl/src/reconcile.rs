//! Keeps the persisted operation set of a source in line with a fresh parse.

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::info;

use super::{
    error::StoreError,
    render::{render, RenderFormat},
    resolver::Resolution,
    types::{Direction, OperationSignature},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub name: String,
    pub style: String,
    pub documentation: String,
    pub rendered_input: String,
    pub rendered_output: String,
}

/// The persistence sink, keyed by `(source, operation name)`.
pub trait OperationStore: Send + Sync {
    fn list_existing(&self, source: &str) -> Result<Vec<OperationRecord>, StoreError>;

    fn upsert(&self, source: &str, record: &OperationRecord) -> Result<(), StoreError>;

    fn delete(&self, source: &str, name: &str) -> Result<(), StoreError>;
}

#[derive(Default, Debug)]
pub struct MemoryStore {
    sources: Mutex<HashMap<String, IndexMap<String, OperationRecord>>>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub updates: Vec<OperationRecord>,
    pub deletes: Vec<String>,
    pub creates: Vec<OperationRecord>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub updated: usize,
    pub deleted: usize,
    pub created: usize,
}

/// Serializes reconciliation per source; different sources never block each other.
#[derive(Default, Debug)]
pub struct Reconciler {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, source: &str) -> Vec<OperationRecord> {
        self.sources
            .lock()
            .get(source)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl OperationStore for MemoryStore {
    fn list_existing(&self, source: &str) -> Result<Vec<OperationRecord>, StoreError> {
        Ok(self.records(source))
    }

    fn upsert(&self, source: &str, record: &OperationRecord) -> Result<(), StoreError> {
        self.sources
            .lock()
            .entry(source.to_owned())
            .or_default()
            .insert(record.name.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, source: &str, name: &str) -> Result<(), StoreError> {
        if let Some(records) = self.sources.lock().get_mut(source) {
            records.shift_remove(name);
        }

        Ok(())
    }
}

impl ReconcilePlan {
    /// Matches previous records to the new set purely by operation name.
    ///
    /// Matched records are overwritten even when nothing changed.
    pub fn new(previous: &[OperationRecord], current: &IndexMap<String, OperationRecord>) -> Self {
        let mut remaining = current.clone();
        let mut plan = Self::default();

        for record in previous {
            match remaining.shift_remove(&record.name) {
                Some(update) => plan.updates.push(update),
                None => plan.deletes.push(record.name.clone()),
            }
        }

        plan.creates = remaining.into_values().collect();
        plan
    }

    pub fn summary(&self) -> ReconcileSummary {
        ReconcileSummary {
            updated: self.updates.len(),
            deleted: self.deletes.len(),
            created: self.creates.len(),
        }
    }

    pub fn apply<S: OperationStore + ?Sized>(&self, store: &S, source: &str) -> Result<(), StoreError> {
        for record in &self.updates {
            store.upsert(source, record)?;
        }

        for name in &self.deletes {
            store.delete(source, name)?;
        }

        for record in &self.creates {
            store.upsert(source, record)?;
        }

        Ok(())
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    fn source_lock(&self, source: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(source.to_owned())
            .or_default()
            .clone()
    }

    /// Drops the source's lock once no run holds or waits on it, so the map
    /// only carries sources with a reconciliation in flight.
    fn release(&self, source: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock();
        drop(lock);

        if locks.get(source).map_or(false, |lock| Arc::strong_count(lock) == 1) {
            locks.remove(source);
        }
    }

    /// Plans against the store's current records and applies the plan while
    /// holding the source's lock.
    pub fn reconcile<S: OperationStore + ?Sized>(
        &self,
        store: &S,
        source: &str,
        current: &IndexMap<String, OperationRecord>,
    ) -> Result<ReconcileSummary, StoreError> {
        let lock = self.source_lock(source);

        let result = {
            let _guard = lock.lock();

            store.list_existing(source).and_then(|previous| {
                let plan = ReconcilePlan::new(&previous, current);
                plan.apply(store, source).map(|_| plan.summary())
            })
        };

        self.release(source, lock);

        let summary = result?;
        info!(
            "reconciled {}: {} updated, {} deleted, {} created",
            source, summary.updated, summary.deleted, summary.created
        );

        Ok(summary)
    }
}

/// Joins the signature feed with the resolver output, one record per
/// signature. Anything the resolver could not provide is left empty.
pub fn assemble_records(
    signatures: &IndexMap<String, OperationSignature>,
    resolution: &Resolution,
    format: RenderFormat,
) -> IndexMap<String, OperationRecord> {
    signatures
        .keys()
        .map(|name| {
            let resolved = resolution.operations.get(name);
            let rendered = |direction: Direction| {
                resolved
                    .and_then(|operation| operation.shape(direction))
                    .map(|shape| render(shape, format))
                    .unwrap_or_default()
            };

            let record = OperationRecord {
                name: name.clone(),
                style: resolved
                    .and_then(|operation| operation.style.clone())
                    .unwrap_or_default(),
                documentation: resolved
                    .and_then(|operation| operation.documentation.clone())
                    .unwrap_or_default(),
                rendered_input: rendered(Direction::Input),
                rendered_output: rendered(Direction::Output),
            };

            (name.clone(), record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    fn record(name: &str, style: &str) -> OperationRecord {
        OperationRecord {
            name: name.to_owned(),
            style: style.to_owned(),
            documentation: String::new(),
            rendered_input: String::new(),
            rendered_output: String::new(),
        }
    }

    fn current(names: &[&str]) -> IndexMap<String, OperationRecord> {
        names
            .iter()
            .map(|name| (name.to_string(), record(name, "document")))
            .collect()
    }

    #[test]
    fn plan_updates_deletes_and_creates() {
        let previous = [record("A", "rpc"), record("B", "rpc")];
        let plan = ReconcilePlan::new(&previous, &current(&["B", "C"]));

        assert_eq!(plan.deletes, ["A"]);
        assert_eq!(plan.updates, [record("B", "document")]);
        assert_eq!(plan.creates, [record("C", "document")]);

        let reversed = [record("B", "rpc"), record("A", "rpc")];
        let plan = ReconcilePlan::new(&reversed, &current(&["C", "B"]));
        assert_eq!(
            plan.summary(),
            ReconcileSummary {
                updated: 1,
                deleted: 1,
                created: 1,
            }
        );
    }

    #[test]
    fn reconcile_rewrites_store() {
        let store = MemoryStore::new();
        store.upsert("svc", &record("A", "rpc")).unwrap();
        store.upsert("svc", &record("B", "rpc")).unwrap();
        store.upsert("other", &record("A", "rpc")).unwrap();

        let summary = Reconciler::new()
            .reconcile(&store, "svc", &current(&["B", "C"]))
            .unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(
            store.records("svc"),
            [record("B", "document"), record("C", "document")]
        );
        assert_eq!(store.records("other"), [record("A", "rpc")]);
    }

    /// Counts upserts that introduce a name not yet stored.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        creates: AtomicUsize,
    }

    impl OperationStore for CountingStore {
        fn list_existing(&self, source: &str) -> Result<Vec<OperationRecord>, StoreError> {
            self.inner.list_existing(source)
        }

        fn upsert(&self, source: &str, record: &OperationRecord) -> Result<(), StoreError> {
            let exists = self
                .inner
                .records(source)
                .iter()
                .any(|existing| existing.name == record.name);

            if !exists {
                self.creates.fetch_add(1, Ordering::SeqCst);
            }

            thread::yield_now();
            self.inner.upsert(source, record)
        }

        fn delete(&self, source: &str, name: &str) -> Result<(), StoreError> {
            self.inner.delete(source, name)
        }
    }

    #[test]
    fn concurrent_runs_on_one_source_create_once() {
        let store = CountingStore::default();
        let reconciler = Reconciler::new();
        let operations = current(&["A", "B", "C"]);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| reconciler.reconcile(&store, "svc", &operations).unwrap());
            }
        });

        assert_eq!(store.creates.load(Ordering::SeqCst), 3);
        assert_eq!(store.inner.records("svc").len(), 3);
        assert!(reconciler.locks.lock().is_empty());
    }

    #[test]
    fn idle_source_locks_are_released() {
        let store = MemoryStore::new();
        let reconciler = Reconciler::new();

        for source in ["a", "b", "c"] {
            reconciler.reconcile(&store, source, &current(&["A"])).unwrap();
        }

        assert!(reconciler.locks.lock().is_empty());
        assert_eq!(store.records("b"), [record("A", "document")]);
    }
}

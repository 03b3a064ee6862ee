//! Tracks live iterators per source so they can be released together.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info};

use pulse_common::{Error, Result};

pub type IteratorId = u64;

type SourceListener = Arc<dyn Fn(&str) + Send + Sync>;

/// An iterator the manager can release on behalf of its owner.
pub trait ManagedIterator: Send + Sync {
    fn id(&self) -> IteratorId;

    /// Logical source the iterator reads, usually the file URI.
    fn source(&self) -> &str;

    /// Releases the iterator's resources. Returns `true` only for the call
    /// that actually released them.
    fn release(&self) -> bool;

    fn is_released(&self) -> bool;
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    registry: Mutex<HashMap<String, HashMap<IteratorId, Weak<dyn ManagedIterator>>>>,
    listener: Option<SourceListener>,
}

/// Registry of live iterators keyed by source.
///
/// The manager only holds weak references; file handles stay owned by the
/// iterators. Cloning is cheap and clones share the same registry.
#[derive(Clone, Default)]
pub struct IteratorManager {
    inner: Arc<Inner>,
}

impl IteratorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager that calls `listener` once each time the last live
    /// iterator of a source goes away.
    pub fn with_listener<F>(listener: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                listener: Some(Arc::new(listener)),
                ..Inner::default()
            }),
        }
    }

    pub fn next_id(&self) -> IteratorId {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn register<I: ManagedIterator + 'static>(&self, iterator: &Arc<I>) {
        let weak = Arc::downgrade(iterator);
        let weak: Weak<dyn ManagedIterator> = weak;
        let mut registry = self.inner.registry.lock();
        registry
            .entry(iterator.source().to_string())
            .or_default()
            .insert(iterator.id(), weak);
        debug!(source = iterator.source(), id = iterator.id(), "Registered iterator");
    }

    /// Removes one iterator. Safe to call any number of times; returns
    /// whether the iterator was still registered.
    pub fn deregister(&self, source: &str, id: IteratorId) -> bool {
        let source_drained = {
            let mut registry = self.inner.registry.lock();
            let Some(iterators) = registry.get_mut(source) else {
                return false;
            };
            if iterators.remove(&id).is_none() {
                return false;
            }
            let drained = iterators.is_empty();
            if drained {
                registry.remove(source);
            }
            drained
        };
        debug!(source, id, "Deregistered iterator");
        if source_drained {
            self.source_released(source);
        }
        true
    }

    /// Releases every iterator still registered for `source` and returns how
    /// many this call released. Iterators closing themselves at the same
    /// time are released by exactly one of the two paths.
    pub fn close_all(&self, source: &str) -> usize {
        let Some(iterators) = self.inner.registry.lock().remove(source) else {
            return 0;
        };
        let released = iterators
            .into_values()
            .filter_map(|weak| weak.upgrade())
            .filter(|iterator| iterator.release())
            .count();
        info!(source, released, "Closed all iterators for source");
        self.source_released(source);
        released
    }

    /// Releases every registered iterator across all sources.
    pub fn close_everything(&self) -> usize {
        self.sources().iter().map(|source| self.close_all(source)).sum()
    }

    pub fn open_count(&self, source: &str) -> usize {
        self.inner.registry.lock().get(source).map_or(0, HashMap::len)
    }

    pub fn sources(&self) -> Vec<String> {
        self.inner.registry.lock().keys().cloned().collect()
    }

    fn source_released(&self, source: &str) {
        info!(source, "All iterators released for source");
        if let Some(listener) = &self.inner.listener {
            listener(source);
        }
    }
}

impl std::fmt::Debug for IteratorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IteratorManager").field("sources", &self.sources()).finish()
    }
}

/// Shared slot holding an iterator's open reader.
///
/// The reading side and any cleanup path both go through here, so the
/// reader is dropped exactly once no matter who closes first.
pub(crate) struct IteratorHandle<R> {
    id: IteratorId,
    source: String,
    reader: Mutex<Option<R>>,
    released: AtomicBool,
    manager: IteratorManager,
}

impl<R: Send + 'static> IteratorHandle<R> {
    /// Creates the handle and registers it with `manager`.
    pub(crate) fn register(source: String, reader: R, manager: &IteratorManager) -> Arc<Self> {
        let handle = Arc::new(Self {
            id: manager.next_id(),
            source,
            reader: Mutex::new(Some(reader)),
            released: AtomicBool::new(false),
            manager: manager.clone(),
        });
        manager.register(&handle);
        handle
    }

    /// Runs `f` against the open reader.
    pub(crate) fn with_reader<T>(&self, f: impl FnOnce(&mut R) -> Result<T>) -> Result<T> {
        let mut guard = self.reader.lock();
        let reader = guard.as_mut().ok_or(Error::IteratorClosed)?;
        f(reader)
    }

    /// Swaps in a freshly opened reader, dropping the previous one.
    pub(crate) fn replace_reader(&self, reader: R) -> Result<()> {
        let mut guard = self.reader.lock();
        if self.is_released() {
            return Err(Error::IteratorClosed);
        }
        *guard = Some(reader);
        Ok(())
    }
}

impl<R: Send + 'static> ManagedIterator for IteratorHandle<R> {
    fn id(&self) -> IteratorId {
        self.id
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        drop(self.reader.lock().take());
        self.manager.deregister(&self.source, self.id);
        true
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

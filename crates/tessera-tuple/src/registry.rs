//! The layout registry.
//!
//! The registry interns descriptors and specializes them lazily. It keeps
//! two sets:
//!
//! - an **initialized** set of published descriptors, read without taking any
//!   registry-wide lock;
//! - a **pending** set plus a FIFO queue of descriptors that have been handed
//!   out but not yet specialized, guarded by a single mutex.
//!
//! `create` never waits for specialization: a pending descriptor is fully
//! usable, containers built against it simply use generic storage. `drain`
//! specializes the queued descriptors and publishes them. A descriptor is
//! inserted into the initialized set before it leaves the pending set, so a
//! concurrent `create` always finds the canonical instance in one of them.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tessera_common::{FieldType, TupleConfig, TupleError, TupleResult};
use tracing::{debug, info, warn};

use crate::descriptor::Descriptor;
use crate::layout::{PackedSpecializer, Specialization, Specializer};
use crate::value::Value;

#[derive(Default)]
struct PendingDescriptors {
    set: HashMap<Arc<[FieldType]>, Descriptor>,
    queue: VecDeque<Descriptor>,
}

/// Outcome of one [`DescriptorRegistry::drain`] pass.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Descriptors moved into the initialized set.
    pub published: usize,
    /// Descriptors that received a packed or split plan.
    pub specialized: usize,
    /// Descriptors whose specialization failed. They were still published
    /// and keep working on generic storage.
    pub failed: Vec<(Descriptor, TupleError)>,
}

impl DrainReport {
    /// Returns true if nothing was processed.
    pub fn is_empty(&self) -> bool {
        self.published == 0
    }

    fn absorb(&mut self, other: DrainReport) {
        self.published += other.published;
        self.specialized += other.specialized;
        self.failed.extend(other.failed);
    }
}

/// Counters describing registry activity.
#[derive(Debug, Default)]
pub struct RegistryStats {
    created: AtomicU64,
    interned_hits: AtomicU64,
    specialized: AtomicU64,
    failed: AtomicU64,
    drains: AtomicU64,
}

impl RegistryStats {
    /// Number of distinct layouts registered.
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Number of `create` calls answered by an existing instance.
    pub fn interned_hits(&self) -> u64 {
        self.interned_hits.load(Ordering::Relaxed)
    }

    /// Number of successful specializations.
    pub fn specialized(&self) -> u64 {
        self.specialized.load(Ordering::Relaxed)
    }

    /// Number of failed specializations.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Number of non-empty drain passes.
    pub fn drains(&self) -> u64 {
        self.drains.load(Ordering::Relaxed)
    }

    #[inline]
    fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Interns descriptors and caches their specializations.
///
/// The registry is an explicit object: create one per engine instance and
/// share it (usually behind an `Arc`) with everything that builds tuples.
///
/// # Example
///
/// ```rust
/// use tessera_common::{FieldType, TupleConfig};
/// use tessera_tuple::DescriptorRegistry;
///
/// let registry = DescriptorRegistry::new(TupleConfig::default()).unwrap();
/// let a = registry.create(&[FieldType::BOOL, FieldType::INT.nullable(), FieldType::TEXT]);
/// let b = registry.create(&[FieldType::BOOL, FieldType::INT.nullable(), FieldType::TEXT]);
/// assert!(a.is_same(&b));
///
/// registry.drain();
/// assert!(a.is_specialized());
/// ```
pub struct DescriptorRegistry {
    config: TupleConfig,
    initialized: DashMap<Arc<[FieldType]>, Descriptor>,
    pending: Mutex<PendingDescriptors>,
    specializer: Box<dyn Specializer>,
    stats: RegistryStats,
}

impl DescriptorRegistry {
    /// Creates a registry with the default packed specializer.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidConfig`] if `config` is invalid.
    pub fn new(config: TupleConfig) -> TupleResult<Self> {
        Self::with_specializer(config, Box::new(PackedSpecializer))
    }

    /// Creates a registry with a custom specializer.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidConfig`] if `config` is invalid.
    pub fn with_specializer(
        config: TupleConfig,
        specializer: Box<dyn Specializer>,
    ) -> TupleResult<Self> {
        config.validate()?;

        let initialized = DashMap::new();
        let empty = Descriptor::empty().clone();
        initialized.insert(empty.fields_arc(), empty);

        Ok(Self {
            config,
            initialized,
            pending: Mutex::new(PendingDescriptors::default()),
            specializer,
            stats: RegistryStats::default(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TupleConfig {
        &self.config
    }

    /// Returns the activity counters.
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Returns the reserved zero-field descriptor.
    pub fn empty(&self) -> Descriptor {
        Descriptor::empty().clone()
    }

    /// Returns the canonical descriptor for `fields`, registering it if
    /// needed.
    ///
    /// A newly registered descriptor is returned immediately and queued for
    /// specialization by the next [`drain`](Self::drain).
    pub fn create(&self, fields: &[FieldType]) -> Descriptor {
        if let Some(existing) = self.initialized.get(fields) {
            RegistryStats::record(&self.stats.interned_hits);
            return existing.clone();
        }

        let descriptor = {
            let mut pending = self.pending.lock();
            if let Some(existing) = pending.set.get(fields) {
                RegistryStats::record(&self.stats.interned_hits);
                return existing.clone();
            }
            // Published by a drain between the first probe and the lock.
            if let Some(existing) = self.initialized.get(fields) {
                RegistryStats::record(&self.stats.interned_hits);
                return existing.clone();
            }

            let descriptor = Descriptor::new(Arc::from(fields));
            pending
                .set
                .insert(descriptor.fields_arc(), descriptor.clone());
            pending.queue.push_back(descriptor.clone());
            descriptor
        };

        RegistryStats::record(&self.stats.created);
        debug!(layout = %descriptor, "registered layout");

        if self.config.drain_on_create {
            self.drain();
        }

        descriptor
    }

    /// Returns the descriptor whose tags match the kinds of `values`.
    ///
    /// # Errors
    ///
    /// Returns [`TupleError::InvalidArgument`] if a value is NULL, since its
    /// type cannot be inferred.
    pub fn create_from_values(&self, values: &[Value]) -> TupleResult<Descriptor> {
        let fields = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                value.kind().map(FieldType::new).ok_or_else(|| {
                    TupleError::invalid_argument(format!(
                        "cannot infer the type of NULL at field {i}"
                    ))
                })
            })
            .collect::<TupleResult<Vec<_>>>()?;
        Ok(self.create(&fields))
    }

    /// Returns the descriptor for `fields` if it has been registered.
    pub fn get(&self, fields: &[FieldType]) -> Option<Descriptor> {
        if let Some(existing) = self.initialized.get(fields) {
            return Some(existing.clone());
        }
        let pending = self.pending.lock();
        pending
            .set
            .get(fields)
            .cloned()
            .or_else(|| self.initialized.get(fields).map(|d| d.clone()))
    }

    /// Returns the number of registered layouts, pending ones included.
    pub fn len(&self) -> usize {
        let pending = self.pending.lock();
        self.initialized.len() + pending.set.len()
    }

    /// Returns true if only the reserved empty layout is registered.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Returns the number of descriptors waiting for a drain.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().queue.len()
    }

    /// Specializes `descriptor` now, unless a decision already exists.
    ///
    /// On failure the descriptor is pinned to generic storage and the error
    /// is returned; the descriptor stays valid.
    ///
    /// # Errors
    ///
    /// Returns the specializer's error.
    pub fn specialize(&self, descriptor: &Descriptor) -> TupleResult<()> {
        if descriptor.is_specialized() {
            return Ok(());
        }

        match self.specializer.specialize(descriptor, self) {
            Ok(specialization) => {
                debug!(
                    layout = %descriptor,
                    plan = specialization.name(),
                    "specialized layout"
                );
                if descriptor.set_specialization(specialization) {
                    RegistryStats::record(&self.stats.specialized);
                }
                Ok(())
            }
            Err(e) => {
                warn!(
                    layout = %descriptor,
                    error = %e,
                    "specialization failed, layout stays on generic storage"
                );
                let pinned = descriptor.set_specialization(Specialization::Generic {
                    reason: e.to_string(),
                });
                if pinned {
                    RegistryStats::record(&self.stats.failed);
                }
                Err(e)
            }
        }
    }

    /// Specializes every queued descriptor and publishes it.
    ///
    /// Descriptors registered while the pass runs are left for the next
    /// pass. A failure never stops the batch: the failing descriptor is
    /// published on generic storage and listed in the report.
    pub fn drain(&self) -> DrainReport {
        let batch: Vec<Descriptor> = {
            let mut pending = self.pending.lock();
            pending.queue.drain(..).collect()
        };

        let mut report = DrainReport::default();
        if batch.is_empty() {
            return report;
        }

        for descriptor in batch {
            let already_planned = descriptor.is_specialized();
            match self.specialize(&descriptor) {
                Ok(()) => match descriptor.specialization() {
                    // Pinned earlier, e.g. as the half of a split layout.
                    Some(Specialization::Generic { reason }) if already_planned => {
                        let error = TupleError::specialization_failed(&descriptor, reason.clone());
                        report.failed.push((descriptor.clone(), error));
                    }
                    Some(Specialization::Generic { .. }) => {}
                    _ if !already_planned => report.specialized += 1,
                    _ => {}
                },
                Err(e) => report.failed.push((descriptor.clone(), e)),
            }
            self.publish(descriptor);
            report.published += 1;
        }

        RegistryStats::record(&self.stats.drains);
        info!(
            published = report.published,
            specialized = report.specialized,
            failed = report.failed.len(),
            "drained pending layouts"
        );
        report
    }

    /// Drains until no work is left and returns the combined report.
    ///
    /// Splitting wide layouts registers their head and tail, so one pass can
    /// queue more work for the next.
    pub fn shutdown(&self) -> DrainReport {
        let mut total = DrainReport::default();
        loop {
            let report = self.drain();
            if report.is_empty() {
                break;
            }
            total.absorb(report);
        }
        info!(
            layouts = self.initialized.len(),
            failed = total.failed.len(),
            "layout registry shut down"
        );
        total
    }

    fn publish(&self, descriptor: Descriptor) {
        let key = descriptor.fields_arc();
        self.initialized.insert(Arc::clone(&key), descriptor);
        self.pending.lock().set.remove(&key);
    }
}

impl fmt::Debug for DescriptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorRegistry")
            .field("config", &self.config)
            .field("initialized", &self.initialized.len())
            .field("pending", &self.pending_count())
            .finish()
    }
}

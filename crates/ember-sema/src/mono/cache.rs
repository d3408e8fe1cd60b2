//! Instantiations shared across call sites.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ember_ast::{DeclId, Type};
use tracing::trace;

use super::MonomorphizationSet;

/// Stable handle of one instantiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u32);

impl InstanceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// A polymorphic declaration specialized for one parameter set.
#[derive(Debug, PartialEq, Eq)]
pub struct Instantiation<'db> {
    pub id: InstanceId,
    pub decl: DeclId,
    pub set: MonomorphizationSet<'db>,
    /// Concrete function signature or aggregate instance type.
    pub ty: Type<'db>,
}

/// Instantiations keyed by declaration and exact parameter set.
///
/// Lookups run in parallel; inserting a new key locks only its shard, and
/// the `entry` API guarantees one instantiation per key even when several
/// workers race on it.
#[derive(Debug, Default)]
pub struct MonomorphCache<'db> {
    instances: DashMap<(DeclId, MonomorphizationSet<'db>), Arc<Instantiation<'db>>>,
    next_id: AtomicU32,
}

impl<'db> MonomorphCache<'db> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(
        &self,
        decl: DeclId,
        set: &MonomorphizationSet<'db>,
    ) -> Option<Arc<Instantiation<'db>>> {
        self.instances
            .get(&(decl, set.clone()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// The instantiation for `(decl, set)`, created with `ty` on first use.
    pub fn instantiate(
        &self,
        decl: DeclId,
        set: MonomorphizationSet<'db>,
        ty: Type<'db>,
    ) -> Arc<Instantiation<'db>> {
        match self.instances.entry((decl, set)) {
            Entry::Occupied(entry) => {
                trace!("instantiation cache hit for {decl}: {}", entry.get().id);
                Arc::clone(entry.get())
            }
            Entry::Vacant(entry) => {
                let id = InstanceId(self.next_id.fetch_add(1, Ordering::Relaxed));
                trace!("instantiation cache miss for {decl}: created {id}");
                let instance = Arc::new(Instantiation {
                    id,
                    decl,
                    set: entry.key().1.clone(),
                    ty,
                });
                entry.insert(Arc::clone(&instance));
                instance
            }
        }
    }

    /// Every instantiation of `decl`, oldest first.
    pub fn instances_of(&self, decl: DeclId) -> Vec<Arc<Instantiation<'db>>> {
        let mut found: Vec<_> = self
            .instances
            .iter()
            .filter(|entry| entry.key().0 == decl)
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        found.sort_by_key(|instance| instance.id);
        found
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

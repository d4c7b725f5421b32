//! Internal TTL cache primitives shared by the schema cache and value index.
//!
//! Entries are timestamped independently per key and only ever replaced
//! wholesale. A reader mid-resolution sees either the old snapshot or the
//! new one, never a half-written entry.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::types::ObjectType;

pub(crate) struct TtlEntry<T> {
    pub(crate) value: T,
    pub(crate) fetched_at: Instant,
}

impl<T> TtlEntry<T> {
    pub(crate) fn is_valid(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

pub(crate) type TtlMap<T> = RwLock<HashMap<ObjectType, TtlEntry<T>>>;

pub(crate) fn new_ttl_map<T>() -> TtlMap<T> {
    RwLock::new(HashMap::new())
}

pub(crate) fn read_valid<T: Clone>(
    cache: &TtlMap<T>,
    object_type: ObjectType,
    ttl: Duration,
) -> Option<T> {
    let guard = cache.read().ok()?;
    let entry = guard.get(&object_type)?;
    entry.is_valid(ttl).then(|| entry.value.clone())
}

pub(crate) fn replace_entry<T>(cache: &TtlMap<T>, object_type: ObjectType, value: T) {
    if let Ok(mut guard) = cache.write() {
        guard.insert(
            object_type,
            TtlEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }
}

pub(crate) fn evict<T>(cache: &TtlMap<T>, object_type: ObjectType) {
    if let Ok(mut guard) = cache.write() {
        guard.remove(&object_type);
    }
}

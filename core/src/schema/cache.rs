//! Process-wide memo of resolved record schemas

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use super::{build_tag_info, Record, TagInfo};
use crate::value::RecordDesc;

/// Global annotation cache
static CACHE: OnceLock<AnnotationCache> = OnceLock::new();

/// Compute-once, read-many table of [`TagInfo`] keyed by record type.
///
/// Entries are never evicted: a record's schema is fixed at compile time.
#[derive(Debug, Default)]
pub struct AnnotationCache {
    entries: RwLock<HashMap<TypeId, Arc<TagInfo>>>,
}

impl AnnotationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the whole process.
    pub fn global() -> &'static AnnotationCache {
        CACHE.get_or_init(AnnotationCache::new)
    }

    /// Get the schema of a record, resolving it on first use.
    ///
    /// Resolution runs without holding the lock because enum fields resolve
    /// their variant records through this same cache. If two callers race,
    /// the first insert wins and both observe the same `Arc`.
    pub fn get(&self, record: &RecordDesc) -> Arc<TagInfo> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(info) = entries.get(&record.id) {
                return Arc::clone(info);
            }
        }

        let info = Arc::new(build_tag_info(record));
        debug!(
            record = record.name,
            fields = info.tags.len(),
            "resolved record schema"
        );

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(record.id).or_insert(info))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Schema of record type `T` from the global cache.
pub fn tag_info<T: Record>() -> Arc<TagInfo> {
    tag_info_for(&RecordDesc {
        id: TypeId::of::<T>(),
        name: type_name::<T>(),
        fields: T::fields,
    })
}

/// Schema of a described record from the global cache.
pub fn tag_info_for(record: &RecordDesc) -> Arc<TagInfo> {
    AnnotationCache::global().get(record)
}

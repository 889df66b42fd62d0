//! ---
//! ra_section: "03-archive-domain"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Archive records, workflows, and master data."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use indexmap::IndexMap;
use parking_lot::RwLock;
use thiserror::Error;

/// Identifier shared by every archive record.
pub type RecordId = u32;

/// A record addressable by numeric id.
pub trait Record: Clone + Send + Sync {
    /// Entity name used in errors and audit entries.
    const ENTITY: &'static str;

    fn id(&self) -> RecordId;

    /// Copy of the record carrying `id`; used when the store assigns ids.
    fn with_id(self, id: RecordId) -> Self;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity} #{id} tidak ditemukan")]
    NotFound { entity: &'static str, id: RecordId },
}

/// Backing store for one entity kind.
pub trait Repository<T: Record>: Send + Sync {
    fn get(&self, id: RecordId) -> Option<T>;

    /// Every record, in insertion order.
    fn list(&self) -> Vec<T>;

    /// Store a new record. An id of 0 is replaced by [`Repository::next_id`].
    fn insert(&self, record: T) -> T;

    /// Replace an existing record.
    fn update(&self, record: T) -> Result<T, RepositoryError>;

    fn next_id(&self) -> RecordId;

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Insertion-ordered in-memory repository.
#[derive(Debug)]
pub struct MemoryRepository<T> {
    records: RwLock<IndexMap<RecordId, T>>,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(IndexMap::new()),
        }
    }
}

impl<T: Record> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(records: impl IntoIterator<Item = T>) -> Self {
        let repo = Self::new();
        for record in records {
            repo.insert(record);
        }
        repo
    }
}

impl<T: Record> Repository<T> for MemoryRepository<T> {
    fn get(&self, id: RecordId) -> Option<T> {
        self.records.read().get(&id).cloned()
    }

    fn list(&self) -> Vec<T> {
        self.records.read().values().cloned().collect()
    }

    fn insert(&self, record: T) -> T {
        let mut records = self.records.write();
        let record = if record.id() == 0 {
            let next = records.keys().max().copied().unwrap_or(0) + 1;
            record.with_id(next)
        } else {
            record
        };
        records.insert(record.id(), record.clone());
        record
    }

    fn update(&self, record: T) -> Result<T, RepositoryError> {
        let mut records = self.records.write();
        match records.get_mut(&record.id()) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(RepositoryError::NotFound {
                entity: T::ENTITY,
                id: record.id(),
            }),
        }
    }

    fn next_id(&self) -> RecordId {
        self.records.read().keys().max().copied().unwrap_or(0) + 1
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }
}

// 🗂️ Entity Store - single source of truth for entity records
//
// One coarse RwLock guards the whole map:
// - create (duplicate check + insert), update and delete take the write lock
// - read and list_all take the read lock and clone out a snapshot
// - no guard is ever held across an await (the retry backoff runs unlocked)
//
// Enumeration follows insertion order; update keeps an entity's position.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::entities::Entity;
use crate::error::{StoreError, StoreResult, TransientWriteError};
use crate::retry::{RetryObserver, RetryPolicy, WritePath};

// ============================================================================
// STORAGE
// ============================================================================

#[derive(Debug, Default)]
struct Entries {
    /// id -> (insertion sequence, entity)
    by_id: HashMap<String, (u64, Entity)>,
    /// insertion sequence -> id
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl Entries {
    fn insert(&mut self, entity: Entity) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, entity.id.clone());
        self.by_id.insert(entity.id.clone(), (seq, entity));
    }

    fn remove(&mut self, id: &str) -> Option<Entity> {
        let (seq, entity) = self.by_id.remove(id)?;
        self.order.remove(&seq);
        Some(entity)
    }

    fn snapshot(&self) -> Vec<Entity> {
        self.order
            .values()
            .filter_map(|id| self.by_id.get(id))
            .map(|(_, entity)| entity.clone())
            .collect()
    }
}

// ============================================================================
// ENTITY STORE
// ============================================================================

/// In-memory, volatile entity store shared across request handlers.
#[derive(Debug, Default)]
pub struct EntityStore {
    entries: RwLock<Entries>,
    policy: RetryPolicy,
}

impl EntityStore {
    /// Create an empty store with the default retry policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a custom retry policy
    pub fn with_retry_policy(policy: RetryPolicy) -> Self {
        EntityStore {
            entries: RwLock::new(Entries::default()),
            policy,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    // Every operation leaves the map consistent before anything can panic,
    // so a poisoned lock still guards valid data.
    fn read_entries(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Insert a new entity, assigning an id when it has none.
    ///
    /// Fails with [`StoreError::DuplicateId`] when the id is taken.
    pub fn create(&self, mut entity: Entity) -> StoreResult<Entity> {
        entity.ensure_id();
        self.commit(entity)
    }

    /// Duplicate check and insert under a single write lock
    fn commit(&self, entity: Entity) -> StoreResult<Entity> {
        let mut entries = self.write_entries();

        if entries.by_id.contains_key(&entity.id) {
            return Err(StoreError::DuplicateId(entity.id));
        }

        entries.insert(entity.clone());
        debug!("Stored entity {}", entity.id);
        Ok(entity)
    }

    /// Insert a new entity through a possibly failing backend write.
    ///
    /// Each attempt first runs `write_path`; a transient failure is followed
    /// by a backoff wait (per the store's [`RetryPolicy`]) while attempts
    /// remain. Uniqueness is checked at the attempt whose write succeeded.
    /// Progress is reported to `observer` when one is given.
    pub async fn create_with_retry(
        &self,
        mut entity: Entity,
        write_path: &dyn WritePath,
        observer: Option<&dyn RetryObserver>,
    ) -> StoreResult<Entity> {
        entity.ensure_id();
        let max_attempts = self.policy.max_attempts;
        let mut last_error = TransientWriteError::new(0, "no write attempted");

        for attempt in 1..=max_attempts {
            match write_path.attempt(attempt) {
                Ok(()) => {
                    return match self.commit(entity) {
                        Ok(stored) => {
                            if let Some(observer) = observer {
                                observer.succeeded(attempt);
                            }
                            Ok(stored)
                        }
                        Err(StoreError::DuplicateId(id)) => {
                            if let Some(observer) = observer {
                                observer.rejected_duplicate(attempt, &id);
                            }
                            Err(StoreError::DuplicateId(id))
                        }
                        Err(other) => Err(other),
                    };
                }
                Err(err) => {
                    if let Some(observer) = observer {
                        observer.attempt_failed(attempt, &err);
                    }
                    last_error = err;

                    if self.policy.should_retry(attempt) {
                        let delay = self.policy.delay_for(attempt);
                        if let Some(observer) = observer {
                            observer.backing_off(attempt, delay);
                        }
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        if let Some(observer) = observer {
            observer.exhausted(max_attempts);
        }

        Err(StoreError::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    /// Replace the stored entity with the same id.
    ///
    /// No-op when the id is unknown. The stored creation time is kept.
    pub fn update(&self, mut entity: Entity) {
        let mut entries = self.write_entries();

        if let Some((_, stored)) = entries.by_id.get_mut(&entity.id) {
            entity.inherit_created_date(stored);
            *stored = entity;
        }
    }

    /// Remove the entity with the given id. No-op when the id is unknown.
    pub fn delete(&self, id: &str) {
        self.write_entries().remove(id);
    }

    // ========================================================================
    // READS
    // ========================================================================

    pub fn read(&self, id: &str) -> Option<Entity> {
        self.read_entries()
            .by_id
            .get(id)
            .map(|(_, entity)| entity.clone())
    }

    /// Consistent snapshot of every entity, in insertion order
    pub fn list_all(&self) -> Vec<Entity> {
        self.read_entries().snapshot()
    }

    pub fn len(&self) -> usize {
        self.read_entries().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// TESTS
// ============================================================================

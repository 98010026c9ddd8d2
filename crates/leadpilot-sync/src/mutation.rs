//! Optimistic single-field mutations with sequence-guarded rollback.
//!
//! # Design
//! - The local write happens before the remote call so the UI reacts at once.
//! - Each attempt gets a sequence number; a ledger per entity tracks the newest
//!   attempt, the newest committed attempt and the last known-good value.
//! - A failure only reverts when no newer attempt is in flight for the same
//!   entity, and it reverts to the last value the server accepted.
//! - A page reload can overwrite an optimistic value; the newest attempt
//!   rewrites its value when the server accepts it.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use leadpilot_api_models::{Lead, LeadId, LeadStatus};
use tracing::{debug, info, warn};

use crate::api::LeadMutations;
use crate::context::SyncContext;
use crate::entity::Entity;
use crate::error::ApiResult;
use crate::store::{self, ListStore};

/// Describes one mutable field of an entity.
pub trait FieldMutation<E: Entity>: Send + Sync + 'static {
    /// Field value type.
    type Value: Clone + PartialEq + Debug + Display + Send + Sync + 'static;

    /// Field name used in notices and metrics.
    const FIELD: &'static str;

    /// Read the field.
    fn read(entity: &E) -> Self::Value;

    /// Overwrite the field.
    fn write(entity: &mut E, value: Self::Value);
}

/// Pipeline status of a lead.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadStatusField;

impl FieldMutation<Lead> for LeadStatusField {
    type Value = LeadStatus;

    const FIELD: &'static str = "status";

    fn read(entity: &Lead) -> LeadStatus {
        entity.status
    }

    fn write(entity: &mut Lead, value: LeadStatus) {
        entity.status = value;
    }
}

/// Lifecycle of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    /// Local write applied, remote call outstanding.
    Pending,
    /// Server accepted the value.
    Committed,
    /// Server rejected the value; the last known-good value was restored.
    RolledBack,
    /// Server rejected the value but a newer attempt owns the field, so nothing
    /// was reverted.
    Superseded,
}

/// Record of one optimistic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationAttempt<Id, V> {
    /// Monotonic attempt number.
    pub sequence: u64,
    /// Target entity.
    pub entity_id: Id,
    /// Value shown before this attempt.
    pub previous_value: V,
    /// Value requested by this attempt.
    pub next_value: V,
    /// Final status.
    pub status: MutationStatus,
}

#[derive(Debug)]
struct FieldLedger<V> {
    latest_seq: u64,
    committed_seq: u64,
    shown_seq: u64,
    known_good: V,
    in_flight: usize,
}

/// Applies field changes locally, confirms them remotely, reverts on failure.
pub struct OptimisticMutationEngine<E: Entity, F: FieldMutation<E>> {
    store: ListStore<E>,
    ledger: Arc<Mutex<HashMap<E::Id, FieldLedger<F::Value>>>>,
    sequence: Arc<AtomicU64>,
    ctx: SyncContext,
    _field: PhantomData<fn() -> F>,
}

impl<E: Entity, F: FieldMutation<E>> Clone for OptimisticMutationEngine<E, F> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ledger: Arc::clone(&self.ledger),
            sequence: Arc::clone(&self.sequence),
            ctx: self.ctx.clone(),
            _field: PhantomData,
        }
    }
}

impl<E: Entity, F: FieldMutation<E>> OptimisticMutationEngine<E, F> {
    /// Create an engine writing into `store`.
    #[must_use]
    pub fn new(store: ListStore<E>, ctx: SyncContext) -> Self {
        Self {
            store,
            ledger: Arc::new(Mutex::new(HashMap::new())),
            sequence: Arc::new(AtomicU64::new(0)),
            ctx,
            _field: PhantomData,
        }
    }

    /// Optimistically set the field on `entity_id` to `next`, then call `apply`.
    ///
    /// Returns `None` without calling `apply` when the entity is not on the
    /// current page.
    pub async fn mutate<A, Fut>(
        &self,
        entity_id: E::Id,
        next: F::Value,
        apply: A,
    ) -> Option<MutationAttempt<E::Id, F::Value>>
    where
        A: FnOnce(E::Id, F::Value) -> Fut,
        Fut: Future<Output = ApiResult<()>>,
    {
        let previous = self
            .store
            .read(|state| state.find(entity_id).map(F::read))?;
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        {
            let mut ledger = self.lock_ledger();
            let entry = ledger.entry(entity_id).or_insert_with(|| FieldLedger {
                latest_seq: 0,
                committed_seq: 0,
                shown_seq: 0,
                known_good: previous.clone(),
                in_flight: 0,
            });
            entry.latest_seq = sequence;
            entry.shown_seq = sequence;
            entry.in_flight += 1;
        }
        self.write_local(entity_id, next.clone());
        debug!(%entity_id, sequence, field = F::FIELD, "optimistic write applied");

        let result = apply(entity_id, next.clone()).await;

        let (status, rewrite) = self.settle(entity_id, sequence, &next, result.is_ok());
        if let Some(value) = rewrite {
            self.write_local(entity_id, value);
        }

        match (&result, status) {
            (Ok(()), _) => {
                info!(%entity_id, sequence, field = F::FIELD, value = ?next, "mutation committed");
                self.ctx.metrics.inc_mutation(F::FIELD, "committed");
                self.ctx
                    .notices
                    .success(format!("Updated {} to {next}", F::FIELD));
            }
            (Err(err), MutationStatus::RolledBack) => {
                warn!(%entity_id, sequence, field = F::FIELD, error = %err, "mutation rolled back");
                self.ctx.metrics.inc_mutation(F::FIELD, "rolled_back");
                self.ctx.notices.error(format!(
                    "Failed to update {}: {}",
                    F::FIELD,
                    err.describe()
                ));
            }
            (Err(err), _) => {
                debug!(%entity_id, sequence, field = F::FIELD, error = %err, "superseded mutation failed; newer attempt owns the field");
                self.ctx.metrics.inc_mutation(F::FIELD, "superseded");
            }
        }

        Some(MutationAttempt {
            sequence,
            entity_id,
            previous_value: previous,
            next_value: next,
            status,
        })
    }

    /// Whether any attempt for `entity_id` is still awaiting the server.
    #[must_use]
    pub fn is_pending(&self, entity_id: E::Id) -> bool {
        self.lock_ledger()
            .get(&entity_id)
            .is_some_and(|entry| entry.in_flight > 0)
    }

    /// Record the outcome of `sequence` and decide what, if anything, the list
    /// must show instead.
    fn settle(
        &self,
        entity_id: E::Id,
        sequence: u64,
        next: &F::Value,
        accepted: bool,
    ) -> (MutationStatus, Option<F::Value>) {
        let mut ledger = self.lock_ledger();
        let Some(entry) = ledger.get_mut(&entity_id) else {
            return (MutationStatus::Superseded, None);
        };
        entry.in_flight = entry.in_flight.saturating_sub(1);
        let decision = if accepted {
            let mut rewrite = None;
            if sequence > entry.committed_seq {
                entry.committed_seq = sequence;
                entry.known_good = next.clone();
                // A reload may have replaced the optimistic value, so the newest
                // accepted attempt always writes back. An older one only does
                // when a newer failure reverted past it.
                if sequence == entry.latest_seq || entry.shown_seq < sequence {
                    entry.shown_seq = sequence;
                    rewrite = Some(next.clone());
                }
            }
            (MutationStatus::Committed, rewrite)
        } else if sequence == entry.latest_seq {
            entry.shown_seq = entry.committed_seq;
            (MutationStatus::RolledBack, Some(entry.known_good.clone()))
        } else {
            (MutationStatus::Superseded, None)
        };
        if entry.in_flight == 0 {
            ledger.remove(&entity_id);
        }
        decision
    }

    fn write_local(&self, entity_id: E::Id, value: F::Value) {
        self.store.update(|state| {
            store::edit_entity(state, entity_id, |entity| F::write(entity, value.clone()))
        });
    }

    fn lock_ledger(&self) -> MutexGuard<'_, HashMap<E::Id, FieldLedger<F::Value>>> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OptimisticMutationEngine<Lead, LeadStatusField> {
    /// Change a lead's pipeline status through `api`.
    pub async fn set_lead_status<M>(
        &self,
        api: &M,
        id: LeadId,
        status: LeadStatus,
    ) -> Option<MutationAttempt<LeadId, LeadStatus>>
    where
        M: LeadMutations + ?Sized,
    {
        self.mutate(id, status, |id, status| async move {
            api.update_status(id, status).await.map(|_| ())
        })
        .await
    }
}

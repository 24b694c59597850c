//! In-place reconciliation of a local entity list against a remote fetch.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use switchboard_model::{Entity, FillOutcome};
use switchboard_types::EntityKey;
use tracing::{trace, warn};

/// Builds the entity for a key seen for the first time. Returning `None`
/// leaves the record out of the list.
pub type Factory<'a, E> = &'a mut dyn FnMut(&EntityKey, &Value) -> Option<E>;

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entities created by the factory.
    pub added: usize,
    /// Existing entities that took the new record.
    pub updated: usize,
    /// Existing entities that ignored the record (frozen, or skipping once).
    pub deferred: usize,
    /// Entities dropped because their key is gone remotely.
    pub removed: usize,
    /// Records the factory declined.
    pub skipped: usize,
    /// Records without a usable key.
    pub ignored: usize,
    /// Records that could not be applied.
    pub failed: usize,
}

impl ReconcileReport {
    /// True if the set of entities changed.
    pub fn membership_changed(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}

/// Reconciles `list` against `records`, keyed by `key_field`.
///
/// - an entity whose key is present is updated in place (the `Arc` stays the same);
/// - a key seen for the first time goes through `factory` and is appended;
/// - an entity whose key is absent is removed.
///
/// Without a factory the pass is update-only: nothing is created and nothing
/// is removed, which is what partial feeds (status lists) need. Records
/// lacking the key are ignored. When a key appears twice the last record
/// wins. Failing fills are logged and counted, never fatal. The list is not
/// sorted.
pub fn crossfill<E: Entity>(
    records: &[Value],
    list: &mut Vec<Arc<E>>,
    key_field: &str,
    factory: Option<Factory<'_, E>>,
    mapping_key: Option<&str>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let mut incoming: HashMap<EntityKey, &Value> = HashMap::with_capacity(records.len());
    let mut order = Vec::with_capacity(records.len());
    for record in records {
        match EntityKey::from_record(record, key_field) {
            Some(key) => {
                if incoming.insert(key.clone(), record).is_none() {
                    order.push(key);
                }
            }
            None => {
                trace!(key_field, "record without key ignored");
                report.ignored += 1;
            }
        }
    }

    let Some(factory) = factory else {
        for entity in list.iter() {
            if let Some(record) = incoming.get(entity.key()) {
                fill(entity.as_ref(), record, mapping_key, false, &mut report);
            }
        }
        return report;
    };

    let before = list.len();
    list.retain(|entity| incoming.contains_key(entity.key()));
    report.removed = before - list.len();

    let known: HashSet<EntityKey> = list.iter().map(|entity| entity.key().clone()).collect();
    for entity in list.iter() {
        if let Some(record) = incoming.get(entity.key()) {
            fill(entity.as_ref(), record, mapping_key, false, &mut report);
        }
    }

    for key in order {
        if known.contains(&key) {
            continue;
        }
        let record = incoming[&key];
        match factory(&key, record) {
            Some(entity) => {
                fill(&entity, record, mapping_key, true, &mut report);
                list.push(Arc::new(entity));
                report.added += 1;
            }
            None => report.skipped += 1,
        }
    }
    report
}

fn fill<E: Entity>(
    entity: &E,
    record: &Value,
    mapping_key: Option<&str>,
    created: bool,
    report: &mut ReconcileReport,
) {
    match entity.fill_data(record, true, mapping_key) {
        Ok(FillOutcome::Applied) if !created => report.updated += 1,
        Ok(FillOutcome::Applied) => {}
        Ok(FillOutcome::Frozen | FillOutcome::Skipped) => report.deferred += 1,
        Err(e) => {
            warn!(key = %entity.key(), error = %e, "could not apply remote record");
            report.failed += 1;
        }
    }
}

use crate::crossfill::{crossfill, Factory, ReconcileReport};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use switchboard_model::Entity;
use switchboard_types::EntityKey;

/// An ordered list of entities plus a key index.
///
/// The index always matches the list: both are rebuilt together after each
/// reconciliation.
#[derive(Debug)]
pub struct Collection<E> {
    items: Vec<Arc<E>>,
    index: HashMap<EntityKey, Arc<E>>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<E: Entity> Collection<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs [`crossfill`] over the list and refreshes the index.
    pub fn reconcile(
        &mut self,
        records: &[Value],
        key_field: &str,
        factory: Option<Factory<'_, E>>,
        mapping_key: Option<&str>,
    ) -> ReconcileReport {
        let report = crossfill(records, &mut self.items, key_field, factory, mapping_key);
        self.reindex();
        report
    }

    fn reindex(&mut self) {
        self.index = self
            .items
            .iter()
            .map(|entity| (entity.key().clone(), Arc::clone(entity)))
            .collect();
    }

    pub fn get(&self, key: &EntityKey) -> Option<&Arc<E>> {
        self.index.get(key)
    }

    /// Shorthand for id-keyed entities.
    pub fn get_id(&self, id: i64) -> Option<&Arc<E>> {
        self.get(&EntityKey::Id(id))
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<E>> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Arc<E>] {
        &self.items
    }

    /// Keys in list order.
    pub fn keys(&self) -> Vec<EntityKey> {
        self.items.iter().map(|entity| entity.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reorders the list. The index is unaffected.
    pub fn sort_by(&mut self, mut compare: impl FnMut(&E, &E) -> Ordering) {
        self.items.sort_by(|a, b| compare(a, b));
    }
}

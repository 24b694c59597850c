use crate::collection::Collection;
use crate::config::RefreshConfig;
use crate::crossfill::{Factory, ReconcileReport};
use crate::error::SyncError;
use futures::future::{join_all, BoxFuture};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use switchboard_api::ApiResult;
use switchboard_model::Entity;
use switchboard_refresh::{LoadingFlag, Refresher};
use switchboard_types::EntityKey;
use tracing::{debug, error};

type FetchFn = Arc<dyn Fn() -> BoxFuture<'static, ApiResult<Vec<Value>>> + Send + Sync>;
type FactoryFn<E> = Arc<dyn Fn(&EntityKey, &Value) -> Option<E> + Send + Sync>;
type OrderFn<E> = Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>;
type AddedHook<E> = Arc<dyn Fn(Arc<E>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Result of one [`Synchronizer::refresh`].
#[derive(Debug)]
pub enum SyncOutcome {
    /// A previous refresh was still running; nothing was fetched.
    Skipped,
    Synced(ReconcileReport),
    /// The fetch failed; the collection is untouched.
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn report(&self) -> Option<&ReconcileReport> {
        match self {
            Self::Synced(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps one [`Collection`] in step with a remote list.
///
/// Each refresh fetches the list, reconciles the collection, re-sorts it and
/// hands newly created entities to the on-added hook. Overlapping refreshes
/// are dropped rather than queued. Several synchronizers may share a
/// collection (a full configuration feed plus an update-only status feed).
pub struct Synchronizer<E> {
    name: String,
    key_field: String,
    fetch: FetchFn,
    factory: Option<FactoryFn<E>>,
    mapping_key: Option<String>,
    order: Option<OrderFn<E>>,
    on_added: Option<AddedHook<E>>,
    collection: Arc<Mutex<Collection<E>>>,
    loading: LoadingFlag,
    config: RefreshConfig,
}

impl<E: Entity> Synchronizer<E> {
    /// An update-only synchronizer over a fresh collection. Add a factory to
    /// let it create and remove entities.
    pub fn new<F, Fut>(name: impl Into<String>, key_field: impl Into<String>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Vec<Value>>> + Send + 'static,
    {
        Self {
            name: name.into(),
            key_field: key_field.into(),
            fetch: Arc::new(move || Box::pin(fetch()) as BoxFuture<'static, _>),
            factory: None,
            mapping_key: None,
            order: None,
            on_added: None,
            collection: Arc::new(Mutex::new(Collection::new())),
            loading: LoadingFlag::new(),
            config: RefreshConfig::default(),
        }
    }

    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&EntityKey, &Value) -> Option<E> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Populates through an alternate mapping table of the entities.
    pub fn with_mapping(mut self, mapping_key: impl Into<String>) -> Self {
        self.mapping_key = Some(mapping_key.into());
        self
    }

    pub fn sorted_by<F>(mut self, order: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + Send + Sync + 'static,
    {
        self.order = Some(Arc::new(order));
        self
    }

    /// Runs `hook` for every entity the factory creates, after the
    /// collection is updated.
    pub fn on_added<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_added = Some(Arc::new(move |entity| {
            Box::pin(hook(entity)) as BoxFuture<'static, ()>
        }));
        self
    }

    pub fn with_config(mut self, config: RefreshConfig) -> Self {
        self.config = config;
        self
    }

    /// Works on the same collection as `other`.
    pub fn sharing(mut self, other: &Synchronizer<E>) -> Self {
        self.collection = Arc::clone(&other.collection);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> RefreshConfig {
        self.config
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Runs `f` with the collection locked. `f` must not block.
    pub fn with_collection<R>(&self, f: impl FnOnce(&mut Collection<E>) -> R) -> R {
        f(&mut lock(&self.collection))
    }

    /// The current entities, in collection order.
    pub fn snapshot(&self) -> Vec<Arc<E>> {
        lock(&self.collection).as_slice().to_vec()
    }

    pub fn get(&self, key: &EntityKey) -> Option<Arc<E>> {
        lock(&self.collection).get(key).cloned()
    }

    /// Fetches the remote list and reconciles the collection with it.
    ///
    /// Never returns an error: fetch failures are logged and reported as
    /// [`SyncOutcome::Failed`].
    pub async fn refresh(&self) -> SyncOutcome {
        let Some(_loading) = self.loading.try_begin() else {
            debug!(collection = %self.name, "previous refresh still running");
            return SyncOutcome::Skipped;
        };
        let records = match (self.fetch)().await {
            Ok(records) => records,
            Err(e) => {
                error!(collection = %self.name, error = %e.message(), "could not load");
                return SyncOutcome::Failed(e.into());
            }
        };

        let (report, added) = self.apply(&records);
        debug!(
            collection = %self.name,
            added = report.added,
            updated = report.updated,
            removed = report.removed,
            failed = report.failed,
            "synchronized"
        );

        if let Some(hook) = &self.on_added {
            join_all(added.into_iter().map(|entity| hook(entity))).await;
        }
        SyncOutcome::Synced(report)
    }

    fn apply(&self, records: &[Value]) -> (ReconcileReport, Vec<Arc<E>>) {
        let mut collection = lock(&self.collection);
        let known: HashSet<EntityKey> = if self.on_added.is_some() {
            collection.keys().into_iter().collect()
        } else {
            HashSet::new()
        };

        let mapping_key = self.mapping_key.as_deref();
        let report = match &self.factory {
            Some(factory) => {
                let create: Factory<'_, E> =
                    &mut |key: &EntityKey, record: &Value| factory(key, record);
                collection.reconcile(records, &self.key_field, Some(create), mapping_key)
            }
            None => collection.reconcile(records, &self.key_field, None, mapping_key),
        };
        if let Some(order) = &self.order {
            collection.sort_by(|a, b| order(a, b));
        }

        let added = if self.on_added.is_some() {
            collection
                .iter()
                .filter(|entity| !known.contains(entity.key()))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        (report, added)
    }

    /// A stopped [`Refresher`] that calls [`Synchronizer::refresh`] at the
    /// configured interval. It holds a weak reference and goes idle once the
    /// synchronizer is dropped.
    pub fn refresher(self: &Arc<Self>) -> Refresher {
        let sync = Arc::downgrade(self);
        Refresher::with_millis(self.config.interval_ms, move || {
            let sync = sync.clone();
            async move {
                if let Some(sync) = sync.upgrade() {
                    sync.refresh().await;
                }
            }
        })
    }
}

impl<E> std::fmt::Debug for Synchronizer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("name", &self.name)
            .field("key_field", &self.key_field)
            .field("mapping_key", &self.mapping_key)
            .field("creates", &self.factory.is_some())
            .field("loading", &self.loading.is_loading())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

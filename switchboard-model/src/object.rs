use crate::error::{ModelError, ModelResult};
use crate::mapping::{FieldMapping, Mapping};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use switchboard_types::{EntityKey, RecordPath};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Deserializes `null` as the type's default, for fields that are never absent.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A domain entity: something with a primary key that can be refreshed from
/// a remote record.
pub trait Entity: Send + Sync + 'static {
    fn key(&self) -> &EntityKey;

    /// Populates the entity from `record`, through the primary mapping or the
    /// alternate named by `mapping_key`.
    fn fill_data(
        &self,
        record: &Value,
        validate: bool,
        mapping_key: Option<&str>,
    ) -> ModelResult<FillOutcome>;
}

/// What a `fill_data` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// The record was applied.
    Applied,
    /// The entity is frozen by an in-flight write; the record was ignored.
    Frozen,
    /// A one-shot skip was pending; it was consumed and the record ignored.
    Skipped,
}

#[derive(Debug, Default)]
struct Flags {
    freeze: AtomicBool,
    skip: AtomicBool,
    dirty: AtomicBool,
    processing: AtomicBool,
    edit: AtomicBool,
}

#[derive(Debug, Clone)]
struct LastFill {
    record: Value,
    validate: bool,
    mapping_key: Option<String>,
}

/// Shared state of every mirrored entity.
///
/// Holds the primary key, the typed fields `F`, the mapping tables that fill
/// them and the transient flags:
///
/// - `freeze`: an in-flight write owns the fields; refreshes are ignored
/// - `skip`: the next refresh is ignored once (it may predate the write)
/// - `dirty`: the fields carry local edits not saved yet
/// - `processing`: a remote call is in flight
/// - `edit`: the entity is open in an editor
///
/// Fields are patched by serializing `F`, overlaying the projected record
/// and deserializing back, so `F` decides how `null` and missing values land.
pub struct RemoteObject<F> {
    key: EntityKey,
    key_attribute: &'static str,
    mapping: Mapping,
    alternates: HashMap<String, Mapping>,
    fields: RwLock<F>,
    flags: Flags,
    last: Mutex<Option<LastFill>>,
}

impl<F> RemoteObject<F>
where
    F: Serialize + DeserializeOwned + Default,
{
    /// Creates an entity with default fields.
    ///
    /// `key_attribute` names the mapping attribute that holds the primary key
    /// (`"id"`, `"name"`).
    pub fn new(key: impl Into<EntityKey>, key_attribute: &'static str, mapping: Mapping) -> Self {
        Self {
            key: key.into(),
            key_attribute,
            mapping,
            alternates: HashMap::new(),
            fields: RwLock::new(F::default()),
            flags: Flags::default(),
            last: Mutex::new(None),
        }
    }

    /// Registers an alternate mapping selectable by name in `fill_data`.
    pub fn with_alternate(mut self, name: impl Into<String>, mapping: Mapping) -> Self {
        self.alternates.insert(name.into(), mapping);
        self
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn key_attribute(&self) -> &'static str {
        self.key_attribute
    }

    pub fn mapping(&self, mapping_key: Option<&str>) -> ModelResult<&Mapping> {
        match mapping_key {
            None => Ok(&self.mapping),
            Some(name) => self
                .alternates
                .get(name)
                .ok_or_else(|| ModelError::UnknownMapping(name.to_string())),
        }
    }

    /// Populates the fields from `record`.
    ///
    /// With `validate`, the record must carry the primary key and it must be
    /// ours. A record whose values do not fit `F` leaves the fields untouched.
    pub fn fill_data(
        &self,
        record: &Value,
        validate: bool,
        mapping_key: Option<&str>,
    ) -> ModelResult<FillOutcome> {
        if self.is_frozen() {
            return Ok(FillOutcome::Frozen);
        }
        if self.flags.skip.swap(false, Ordering::AcqRel) {
            return Ok(FillOutcome::Skipped);
        }
        let mapping = self.mapping(mapping_key)?;
        if validate {
            self.validate(mapping, record)?;
        }

        let patch = mapping.project(record);
        {
            let mut fields = write(&self.fields);
            let mut current = serde_json::to_value(&*fields)?;
            if let Value::Object(current) = &mut current {
                current.extend(patch);
            }
            *fields = serde_json::from_value(current)?;
        }

        self.flags.freeze.store(false, Ordering::Release);
        self.flags.dirty.store(false, Ordering::Release);
        self.flags.skip.store(false, Ordering::Release);
        *lock(&self.last) = Some(LastFill {
            record: record.clone(),
            validate,
            mapping_key: mapping_key.map(str::to_string),
        });
        Ok(FillOutcome::Applied)
    }

    fn validate(&self, mapping: &Mapping, record: &Value) -> ModelResult<()> {
        let value = match mapping.get(self.key_attribute) {
            Some(FieldMapping::Path(path)) => path.resolve(record),
            _ => RecordPath::key(self.key_attribute).resolve(record),
        };
        match value {
            None => Err(ModelError::invalid_record(&self.key, "record has no key")),
            Some(value) if !self.key.matches(value) => Err(ModelError::invalid_record(
                &self.key,
                format!("record belongs to {value}"),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Drops local edits by re-applying the last filled record.
    pub fn cancel(&self) -> ModelResult<()> {
        self.flags.freeze.store(false, Ordering::Release);
        let last = lock(&self.last).clone();
        if let Some(last) = last {
            self.fill_data(&last.record, last.validate, last.mapping_key.as_deref())?;
        }
        Ok(())
    }

    /// The record most recently applied.
    pub fn last_record(&self) -> Option<Value> {
        lock(&self.last).as_ref().map(|last| last.record.clone())
    }
}

impl<F> RemoteObject<F> {
    /// Reads the fields.
    pub fn read<R>(&self, f: impl FnOnce(&F) -> R) -> R {
        f(&read(&self.fields))
    }

    /// Changes the fields without marking them dirty.
    pub fn update<R>(&self, f: impl FnOnce(&mut F) -> R) -> R {
        f(&mut write(&self.fields))
    }

    /// Changes the fields as a local edit, marking them dirty.
    pub fn edit<R>(&self, f: impl FnOnce(&mut F) -> R) -> R {
        let result = f(&mut write(&self.fields));
        self.flags.dirty.store(true, Ordering::Release);
        result
    }

    /// Replaces the fields with `previous` and drops a pending skip. Used to
    /// roll back an optimistic update after a failed write.
    pub fn revert(&self, previous: F) {
        *write(&self.fields) = previous;
        self.flags.skip.store(false, Ordering::Release);
    }

    /// A copy of the current fields.
    pub fn fields(&self) -> F
    where
        F: Clone,
    {
        read(&self.fields).clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.flags.freeze.load(Ordering::Acquire)
    }

    pub fn freeze(&self) {
        self.flags.freeze.store(true, Ordering::Release);
    }

    pub fn unfreeze(&self) {
        self.flags.freeze.store(false, Ordering::Release);
    }

    /// Ignores the next `fill_data` call once.
    pub fn skip_next(&self) {
        self.flags.skip.store(true, Ordering::Release);
    }

    pub fn will_skip(&self) -> bool {
        self.flags.skip.load(Ordering::Acquire)
    }

    pub fn is_dirty(&self) -> bool {
        self.flags.dirty.load(Ordering::Acquire)
    }

    pub fn is_processing(&self) -> bool {
        self.flags.processing.load(Ordering::Acquire)
    }

    pub fn is_editing(&self) -> bool {
        self.flags.edit.load(Ordering::Acquire)
    }

    pub fn set_editing(&self, editing: bool) {
        self.flags.edit.store(editing, Ordering::Release);
    }

    /// Freezes the entity and marks it processing until the guard drops.
    pub fn begin_write(&self) -> PendingWrite<'_> {
        self.flags.freeze.store(true, Ordering::Release);
        self.flags.processing.store(true, Ordering::Release);
        PendingWrite {
            flags: &self.flags,
            frozen: true,
        }
    }

    /// Marks the entity processing until the guard drops, without freezing it.
    pub fn begin_processing(&self) -> PendingWrite<'_> {
        self.flags.processing.store(true, Ordering::Release);
        PendingWrite {
            flags: &self.flags,
            frozen: false,
        }
    }
}

impl<F: std::fmt::Debug> std::fmt::Debug for RemoteObject<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteObject")
            .field("key", &self.key)
            .field("fields", &*read(&self.fields))
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Clears the flags set by [`RemoteObject::begin_write`] or
/// [`RemoteObject::begin_processing`] when dropped, whether the write
/// succeeded or not.
#[must_use]
#[derive(Debug)]
pub struct PendingWrite<'a> {
    flags: &'a Flags,
    frozen: bool,
}

impl Drop for PendingWrite<'_> {
    fn drop(&mut self) {
        if self.frozen {
            self.flags.freeze.store(false, Ordering::Release);
        }
        self.flags.processing.store(false, Ordering::Release);
    }
}

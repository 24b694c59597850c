//! Declarative field mapping tables.
//!
//! A [`Mapping`] lists, in order, how each local attribute of an entity is
//! read from a remote record: either straight from a (possibly dotted) path,
//! or derived from several paths through a transform.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use switchboard_types::RecordPath;

/// Transform of a derived attribute.
///
/// Receives one resolved value per source path, `None` where the record does
/// not carry the path. Returning `None` is the explicit "no value" result and
/// assigns `null`.
pub type Transform = Arc<dyn Fn(&[Option<&Value>]) -> Option<Value> + Send + Sync>;

/// How one local attribute is read from a remote record.
#[derive(Clone)]
pub enum FieldMapping {
    /// Copied from a path.
    ///
    /// A single-segment path is only assigned when the record carries that
    /// key; otherwise the attribute keeps its value. A dotted path is always
    /// assigned, and a missing path assigns `null`.
    Path(RecordPath),
    /// Computed from several paths.
    Derived {
        sources: Vec<RecordPath>,
        transform: Transform,
    },
}

impl FieldMapping {
    /// The value this mapping assigns for `record`, or `None` to leave the
    /// attribute untouched.
    pub fn project(&self, record: &Value) -> Option<Value> {
        match self {
            Self::Path(path) if path.is_nested() => {
                Some(path.resolve(record).cloned().unwrap_or(Value::Null))
            }
            Self::Path(path) => path.resolve(record).cloned(),
            Self::Derived { sources, transform } => {
                let resolved: Vec<Option<&Value>> =
                    sources.iter().map(|path| path.resolve(record)).collect();
                Some(transform(&resolved).unwrap_or(Value::Null))
            }
        }
    }
}

impl fmt::Debug for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(&path.to_string()).finish(),
            Self::Derived { sources, .. } => f
                .debug_struct("Derived")
                .field(
                    "sources",
                    &sources.iter().map(ToString::to_string).collect::<Vec<_>>(),
                )
                .finish_non_exhaustive(),
        }
    }
}

/// Parses a mapping path. Text that is not a valid dotted path (e.g. it has
/// an empty segment) is taken as one literal key.
fn path(text: &str) -> RecordPath {
    RecordPath::parse(text).unwrap_or_else(|_| RecordPath::key(text))
}

/// Ordered table from local attribute name to [`FieldMapping`].
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    fields: Vec<(String, FieldMapping)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute read from `path`. An attribute declared twice keeps
    /// its first position and takes the new mapping.
    pub fn field(self, attribute: impl Into<String>, path_text: &str) -> Self {
        self.with(attribute.into(), FieldMapping::Path(path(path_text)))
    }

    /// Adds an attribute computed by `transform` from `sources`.
    pub fn derived<F>(self, attribute: impl Into<String>, sources: &[&str], transform: F) -> Self
    where
        F: Fn(&[Option<&Value>]) -> Option<Value> + Send + Sync + 'static,
    {
        let sources = sources.iter().map(|source| path(source)).collect();
        self.with(
            attribute.into(),
            FieldMapping::Derived {
                sources,
                transform: Arc::new(transform),
            },
        )
    }

    fn with(mut self, attribute: String, mapping: FieldMapping) -> Self {
        match self.fields.iter_mut().find(|(name, _)| *name == attribute) {
            Some(slot) => slot.1 = mapping,
            None => self.fields.push((attribute, mapping)),
        }
        self
    }

    /// The mapping of `attribute`, if declared.
    pub fn get(&self, attribute: &str) -> Option<&FieldMapping> {
        self.fields
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, mapping)| mapping)
    }

    /// Declared attribute names, in order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds the attribute patch for `record`, in declaration order.
    pub fn project(&self, record: &Value) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|(name, mapping)| {
                mapping.project(record).map(|value| (name.clone(), value))
            })
            .collect()
    }
}

//! Schema-driven configuration trees.
//!
//! Apps running on a gateway describe their settings with a schema: an
//! ordered list of field declarations (`str`, `password`, `bool`, `int`,
//! `enum`, `section`, `nested_enum`), where sections may repeat and nested
//! enums carry one sub-schema per choice. This crate turns such a
//! description into a typed, editable tree:
//!
//! - [`FieldDescription`] / [`FieldType`] / [`Choice`]: the schema as sent by
//!   the gateway (serde-compatible)
//! - [`ConfigTree`]: ordered name → [`ConfigEntry`] map built once from a
//!   schema, then repeatedly populated from and serialized back to the flat
//!   JSON payload the gateway stores
//! - [`EntryValue`]: the per-type value held by each entry
//!
//! ```
//! use serde_json::json;
//! use switchboard_config::{ConfigTree, FieldDescription};
//!
//! let mut tree = ConfigTree::from_structure(&[FieldDescription::integer("threshold")]).unwrap();
//! tree.set_config(&json!({"threshold": "42"})).unwrap();
//! assert_eq!(tree.get_config(), json!({"threshold": 42}));
//! ```

mod coerce;
mod entry;
mod error;
mod schema;
mod tree;

pub use coerce::{parse_int, to_text, truthy};
pub use entry::{ConfigEntry, EntryValue};
pub use error::{ConfigError, ConfigResult};
pub use schema::{Choice, FieldDescription, FieldType};
pub use tree::ConfigTree;

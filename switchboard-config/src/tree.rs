use crate::entry::ConfigEntry;
use crate::error::{ConfigError, ConfigResult};
use crate::schema::FieldDescription;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// An ordered set of configuration entries built from a schema.
///
/// Every declared field has exactly one entry and no entry exists without a
/// declaration. The structure is declared once ([`ConfigTree::set_structure`])
/// and then populated ([`ConfigTree::set_config`]) and read back
/// ([`ConfigTree::get_config`]) as often as needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    owner: Option<String>,
    entries: IndexMap<String, ConfigEntry>,
}

impl ConfigTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tree for the app named `owner`.
    pub fn for_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            entries: IndexMap::new(),
        }
    }

    /// Builds a tree from a schema in one go.
    pub fn from_structure(schema: &[FieldDescription]) -> ConfigResult<Self> {
        let mut tree = Self::new();
        tree.set_structure(schema)?;
        Ok(tree)
    }

    /// Declares the fields of `schema`, in order.
    ///
    /// Meant to be called once on a fresh tree. Declaring a name that already
    /// exists replaces that entry (keeping its position) rather than adding a
    /// second one.
    pub fn set_structure(&mut self, schema: &[FieldDescription]) -> ConfigResult<()> {
        for description in schema {
            let entry = ConfigEntry::from_description(description)?;
            self.entries.insert(description.name.clone(), entry);
        }
        Ok(())
    }

    /// Declares the fields of a raw JSON schema description as returned by the gateway.
    pub fn set_structure_json(&mut self, description: &Value) -> ConfigResult<()> {
        let schema: Vec<FieldDescription> = serde_json::from_value(description.clone())?;
        self.set_structure(&schema)
    }

    /// Populates the tree from a payload object.
    ///
    /// Only the fields present in the payload are touched. A payload field
    /// without a declaration is an error. On error the tree is left as it
    /// was before the call.
    pub fn set_config(&mut self, payload: &Value) -> ConfigResult<()> {
        let mut staged = self.clone();
        staged.apply_config(payload)?;
        *self = staged;
        Ok(())
    }

    /// Writes a payload in place, stopping at the first failing field.
    pub(crate) fn apply_config(&mut self, payload: &Value) -> ConfigResult<()> {
        let object = payload
            .as_object()
            .ok_or_else(|| ConfigError::shape(self.owner.as_deref().unwrap_or("(root)"), "an object"))?;
        for (name, value) in object {
            let entry = self
                .entries
                .get_mut(name)
                .ok_or_else(|| ConfigError::UnknownField(name.clone()))?;
            entry.set_value(value)?;
        }
        Ok(())
    }

    /// Serializes every entry, in declaration order, into a payload object.
    pub fn get_config(&self) -> Value {
        let config: Map<String, Value> = self
            .entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.get_value()))
            .collect();
        Value::Object(config)
    }

    /// True once at least one field has been declared.
    pub fn is_configurable(&self) -> bool {
        !self.entries.is_empty()
    }

    /// The app this tree configures, if it is a root tree.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, name: &str) -> Option<&ConfigEntry> {
        self.entries.get(name)
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut ConfigEntry> {
        self.entries.get_mut(name)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.values()
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    // ── Repeat groups ────────────────────────────────────────────

    /// Appends a sub-tree to the repeating section `name`.
    pub fn add_section(&mut self, name: &str) -> ConfigResult<&mut ConfigTree> {
        self.repeated_mut(name)?.add_section()
    }

    /// Removes the last sub-tree of the repeating section `name` if it is above its minimum.
    pub fn remove_section(&mut self, name: &str) -> ConfigResult<bool> {
        self.repeated_mut(name)?.remove_section()
    }

    pub fn can_remove_section(&self, name: &str) -> ConfigResult<bool> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ConfigError::UnknownField(name.to_string()))?;
        if !entry.is_repeated() {
            return Err(ConfigError::NotRepeated(name.to_string()));
        }
        Ok(entry.can_remove_section())
    }

    fn repeated_mut(&mut self, name: &str) -> ConfigResult<&mut ConfigEntry> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownField(name.to_string()))
    }
}

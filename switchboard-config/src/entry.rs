use crate::coerce::{parse_int, to_text, truthy, INVALID_INT};
use crate::error::{ConfigError, ConfigResult};
use crate::schema::{Choice, FieldDescription, FieldType};
use crate::tree::ConfigTree;
use indexmap::IndexMap;
use serde_json::Value;

/// One declared field of a [`ConfigTree`] together with its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    name: String,
    description: Option<String>,
    i18n: Option<String>,
    value: EntryValue,
}

/// The value held by a [`ConfigEntry`], one variant per field type.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    /// `str` or `password` (`masked`). Holds whatever the payload carried;
    /// falsy values read back as `""`.
    Text { value: Value, masked: bool },
    Bool(bool),
    /// `int`; `-1` when the stored value could not be parsed.
    Int(i64),
    /// `enum`. Writes from a payload are not checked against `choices`.
    Enum {
        choices: Vec<Value>,
        selected: Value,
    },
    /// Non-repeating `section`.
    Section(ConfigTree),
    /// Repeating `section`: a list of sub-trees sharing one content schema.
    Repeated {
        content: Vec<FieldDescription>,
        min: usize,
        sections: Vec<ConfigTree>,
    },
    /// `nested_enum`: the selected choice plus one sub-tree per choice.
    /// Invariant: `selected` is always a key of `branches`.
    NestedEnum {
        selected: String,
        branches: IndexMap<String, ConfigTree>,
    },
}

impl ConfigEntry {
    /// Builds an entry (recursively, for sections and nested enums) from its
    /// declaration, with the initial value of its type.
    pub fn from_description(description: &FieldDescription) -> ConfigResult<Self> {
        let name = description.name.as_str();
        let value = match description.field_type {
            FieldType::Str | FieldType::Password => EntryValue::Text {
                value: Value::from(""),
                masked: description.field_type == FieldType::Password,
            },
            FieldType::Bool => EntryValue::Bool(false),
            FieldType::Int => EntryValue::Int(INVALID_INT),
            FieldType::Enum => {
                let choices: Vec<Value> = description.choices.iter().map(Choice::value).collect();
                let selected = choices
                    .first()
                    .cloned()
                    .ok_or_else(|| ConfigError::invalid_schema(name, "enum without choices"))?;
                EntryValue::Enum { choices, selected }
            }
            FieldType::Section if description.repeat => {
                let sections = (0..description.min)
                    .map(|_| ConfigTree::from_structure(&description.content))
                    .collect::<ConfigResult<Vec<_>>>()?;
                EntryValue::Repeated {
                    content: description.content.clone(),
                    min: description.min,
                    sections,
                }
            }
            FieldType::Section => {
                EntryValue::Section(ConfigTree::from_structure(&description.content)?)
            }
            FieldType::NestedEnum => {
                let mut branches = IndexMap::new();
                for choice in &description.choices {
                    let Choice::Nested { value, content } = choice else {
                        return Err(ConfigError::invalid_schema(
                            name,
                            "nested_enum choices need a value and content",
                        ));
                    };
                    branches.insert(value.clone(), ConfigTree::from_structure(content)?);
                }
                let selected = branches.keys().next().cloned().ok_or_else(|| {
                    ConfigError::invalid_schema(name, "nested_enum without choices")
                })?;
                EntryValue::NestedEnum { selected, branches }
            }
        };
        Ok(Self {
            name: description.name.clone(),
            description: description.description.clone(),
            i18n: description.i18n.clone(),
            value,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn i18n(&self) -> Option<&str> {
        self.i18n.as_deref()
    }

    pub fn value(&self) -> &EntryValue {
        &self.value
    }

    /// The declared type of this field.
    pub fn field_type(&self) -> FieldType {
        match &self.value {
            EntryValue::Text { masked: false, .. } => FieldType::Str,
            EntryValue::Text { masked: true, .. } => FieldType::Password,
            EntryValue::Bool(_) => FieldType::Bool,
            EntryValue::Int(_) => FieldType::Int,
            EntryValue::Enum { .. } => FieldType::Enum,
            EntryValue::Section(_) | EntryValue::Repeated { .. } => FieldType::Section,
            EntryValue::NestedEnum { .. } => FieldType::NestedEnum,
        }
    }

    /// Returns true for repeating sections.
    pub fn is_repeated(&self) -> bool {
        matches!(self.value, EntryValue::Repeated { .. })
    }

    /// Choice values of an `enum` or `nested_enum`, in declaration order.
    pub fn choices(&self) -> Vec<Value> {
        match &self.value {
            EntryValue::Enum { choices, .. } => choices.clone(),
            EntryValue::NestedEnum { branches, .. } => {
                branches.keys().map(|key| Value::from(key.as_str())).collect()
            }
            _ => Vec::new(),
        }
    }

    // ── Typed accessors ──────────────────────────────────────────

    /// Text of a `str`, `password`, `enum` or `nested_enum` field. `None`
    /// when the stored value is not a string.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            EntryValue::Text { value, .. } => value.as_str(),
            EntryValue::Enum { selected, .. } => selected.as_str(),
            EntryValue::NestedEnum { selected, .. } => Some(selected),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            EntryValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            EntryValue::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Child tree of a non-repeating section, or of the selected nested-enum branch.
    pub fn section(&self) -> Option<&ConfigTree> {
        match &self.value {
            EntryValue::Section(tree) => Some(tree),
            EntryValue::NestedEnum { selected, branches } => branches.get(selected),
            _ => None,
        }
    }

    pub fn section_mut(&mut self) -> Option<&mut ConfigTree> {
        match &mut self.value {
            EntryValue::Section(tree) => Some(tree),
            EntryValue::NestedEnum { selected, branches } => branches.get_mut(selected.as_str()),
            _ => None,
        }
    }

    /// Sub-trees of a repeating section.
    pub fn sections(&self) -> &[ConfigTree] {
        match &self.value {
            EntryValue::Repeated { sections, .. } => sections,
            _ => &[],
        }
    }

    pub fn sections_mut(&mut self) -> &mut [ConfigTree] {
        match &mut self.value {
            EntryValue::Repeated { sections, .. } => sections,
            _ => &mut [],
        }
    }

    /// Branch of a nested enum for a given choice, selected or not.
    pub fn branch(&self, choice: &str) -> Option<&ConfigTree> {
        match &self.value {
            EntryValue::NestedEnum { branches, .. } => branches.get(choice),
            _ => None,
        }
    }

    // ── Editing ──────────────────────────────────────────────────

    /// Assigns a payload value following the per-type coercion rules.
    ///
    /// Sections delegate to their child trees; repeating sections reconcile
    /// their list against the incoming array (existing sub-trees are updated
    /// in place, missing ones appended, extra ones dropped).
    pub fn set_value(&mut self, incoming: &Value) -> ConfigResult<()> {
        let name = self.name.as_str();
        match &mut self.value {
            EntryValue::Text { value, .. } => *value = incoming.clone(),
            EntryValue::Bool(value) => *value = truthy(incoming),
            EntryValue::Int(value) => *value = parse_int(incoming),
            EntryValue::Enum { selected, .. } => *selected = incoming.clone(),
            EntryValue::Section(tree) => tree.apply_config(incoming)?,
            EntryValue::Repeated {
                content, sections, ..
            } => {
                let items = incoming
                    .as_array()
                    .ok_or_else(|| ConfigError::shape(name, "an array of sections"))?;
                for (index, item) in items.iter().enumerate() {
                    if let Some(existing) = sections.get_mut(index) {
                        existing.apply_config(item)?;
                    } else {
                        let mut section = ConfigTree::from_structure(content)?;
                        section.apply_config(item)?;
                        sections.push(section);
                    }
                }
                sections.truncate(items.len());
            }
            EntryValue::NestedEnum { selected, branches } => {
                let (choice, nested) = match incoming.as_array().map(Vec::as_slice) {
                    Some([choice, nested, ..]) => (to_text(choice), nested),
                    _ => return Err(ConfigError::shape(name, "a [choice, config] pair")),
                };
                let branch = branches
                    .get_mut(choice.as_str())
                    .ok_or_else(|| ConfigError::UnknownChoice {
                        field: name.to_string(),
                        choice: choice.clone(),
                    })?;
                branch.apply_config(nested)?;
                *selected = choice;
            }
        }
        Ok(())
    }

    /// Serializes the current value into its payload shape.
    pub fn get_value(&self) -> Value {
        match &self.value {
            EntryValue::Text { value, .. } if truthy(value) => value.clone(),
            EntryValue::Text { .. } => Value::from(""),
            EntryValue::Bool(value) => Value::from(*value),
            EntryValue::Int(value) => Value::from(*value),
            EntryValue::Enum { selected, .. } => selected.clone(),
            EntryValue::Section(tree) => tree.get_config(),
            EntryValue::Repeated { sections, .. } => {
                Value::Array(sections.iter().map(ConfigTree::get_config).collect())
            }
            EntryValue::NestedEnum { selected, branches } => {
                let nested = branches
                    .get(selected)
                    .map_or_else(|| Value::Object(Default::default()), ConfigTree::get_config);
                Value::Array(vec![Value::from(selected.as_str()), nested])
            }
        }
    }

    /// Selects a choice of an `enum` or `nested_enum`, checked against the
    /// declared choices (unlike payload writes).
    pub fn select(&mut self, choice: impl Into<Value>) -> ConfigResult<()> {
        let choice = choice.into();
        let unknown = |name: &str, choice: &Value| ConfigError::UnknownChoice {
            field: name.to_string(),
            choice: choice_text(choice),
        };
        match &mut self.value {
            EntryValue::Enum { choices, selected } => {
                if !choices.contains(&choice) {
                    return Err(unknown(&self.name, &choice));
                }
                *selected = choice;
                Ok(())
            }
            EntryValue::NestedEnum { selected, branches } => {
                match choice.as_str().filter(|key| branches.contains_key(*key)) {
                    Some(key) => {
                        *selected = key.to_string();
                        Ok(())
                    }
                    None => Err(unknown(&self.name, &choice)),
                }
            }
            _ => Err(ConfigError::shape(&self.name, "a choice field")),
        }
    }

    // ── Repeat groups ────────────────────────────────────────────

    /// Returns true when a repeating section holds more sub-trees than its minimum.
    pub fn can_remove_section(&self) -> bool {
        match &self.value {
            EntryValue::Repeated { min, sections, .. } => sections.len() > *min,
            _ => false,
        }
    }

    /// Appends a fresh sub-tree built from the section's content schema.
    pub fn add_section(&mut self) -> ConfigResult<&mut ConfigTree> {
        let EntryValue::Repeated {
            content, sections, ..
        } = &mut self.value
        else {
            return Err(ConfigError::NotRepeated(self.name.clone()));
        };
        sections.push(ConfigTree::from_structure(content)?);
        let last = sections.len() - 1;
        Ok(&mut sections[last])
    }

    /// Drops the last sub-tree, unless that would go below the minimum.
    /// Returns whether a section was removed.
    pub fn remove_section(&mut self) -> ConfigResult<bool> {
        if !self.is_repeated() {
            return Err(ConfigError::NotRepeated(self.name.clone()));
        }
        if !self.can_remove_section() {
            return Ok(false);
        }
        if let EntryValue::Repeated { sections, .. } = &mut self.value {
            sections.pop();
        }
        Ok(true)
    }
}

fn choice_text(choice: &Value) -> String {
    match choice {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

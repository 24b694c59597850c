use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field declaration of an app's configuration schema.
///
/// Mirrors the description the gateway returns for an app:
/// `{"name": "port", "type": "int", "description": "..."}`. Sections carry
/// their sub-schema in `content`; nested enums carry one sub-schema per
/// choice in `choices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Translation key for the field label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i18n: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Allowed values. Plain JSON values for `enum`, `{value, content}` for `nested_enum`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// For `section`: hold a list of sub-trees instead of one.
    #[serde(default, skip_serializing_if = "is_false")]
    pub repeat: bool,
    /// For repeated sections: number of sub-trees created up front and the
    /// floor below which the UI may not remove sections.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub min: usize,
    /// Sub-schema of a `section`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<FieldDescription>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl FieldDescription {
    /// A bare declaration of the given type, without choices or content.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            description: None,
            i18n: None,
            field_type,
            choices: Vec::new(),
            repeat: false,
            min: 0,
            content: Vec::new(),
        }
    }

    /// Shorthand for a free text field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Str)
    }

    /// Shorthand for a masked text field.
    pub fn password(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Password)
    }

    /// Shorthand for a checkbox.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Bool)
    }

    /// Shorthand for an integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    /// Shorthand for a dropdown of fixed values.
    pub fn enumeration<I, S>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Value>,
    {
        Self {
            choices: choices.into_iter().map(|c| Choice::Plain(c.into())).collect(),
            ..Self::new(name, FieldType::Enum)
        }
    }

    /// Shorthand for a single nested section.
    pub fn section(name: impl Into<String>, content: Vec<FieldDescription>) -> Self {
        Self {
            content,
            ..Self::new(name, FieldType::Section)
        }
    }

    /// Shorthand for a repeat group of sections with at least `min` entries.
    pub fn repeated(name: impl Into<String>, min: usize, content: Vec<FieldDescription>) -> Self {
        Self {
            repeat: true,
            min,
            content,
            ..Self::new(name, FieldType::Section)
        }
    }

    /// Shorthand for a dropdown whose selection reveals a per-choice sub-form.
    pub fn nested_enum(name: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            choices,
            ..Self::new(name, FieldType::NestedEnum)
        }
    }

    /// Attaches a human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a translation key.
    #[must_use]
    pub fn with_i18n(mut self, key: impl Into<String>) -> Self {
        self.i18n = Some(key.into());
        self
    }
}

/// The type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Str,
    Password,
    Bool,
    Int,
    Enum,
    Section,
    NestedEnum,
}

/// One allowed value of an `enum` or `nested_enum` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    /// A `nested_enum` choice with the sub-schema shown when it is selected.
    Nested {
        value: String,
        #[serde(default)]
        content: Vec<FieldDescription>,
    },
    /// An `enum` choice, stored in the payload as is.
    Plain(Value),
}

impl Choice {
    /// Shorthand for a nested choice.
    pub fn nested(value: impl Into<String>, content: Vec<FieldDescription>) -> Self {
        Self::Nested {
            value: value.into(),
            content,
        }
    }

    /// The value stored in the configuration payload when this choice is selected.
    pub fn value(&self) -> Value {
        match self {
            Self::Nested { value, .. } => Value::from(value.as_str()),
            Self::Plain(value) => value.clone(),
        }
    }
}

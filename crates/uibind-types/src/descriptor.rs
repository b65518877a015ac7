//! Field descriptors: the `(name, type, source id)` triples the generator
//! reasons about.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of the source node a descriptor was derived from.
///
/// The generator never interprets it; it is carried through to the hand-off
/// so a downstream step can re-attach runtime references.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for SourceId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// One generated field: its declaration, bindings and handlers all derive
/// from this.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, unique within one generation.
    pub name: String,
    /// Declared type, e.g. `Button` or `TMP_InputField`.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Node the descriptor was derived from.
    #[serde(default)]
    pub source_id: SourceId,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            source_id: SourceId::default(),
        }
    }

    pub fn with_source(mut self, source_id: impl Into<SourceId>) -> Self {
        self.source_id = source_id.into();
        self
    }

    /// Semantic categories of this field's type.
    pub fn categories(&self) -> Vec<TypeCategory> {
        TypeCategory::of(&self.field_type)
    }

    /// Handler methods generated for this field, in emission order.
    pub fn handlers(&self) -> Vec<HandlerKind> {
        self.categories()
            .into_iter()
            .flat_map(|c| c.handlers().iter().copied())
            .collect()
    }
}

/// Semantic category of a field type. Decides which bindings and handler
/// stubs are generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// Clickable (`Button`).
    Click,
    /// Text input (`InputField`): value-changed and end-edit.
    Input,
    /// On/off toggle (`Toggle`).
    Toggle,
}

impl TypeCategory {
    /// Categories of `field_type`, by substring match on the type name.
    ///
    /// A type can fall into several categories, or none (plain display
    /// types such as `Text` or `Image` get a declaration only).
    pub fn of(field_type: &str) -> Vec<TypeCategory> {
        let mut categories = Vec::new();
        if field_type.contains("Button") {
            categories.push(TypeCategory::Click);
        }
        if field_type.contains("InputField") {
            categories.push(TypeCategory::Input);
        }
        if field_type.contains("Toggle") {
            categories.push(TypeCategory::Toggle);
        }
        categories
    }

    pub fn handlers(self) -> &'static [HandlerKind] {
        match self {
            TypeCategory::Click => &[HandlerKind::ButtonClick],
            TypeCategory::Input => &[HandlerKind::InputChange, HandlerKind::InputEnd],
            TypeCategory::Toggle => &[HandlerKind::ToggleChange],
        }
    }
}

/// A generated handler method and the event it is registered on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    ButtonClick,
    InputChange,
    InputEnd,
    ToggleChange,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 4] = [
        HandlerKind::ButtonClick,
        HandlerKind::InputChange,
        HandlerKind::InputEnd,
        HandlerKind::ToggleChange,
    ];

    /// Handler method name for `field`, e.g. `OnStartButtonClick`.
    pub fn method_name(self, field: &str) -> String {
        let suffix = match self {
            HandlerKind::ButtonClick => "ButtonClick",
            HandlerKind::InputChange => "InputChange",
            HandlerKind::InputEnd => "InputEnd",
            HandlerKind::ToggleChange => "ToggleChange",
        };
        format!("On{field}{suffix}")
    }

    /// Event member the handler is registered on.
    pub fn event(self) -> &'static str {
        match self {
            HandlerKind::ButtonClick => "onClick",
            HandlerKind::InputChange | HandlerKind::ToggleChange => "onValueChanged",
            HandlerKind::InputEnd => "onEndEdit",
        }
    }

    /// Parameter list of the handler method.
    pub fn parameters(self) -> &'static str {
        match self {
            HandlerKind::ButtonClick => "",
            HandlerKind::InputChange | HandlerKind::InputEnd => "string value",
            HandlerKind::ToggleChange => "bool value",
        }
    }

    /// Whether the listener forwards the event value.
    pub fn takes_value(self) -> bool {
        !matches!(self, HandlerKind::ButtonClick)
    }
}

/// Event members recognised in binding-registration calls.
pub const BINDING_EVENTS: [&str; 3] = ["onClick", "onValueChanged", "onEndEdit"];

/// Collapse duplicate names; the first occurrence wins and order is kept.
pub fn unique_by_name(descriptors: &[FieldDescriptor]) -> Vec<FieldDescriptor> {
    let mut seen = HashSet::new();
    descriptors
        .iter()
        .filter(|d| seen.insert(d.name.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_by_substring() {
        assert_eq!(TypeCategory::of("Button"), vec![TypeCategory::Click]);
        assert_eq!(TypeCategory::of("TMP_InputField"), vec![TypeCategory::Input]);
        assert_eq!(TypeCategory::of("Toggle"), vec![TypeCategory::Toggle]);
        assert!(TypeCategory::of("TextMeshProUGUI").is_empty());
    }

    #[test]
    fn input_fields_get_two_handlers() {
        let d = FieldDescriptor::new("Name", "InputField");
        assert_eq!(d.handlers(), vec![HandlerKind::InputChange, HandlerKind::InputEnd]);
    }

    #[test]
    fn method_names_follow_convention() {
        assert_eq!(HandlerKind::ButtonClick.method_name("Start"), "OnStartButtonClick");
        assert_eq!(HandlerKind::InputEnd.method_name("Name"), "OnNameInputEnd");
        assert_eq!(HandlerKind::ToggleChange.method_name("Sound"), "OnSoundToggleChange");
    }

    #[test]
    fn unique_by_name_keeps_first() {
        let list = vec![
            FieldDescriptor::new("A", "Button"),
            FieldDescriptor::new("B", "Text"),
            FieldDescriptor::new("A", "Toggle"),
        ];
        let unique = unique_by_name(&list);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].field_type, "Button");
        assert_eq!(unique[1].name, "B");
    }

    #[test]
    fn serde_uses_type_key() {
        let d = FieldDescriptor::new("Play", "Button").with_source(7u64);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "Button");
        assert_eq!(json["source_id"], "7");
        let back: FieldDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}

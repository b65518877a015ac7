use std::path::Path;

use chrono::format::{Fixed, Item, Numeric, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::document::AnchorKind;
use crate::error::{TypesError, TypesResult};

/// Configuration for one generator instance.
///
/// Passed explicitly to every component; there is no process-wide settings
/// object. Every field has a default, so a TOML file only needs to name the
/// values it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Namespace wrapping generated classes. `None` emits no wrapper.
    pub namespace: Option<String>,
    /// Base class of generated panels.
    pub base_class: String,
    /// Required suffix of generated class names.
    pub class_suffix: Option<String>,
    /// One level of indentation in generated code.
    pub indent: String,
    pub anchors: Anchors,
    pub markers: MarkerStyle,
    pub lifecycle: Lifecycle,
    pub backup: BackupConfig,
    pub handoff: HandoffConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            namespace: Some("MyFrameWork".into()),
            base_class: "BasePanel".into(),
            class_suffix: Some("Panel".into()),
            indent: "\t".into(),
            anchors: Anchors::default(),
            markers: MarkerStyle::default(),
            lifecycle: Lifecycle::default(),
            backup: BackupConfig::default(),
            handoff: HandoffConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> TypesResult<Self> {
        let config: GeneratorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> TypesResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the invariants the merge engine relies on.
    pub fn validate(&self) -> TypesResult<()> {
        if self.markers.added.trim().is_empty() || self.markers.removed.trim().is_empty() {
            return Err(TypesError::Config("marker strings must not be empty".into()));
        }
        if self.markers.added.contains(&self.markers.removed)
            || self.markers.removed.contains(&self.markers.added)
        {
            return Err(TypesError::Config(
                "added and removed markers must not contain each other".into(),
            ));
        }

        let anchors = [&self.anchors.field, &self.anchors.binding, &self.anchors.handler];
        if anchors.iter().any(|a| a.trim().is_empty()) {
            return Err(TypesError::Config("anchor strings must not be empty".into()));
        }
        for (i, a) in anchors.iter().enumerate() {
            for b in &anchors[i + 1..] {
                if a.contains(b.as_str()) || b.contains(a.as_str()) {
                    return Err(TypesError::Config(format!(
                        "anchors must be distinguishable: {a:?} / {b:?}"
                    )));
                }
            }
        }

        if self.backup.max_count == 0 {
            return Err(TypesError::Config("backup.max_count must be at least 1".into()));
        }
        if self.backup.suffix.is_empty() && self.backup.extension.is_empty() {
            return Err(TypesError::Config(
                "backup suffix and extension must not both be empty".into(),
            ));
        }
        check_timestamp_format(&self.backup.timestamp_format)?;
        if self.handoff.key.is_empty() || self.handoff.class_key.is_empty() {
            return Err(TypesError::Config("handoff keys must not be empty".into()));
        }
        if self.handoff.key == self.handoff.class_key {
            return Err(TypesError::Config(
                "handoff.key and handoff.class_key must differ".into(),
            ));
        }
        Ok(())
    }

    /// Anchor text for an insertion category.
    pub fn anchor(&self, kind: AnchorKind) -> &str {
        match kind {
            AnchorKind::Field => &self.anchors.field,
            AnchorKind::Binding => &self.anchors.binding,
            AnchorKind::Handler => &self.anchors.handler,
        }
    }

    /// Validate a class name against identifier rules and the configured
    /// suffix.
    pub fn validate_class_name(&self, name: &str) -> TypesResult<()> {
        let invalid = |reason: String| TypesError::InvalidClassName {
            name: name.to_string(),
            reason,
        };

        let mut chars = name.chars();
        match chars.next() {
            None => return Err(invalid("must not be empty".into())),
            Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
                return Err(invalid("must start with a letter or '_'".into()));
            }
            _ => {}
        }
        if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(invalid(format!("contains invalid character {c:?}")));
        }
        if let Some(suffix) = &self.class_suffix {
            if !name.ends_with(suffix.as_str()) {
                return Err(invalid(format!("must end with {suffix:?}, e.g. {name}{suffix}")));
            }
        }
        Ok(())
    }
}

/// Anchor comments marking the three insertion points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Anchors {
    pub field: String,
    pub binding: String,
    pub handler: String,
}

impl Default for Anchors {
    fn default() -> Self {
        Self {
            field: "// Reserved for new fields".into(),
            binding: "// Reserved for new event bindings".into(),
            handler: "// Reserved for new event handlers".into(),
        }
    }
}

/// In-band marker strings appended to changed lines during review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub added: String,
    pub removed: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            added: "// NEW_ADD".into(),
            removed: "// REMOVE_MARK".into(),
        }
    }
}

/// Names of the fixed methods in a generated panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lifecycle {
    pub init_method: String,
    /// Lifecycle method holding the binding registrations.
    pub binding_method: String,
    pub show_method: String,
    pub hide_method: String,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            init_method: "Awake".into(),
            binding_method: "Start".into(),
            show_method: "ShowMe".into(),
            hide_method: "HideMe".into(),
        }
    }
}

/// Backup rotation settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub enabled: bool,
    /// Backup directory, relative to the target's directory unless absolute.
    pub sub_dir: String,
    pub suffix: String,
    pub extension: String,
    /// Retention cap; the oldest backups beyond it are deleted.
    pub max_count: usize,
    /// `chrono` format of the timestamp embedded in backup names.
    pub timestamp_format: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sub_dir: "Backup".into(),
            suffix: "_Backup".into(),
            extension: ".uibak".into(),
            max_count: 10,
            timestamp_format: "%Y%m%d%H%M%S".into(),
        }
    }
}

/// Reject strftime formats chrono cannot render, and formats without a
/// seconds field: backup stamps advance one second at a time and must stay
/// distinct.
fn check_timestamp_format(format: &str) -> TypesResult<()> {
    let mut has_seconds = false;
    for item in StrftimeItems::new(format) {
        match item {
            Item::Error => {
                return Err(TypesError::Config(format!(
                    "backup.timestamp_format {format:?} is not a valid strftime format"
                )))
            }
            Item::Numeric(Numeric::Second | Numeric::Timestamp, _)
            | Item::Fixed(Fixed::RFC2822 | Fixed::RFC3339) => has_seconds = true,
            _ => {}
        }
    }
    if !has_seconds {
        return Err(TypesError::Config(format!(
            "backup.timestamp_format {format:?} must include seconds"
        )));
    }
    Ok(())
}

/// Where the descriptor hand-off entries live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Key of the descriptor list.
    pub key: String,
    /// Key of the generated class name.
    pub class_key: String,
    pub path: String,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            key: "objDataList".into(),
            class_key: "GeneratorClassName".into(),
            path: ".uibind/handoff.json".into(),
        }
    }
}

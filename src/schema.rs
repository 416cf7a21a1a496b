//! Schema types describing the provider configuration and its resources.
//!
//! The host uses schemas to validate configuration, render documentation
//! and decide which attribute changes force a resource to be replaced.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// A string value.
    String,
    /// A 64-bit integer.
    Int64,
    /// A boolean value.
    Bool,
}

impl AttributeType {
    /// The JSON type name used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int64 => "integer",
            Self::Bool => "boolean",
        }
    }
}

/// Describes how an attribute can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeFlags {
    /// The attribute must be set in configuration.
    pub required: bool,
    /// The attribute may be set in configuration.
    pub optional: bool,
    /// The provider fills the attribute in.
    pub computed: bool,
    /// The value must not be shown in logs or plan output.
    pub sensitive: bool,
}

impl AttributeFlags {
    /// Flags for a required attribute.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// Flags for an optional attribute.
    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Default::default()
        }
    }

    /// Flags for a read-only attribute set by the provider.
    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Default::default()
        }
    }

    /// Flags for an attribute the user may set and the provider defaults.
    pub fn optional_computed() -> Self {
        Self {
            optional: true,
            computed: true,
            ..Default::default()
        }
    }
}

/// A single attribute in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// The type of the attribute.
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// How the attribute can be used.
    #[serde(flatten)]
    pub flags: AttributeFlags,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Changing this attribute replaces the resource.
    #[serde(default)]
    pub force_new: bool,
    /// Value applied at plan time when configuration leaves it unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// The only values a string attribute accepts; empty means any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl Attribute {
    /// Create an attribute with the given type and flags.
    pub fn new(attr_type: AttributeType, flags: AttributeFlags) -> Self {
        Self {
            attr_type,
            flags,
            description: None,
            force_new: false,
            default: None,
            allowed_values: Vec::new(),
        }
    }

    /// A required string attribute.
    pub fn required_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::required())
    }

    /// An optional string attribute.
    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::optional())
    }

    /// A required int64 attribute.
    pub fn required_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::required())
    }

    /// An optional int64 attribute.
    pub fn optional_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::optional())
    }

    /// A computed int64 attribute.
    pub fn computed_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::computed())
    }

    /// An optional bool attribute.
    pub fn optional_bool() -> Self {
        Self::new(AttributeType::Bool, AttributeFlags::optional())
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the resource when this attribute changes.
    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Set a default, making the attribute computed as well.
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self.flags.computed = true;
        self
    }

    /// Restrict the attribute to a fixed set of values.
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the attribute as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }
}

/// How a nested block appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    /// At most one block, represented as an object.
    #[default]
    Single,
}

/// A group of attributes and nested blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Block {
    /// Attributes by name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Attribute>,
    /// Nested blocks by name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub blocks: HashMap<String, NestedBlock>,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Block {
    /// Create an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A nested block with its nesting mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedBlock {
    /// The block definition.
    #[serde(flatten)]
    pub block: Block,
    /// How the block is nested.
    #[serde(default)]
    pub nesting_mode: NestingMode,
    /// Minimum number of blocks.
    #[serde(default)]
    pub min_items: u32,
    /// Maximum number of blocks (0 = unlimited).
    #[serde(default)]
    pub max_items: u32,
}

impl NestedBlock {
    /// A single optional nested block.
    pub fn single(block: Block) -> Self {
        Self {
            block,
            nesting_mode: NestingMode::Single,
            min_items: 0,
            max_items: 1,
        }
    }
}

/// Schema for a resource or the provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Version of the state layout, bumped when state needs upgrading.
    #[serde(default)]
    pub version: u64,
    /// The root block.
    #[serde(flatten)]
    pub block: Block,
}

impl Schema {
    /// Create an empty schema at the given version.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            block: Block::new(),
        }
    }

    /// Create an empty schema at version 0.
    pub fn v0() -> Self {
        Self::new(0)
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.block.attributes.insert(name.into(), attr);
        self
    }

    /// Add a nested block.
    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.block.blocks.insert(name.into(), block);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.block.description = Some(description.into());
        self
    }

    /// Look up a top-level attribute.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.get(name)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::v0()
    }
}

/// Every schema the provider exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderSchema {
    /// Schema for the provider configuration.
    #[serde(default)]
    pub provider: Schema,
    /// Schemas by resource type name.
    #[serde(default)]
    pub resources: HashMap<String, Schema>,
}

impl ProviderSchema {
    /// Create an empty provider schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider configuration schema.
    pub fn with_provider_config(mut self, schema: Schema) -> Self {
        self.provider = schema;
        self
    }

    /// Add a resource schema.
    pub fn with_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// The operation failed.
    Error,
    /// The operation went ahead but something looks wrong.
    Warning,
}

/// A diagnostic message returned to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: DiagnosticSeverity,
    /// Short summary.
    pub summary: String,
    /// Longer explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Attribute path the diagnostic refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

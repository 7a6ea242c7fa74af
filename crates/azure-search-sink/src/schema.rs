//! Field schema for the target index.
//!
//! A schema is an ordered mapping from field name to a type descriptor and
//! optional default value. It is supplied once at sink construction and is
//! immutable for the sink's lifetime. The loosely typed boundary form
//! (`{"type": "...", "default": ...}` per field) maps onto the closed
//! [`FieldKind`] set here; unknown type tags are rejected when the schema is
//! built, not when a batch is uploaded.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Closed set of field kinds the sink can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    /// A single string value.
    String,
    /// A collection of strings (tags, categories).
    StringCollection,
    /// A collection of numbers; an embedding vector when the field declares
    /// a dimensionality. `"collection"` is accepted as an alias for
    /// compatibility with the loose boundary format.
    #[serde(alias = "collection")]
    NumberCollection,
}

impl FieldKind {
    /// Human-readable description used in validation errors.
    pub(crate) fn describe(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::StringCollection => "a collection of strings",
            FieldKind::NumberCollection => "a collection of numbers",
        }
    }
}

/// Whether a JSON value is acceptable for a field of the given kind.
pub(crate) fn value_matches(kind: FieldKind, value: &Value) -> bool {
    match kind {
        FieldKind::String => value.is_string(),
        FieldKind::StringCollection => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        FieldKind::NumberCollection => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_number)),
    }
}

/// Type descriptor and default for one schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field kind. Unknown type tags are rejected at parse time.
    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Value filled in when a record omits the field. `None` (or JSON
    /// `null`) means the field is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Expected element count for vector fields, enforced on supplied
    /// values. Only meaningful on number collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
}

impl FieldSpec {
    /// A required field of the given kind.
    #[must_use]
    pub fn required(kind: FieldKind) -> Self {
        Self {
            kind,
            default: None,
            dimensions: None,
        }
    }

    /// A field that falls back to `default` when a record omits it.
    #[must_use]
    pub fn with_default(kind: FieldKind, default: Value) -> Self {
        Self {
            kind,
            default: Some(default),
            dimensions: None,
        }
    }

    /// A required embedding field of fixed dimensionality.
    #[must_use]
    pub fn vector(dimensions: u32) -> Self {
        Self {
            kind: FieldKind::NumberCollection,
            default: None,
            dimensions: Some(dimensions),
        }
    }
}

/// One named field within an [`IndexSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// Field name as it appears in uploaded documents.
    pub name: String,
    /// Type descriptor and default.
    pub spec: FieldSpec,
}

/// Ordered field schema supplied once at sink construction.
///
/// Build one with [`IndexSchema::builder`], or parse the loose JSON mapping
/// form:
///
/// ```
/// use azure_search_sink::IndexSchema;
///
/// let schema: IndexSchema = serde_json::from_str(
///     r#"{
///         "id": {"type": "string"},
///         "content": {"type": "string", "default": ""},
///         "vector": {"type": "collection", "default": []}
///     }"#,
/// )?;
/// assert_eq!(schema.len(), 3);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSchema {
    fields: Vec<SchemaField>,
}

impl IndexSchema {
    /// Start building a schema field by field.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Parse a schema from the loose JSON mapping form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unknown type tags, duplicate or
    /// missing fields, or misplaced dimensionality declarations.
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| Error::config(format!("malformed schema: {e}")))
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields. A sink cannot be built from an
    /// empty schema.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field spec by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.spec)
    }

    fn validated(fields: Vec<SchemaField>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::config("schema must declare at least one field"));
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|other| other.name == field.name) {
                return Err(Error::config(format!(
                    "duplicate schema field `{}`",
                    field.name
                )));
            }
            match field.spec.dimensions {
                Some(0) => {
                    return Err(Error::config(format!(
                        "field `{}` declares zero dimensions",
                        field.name
                    )));
                }
                Some(_) if field.spec.kind != FieldKind::NumberCollection => {
                    return Err(Error::config(format!(
                        "field `{}` declares dimensions but is not a number collection",
                        field.name
                    )));
                }
                _ => {}
            }
            if let Some(default) = &field.spec.default {
                if !value_matches(field.spec.kind, default) {
                    return Err(Error::config(format!(
                        "default for field `{}` is not {}",
                        field.name,
                        field.spec.kind.describe()
                    )));
                }
            }
        }
        Ok(Self { fields })
    }
}

impl Serialize for IndexSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, &field.spec)?;
        }
        map.end()
    }
}

// Deserialized by hand so the mapping's declaration order survives and the
// schema invariants hold for every construction path.
impl<'de> Deserialize<'de> for IndexSchema {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = IndexSchema;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping from field name to field spec")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, spec)) = access.next_entry::<String, FieldSpec>()? {
                    fields.push(SchemaField { name, spec });
                }
                IndexSchema::validated(fields).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

/// Builder for [`IndexSchema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<SchemaField>,
}

impl SchemaBuilder {
    /// Add a required field of the given kind.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            spec: FieldSpec::required(kind),
        });
        self
    }

    /// Add a field with a default filled in when a record omits it.
    #[must_use]
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        default: Value,
    ) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            spec: FieldSpec::with_default(kind, default),
        });
        self
    }

    /// Add a required embedding field of fixed dimensionality.
    #[must_use]
    pub fn vector_field(mut self, name: impl Into<String>, dimensions: u32) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            spec: FieldSpec::vector(dimensions),
        });
        self
    }

    /// Finish building.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the schema is empty or violates a
    /// field invariant (duplicate name, dimensionality on a non-vector
    /// field, default of the wrong type).
    pub fn build(self) -> Result<IndexSchema> {
        IndexSchema::validated(self.fields)
    }
}

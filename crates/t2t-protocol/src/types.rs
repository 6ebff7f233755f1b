//! Structural type descriptors.
//!
//! A [`TypeDescriptor`] is the JSON-Schema-shaped description of a property
//! value, a method parameter or a notification payload. Descriptors carry no
//! identity: two descriptors are the same type exactly when they compare equal.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value, json};

/// Element description of an array type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItems {
    /// Variable-length array; every element has this type.
    Single(Box<TypeDescriptor>),
    /// Fixed-length heterogeneous tuple (a struct); one descriptor per position.
    Tuple(Vec<TypeDescriptor>),
}

/// Structural description of a value type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Boolean,
    Number,
    String,
    /// Integer with optional bounds. Bounds are kept as
    /// `i128` so that every fixed-width bound, up to `2^64`, is exact.
    Integer {
        minimum: Option<i128>,
        maximum: Option<i128>,
    },
    Array {
        items: ArrayItems,
    },
    /// Object type. A dictionary sets `additional_properties` to the value
    /// type; a record lists its `properties` by name instead.
    Object {
        additional_properties: Option<Box<TypeDescriptor>>,
        properties: IndexMap<String, TypeDescriptor>,
    },
    /// A named type wrapping another descriptor.
    Titled {
        title: String,
        inner: Box<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    pub fn integer(minimum: i128, maximum: i128) -> Self {
        Self::Integer {
            minimum: Some(minimum),
            maximum: Some(maximum),
        }
    }

    /// Integer without declared bounds.
    pub fn unbounded_integer() -> Self {
        Self::Integer {
            minimum: None,
            maximum: None,
        }
    }

    pub fn array(items: TypeDescriptor) -> Self {
        Self::Array {
            items: ArrayItems::Single(Box::new(items)),
        }
    }

    /// A struct: a fixed-length array whose items are the member types in order.
    pub fn structure(members: Vec<TypeDescriptor>) -> Self {
        Self::Array {
            items: ArrayItems::Tuple(members),
        }
    }

    /// A string-keyed dictionary of `value` typed entries.
    pub fn dictionary(value: TypeDescriptor) -> Self {
        Self::Object {
            additional_properties: Some(Box::new(value)),
            properties: IndexMap::new(),
        }
    }

    pub fn record(properties: IndexMap<String, TypeDescriptor>) -> Self {
        Self::Object {
            additional_properties: None,
            properties,
        }
    }

    pub fn titled(title: impl Into<String>, inner: TypeDescriptor) -> Self {
        Self::Titled {
            title: title.into(),
            inner: Box::new(inner),
        }
    }

    /// Member types when this descriptor is a struct.
    pub fn struct_members(&self) -> Option<&[TypeDescriptor]> {
        match self {
            Self::Array {
                items: ArrayItems::Tuple(members),
            } => Some(members),
            _ => None,
        }
    }

    /// The JSON Schema `type` keyword for this descriptor.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Integer { .. } => "integer",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::Titled { inner, .. } => inner.type_name(),
        }
    }

    /// Renders the descriptor as a JSON Schema document.
    pub fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        self.write_json_schema(&mut schema);
        Value::Object(schema)
    }

    fn write_json_schema(&self, schema: &mut Map<String, Value>) {
        schema.insert("type".to_owned(), json!(self.type_name()));
        match self {
            Self::Boolean | Self::Number | Self::String => {}
            Self::Integer { minimum, maximum } => {
                if let Some(minimum) = minimum {
                    schema.insert("minimum".to_owned(), bound_to_json(*minimum));
                }
                if let Some(maximum) = maximum {
                    schema.insert("maximum".to_owned(), bound_to_json(*maximum));
                }
            }
            Self::Array { items } => {
                let items = match items {
                    ArrayItems::Single(item) => item.to_json_schema(),
                    ArrayItems::Tuple(members) => {
                        Value::Array(members.iter().map(Self::to_json_schema).collect())
                    }
                };
                schema.insert("items".to_owned(), items);
            }
            Self::Object {
                additional_properties,
                properties,
            } => {
                if let Some(value) = additional_properties {
                    schema.insert("additionalProperties".to_owned(), value.to_json_schema());
                }
                if !properties.is_empty() {
                    let properties = properties
                        .iter()
                        .map(|(name, property)| (name.clone(), property.to_json_schema()))
                        .collect();
                    schema.insert("properties".to_owned(), Value::Object(properties));
                }
            }
            Self::Titled { title, inner } => {
                inner.write_json_schema(schema);
                schema.insert("title".to_owned(), json!(title));
            }
        }
    }
}

// Bounds beyond the 64-bit JSON number range (2^64) fall back to a double,
// which represents every power of two exactly.
fn bound_to_json(bound: i128) -> Value {
    if let Ok(value) = i64::try_from(bound) {
        return Value::Number(value.into());
    }
    if let Ok(value) = u64::try_from(bound) {
        return Value::Number(value.into());
    }
    Number::from_f64(bound as f64).map_or(Value::Null, Value::Number)
}

impl Serialize for TypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_schema().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_members_only_for_tuples() {
        let pair = TypeDescriptor::structure(vec![TypeDescriptor::String, TypeDescriptor::Boolean]);
        assert_eq!(pair.struct_members().map(<[_]>::len), Some(2));
        assert!(TypeDescriptor::array(TypeDescriptor::String).struct_members().is_none());
    }

    #[test]
    fn json_schema_view_of_dictionary_of_structs() {
        let schema = TypeDescriptor::dictionary(TypeDescriptor::structure(vec![
            TypeDescriptor::integer(-2_147_483_648, 2_147_483_647),
            TypeDescriptor::String,
        ]))
        .to_json_schema();

        assert_eq!(
            schema,
            json!({
                "type": "object",
                "additionalProperties": {
                    "type": "array",
                    "items": [
                        { "type": "integer", "minimum": -2147483648_i64, "maximum": 2147483647 },
                        { "type": "string" }
                    ]
                }
            })
        );
    }

    #[test]
    fn json_schema_view_keeps_uint64_upper_bound() {
        let schema = TypeDescriptor::integer(0, 1 << 64).to_json_schema();
        assert_eq!(schema["maximum"].as_f64(), Some(18_446_744_073_709_551_616.0));
        assert_eq!(schema["minimum"], json!(0));
    }

    #[test]
    fn titled_type_reports_inner_type_name() {
        let titled = TypeDescriptor::titled("Color", TypeDescriptor::String);
        assert_eq!(titled.type_name(), "string");
        assert_eq!(titled.to_json_schema()["title"], json!("Color"));
    }
}

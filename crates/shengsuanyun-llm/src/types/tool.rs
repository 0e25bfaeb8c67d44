//! Tool descriptors accepted from callers

use serde_json::{Map, Value, json};

/// A tool the model may call
///
/// Callers hand tools over either already in the API's function-calling
/// shape or as a loose definition; both are accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolDescriptor {
    /// Already `{ "type": "function", "function": { ... } }`; sent unchanged
    Wire(Value),
    /// Name, description and JSON Schema to wrap into the wire shape
    Definition {
        name: Option<String>,
        description: Option<String>,
        parameters: Value,
    },
}

impl ToolDescriptor {
    /// A function tool with the given parameter schema
    pub fn function(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self::Definition {
            name: Some(name.into()),
            description: Some(description.into()),
            parameters,
        }
    }

    /// Classify an arbitrary JSON tool description
    ///
    /// Top-level `name`/`description`/`parameters` win over their
    /// `function.*` counterparts; `schema` is accepted as a parameters
    /// alias and an empty object is the fallback.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(fields) = value else {
            return Self::Definition {
                name: None,
                description: None,
                parameters: empty_object(),
            };
        };

        if fields.get("type").and_then(Value::as_str) == Some("function") && present(fields.get("function")).is_some() {
            return Self::Wire(Value::Object(fields));
        }

        let nested = fields.get("function").and_then(Value::as_object);
        let text = |key: &str| {
            non_empty_str(fields.get(key)).or_else(|| nested.and_then(|f| non_empty_str(f.get(key))))
        };

        let parameters = present(fields.get("parameters"))
            .or_else(|| present(fields.get("schema")))
            .or_else(|| nested.and_then(|f| present(f.get("parameters"))))
            .cloned()
            .unwrap_or_else(empty_object);

        Self::Definition {
            name: text("name"),
            description: text("description"),
            parameters,
        }
    }

    /// The function-calling shape sent in `tools`
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Wire(value) => value.clone(),
            Self::Definition {
                name,
                description,
                parameters,
            } => {
                let mut function = Map::new();
                if let Some(name) = name {
                    function.insert("name".to_owned(), Value::String(name.clone()));
                }
                if let Some(description) = description {
                    function.insert("description".to_owned(), Value::String(description.clone()));
                }
                function.insert("parameters".to_owned(), parameters.clone());

                json!({ "type": "function", "function": function })
            }
        }
    }
}

impl From<Value> for ToolDescriptor {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Treat `null` the same as a missing key
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

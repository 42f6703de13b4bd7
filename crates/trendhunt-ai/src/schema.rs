use schemars::{schema_for, JsonSchema};
use serde_json::Value;

/// JSON schema describing the object a caller expects back.
///
/// Providers with native structured output forward it as-is; the others
/// embed it in the system prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaHint {
    pub name: String,
    pub schema: Value,
}

impl SchemaHint {
    /// Generates a hint from a response type's `JsonSchema` derive.
    #[must_use]
    pub fn of<T: JsonSchema>() -> Self {
        let mut schema = serde_json::to_value(schema_for!(T)).unwrap_or_default();
        if let Value::Object(map) = &mut schema {
            map.remove("$schema");
            map.remove("title");
        }
        let name: String = T::schema_name()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Self { name, schema }
    }

    /// Compact JSON rendering for prompt embedding.
    #[must_use]
    pub fn render(&self) -> String {
        self.schema.to_string()
    }
}

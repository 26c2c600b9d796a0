//! Tool input contracts (`inputSchema`) and client-facing behaviour hints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as J};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Boolean,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Integer => "integer",
            PropertyType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaProperty {
    pub name: String,
    pub kind: PropertyType,
    pub description: String,
    pub required: bool,
    pub enum_values: Vec<String>,
}

/// Ordered property list plus the ordered set of required names.
///
/// Built by value so schemas read as one expression at registration time:
///
/// ```
/// use mcp_tool_gateway::core::schema::ToolSchema;
///
/// let schema = ToolSchema::new()
///     .add_string("message", "Text to echo back", true)
///     .add_integer("repeat", "How many times", false);
/// assert_eq!(schema.required(), ["message".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSchema {
    properties: Vec<SchemaProperty>,
    required: Vec<String>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_string(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.with_property(name, PropertyType::String, description, required, Vec::new())
    }

    pub fn add_integer(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.with_property(name, PropertyType::Integer, description, required, Vec::new())
    }

    pub fn add_boolean(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.with_property(name, PropertyType::Boolean, description, required, Vec::new())
    }

    /// A `string` property restricted to `values`.
    pub fn add_enum<I, S>(self, name: impl Into<String>, description: impl Into<String>, values: I, required: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.with_property(name, PropertyType::String, description, required, values)
    }

    pub fn properties(&self) -> &[SchemaProperty] {
        &self.properties
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn to_json(&self) -> J {
        let mut props = Map::new();
        for p in &self.properties {
            let mut def = Map::new();
            def.insert("type".into(), J::from(p.kind.as_str()));
            if !p.description.is_empty() {
                def.insert("description".into(), J::from(p.description.clone()));
            }
            if !p.enum_values.is_empty() {
                def.insert("enum".into(), J::from(p.enum_values.clone()));
            }
            props.insert(p.name.clone(), J::Object(def));
        }

        let mut schema = json!({ "type": "object", "properties": props });
        if !self.required.is_empty() {
            schema["required"] = J::from(self.required.clone());
        }
        schema
    }

    // Re-adding a name replaces the earlier definition; `required` never holds duplicates.
    fn with_property(
        mut self,
        name: impl Into<String>,
        kind: PropertyType,
        description: impl Into<String>,
        required: bool,
        enum_values: Vec<String>,
    ) -> Self {
        let prop = SchemaProperty {
            name: name.into(),
            kind,
            description: description.into(),
            required,
            enum_values,
        };

        self.required.retain(|n| n != &prop.name);
        if prop.required {
            self.required.push(prop.name.clone());
        }
        match self.properties.iter_mut().find(|p| p.name == prop.name) {
            Some(slot) => *slot = prop,
            None => self.properties.push(prop),
        }
        self
    }
}

/// Behaviour hints surfaced in `tools/list`. Defaults describe a safe tool:
/// read-only, idempotent, closed-world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub read_only_hint: bool,
    pub destructive_hint: bool,
    pub idempotent_hint: bool,
    pub open_world_hint: bool,
}

impl Default for ToolAnnotations {
    fn default() -> Self {
        Self {
            title: String::new(),
            read_only_hint: true,
            destructive_hint: false,
            idempotent_hint: true,
            open_world_hint: false,
        }
    }
}

impl ToolAnnotations {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    pub fn read_only(mut self, value: bool) -> Self {
        self.read_only_hint = value;
        self
    }

    pub fn destructive(mut self, value: bool) -> Self {
        self.destructive_hint = value;
        self
    }

    pub fn idempotent(mut self, value: bool) -> Self {
        self.idempotent_hint = value;
        self
    }

    pub fn open_world(mut self, value: bool) -> Self {
        self.open_world_hint = value;
        self
    }

    pub fn to_json(&self) -> J {
        serde_json::to_value(self).unwrap_or_else(|_| json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_set_tracks_required_properties_in_order() {
        let s = ToolSchema::new()
            .add_string("b", "", true)
            .add_boolean("flag", "optional", false)
            .add_integer("a", "count", true);
        assert_eq!(s.required(), ["b".to_string(), "a".to_string()]);
        assert_eq!(s.properties().len(), 3);
    }

    #[test]
    fn re_adding_a_property_replaces_it_without_duplicate_required() {
        let s = ToolSchema::new()
            .add_string("name", "first", true)
            .add_string("name", "second", true);
        assert_eq!(s.properties().len(), 1);
        assert_eq!(s.properties()[0].description, "second");
        assert_eq!(s.required(), ["name".to_string()]);

        let s = s.add_integer("name", "now optional", false);
        assert!(s.required().is_empty());
        assert_eq!(s.properties()[0].kind, PropertyType::Integer);
    }

    #[test]
    fn json_shape_matches_discovery_payload() {
        let s = ToolSchema::new()
            .add_string("text", "Input text", true)
            .add_enum("mode", "", ["fast", "slow"], false);
        let v = s.to_json();
        assert_eq!(v["type"], "object");
        assert_eq!(v["properties"]["text"]["type"], "string");
        assert_eq!(v["properties"]["text"]["description"], "Input text");
        assert_eq!(v["properties"]["mode"]["enum"], json!(["fast", "slow"]));
        assert!(v["properties"]["mode"].get("description").is_none());
        assert_eq!(v["required"], json!(["text"]));
    }

    #[test]
    fn empty_schema_has_no_required_key() {
        let v = ToolSchema::new().to_json();
        assert_eq!(v, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn annotations_default_to_safe_hints() {
        let v = ToolAnnotations::default().to_json();
        assert_eq!(
            v,
            json!({
                "readOnlyHint": true,
                "destructiveHint": false,
                "idempotentHint": true,
                "openWorldHint": false
            })
        );
    }

    #[test]
    fn annotations_overrides_apply() {
        let a = ToolAnnotations::titled("Wipe").read_only(false).destructive(true).idempotent(false);
        let v = a.to_json();
        assert_eq!(v["title"], "Wipe");
        assert_eq!(v["readOnlyHint"], false);
        assert_eq!(v["destructiveHint"], true);
        assert_eq!(v["idempotentHint"], false);
        assert_eq!(v["openWorldHint"], false);
    }
}

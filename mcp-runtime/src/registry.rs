use std::collections::HashMap;

use etsy_core::{Credentials, DispatchError};
use reqwest::Method;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::transport::ApiRequest;

/// Read operations only need the API key; writes also need an OAuth token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
        }
    }

    pub fn requires_auth(self) -> bool {
        self == Access::Write
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    StringArray,
    IntegerArray,
    ObjectArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Integer(u64),
    Text(&'static str),
}

/// One accepted argument of an operation, as advertised in `tools/list`.
#[derive(Debug, Clone)]
pub struct InputField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
    /// For array kinds this constrains the items
    pub allowed_values: &'static [&'static str],
    pub default: Option<FieldDefault>,
    /// Overrides the kind's floor of 0 for numeric kinds
    pub minimum: Option<u64>,
    pub maximum: Option<u64>,
}

impl InputField {
    pub fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
            allowed_values: &[],
            default: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed_values = values;
        self
    }

    pub fn default_value(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn minimum(mut self, minimum: u64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: u64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    fn schema(&self) -> Value {
        let enum_values = || json!(self.allowed_values);
        let mut schema = match self.kind {
            FieldKind::String => json!({ "type": "string" }),
            FieldKind::Integer => json!({ "type": "integer", "minimum": 0 }),
            FieldKind::Number => json!({ "type": "number", "minimum": 0 }),
            FieldKind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
            FieldKind::IntegerArray => json!({ "type": "array", "items": { "type": "integer" } }),
            FieldKind::ObjectArray => json!({ "type": "array", "items": { "type": "object" } }),
        };
        schema["description"] = json!(self.description);
        if !self.allowed_values.is_empty() {
            if self.kind == FieldKind::StringArray {
                schema["items"]["enum"] = enum_values();
            } else {
                schema["enum"] = enum_values();
            }
        }
        match self.default {
            Some(FieldDefault::Integer(v)) => schema["default"] = json!(v),
            Some(FieldDefault::Text(v)) => schema["default"] = json!(v),
            None => {}
        }
        if let Some(minimum) = self.minimum {
            schema["minimum"] = json!(minimum);
        }
        if let Some(maximum) = self.maximum {
            schema["maximum"] = json!(maximum);
        }
        schema
    }
}

/// Validates the argument bag into the operation's typed shape and maps it to
/// the one HTTP call the operation stands for.
pub type RequestPlanner =
    fn(&Map<String, Value>, &Credentials) -> Result<ApiRequest, DispatchError>;

#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub access: Access,
    pub method: Method,
    /// Path template relative to the API base, e.g. `/listings/{listing_id}`
    pub path: &'static str,
    pub fields: Vec<InputField>,
    pub planner: RequestPlanner,
}

impl OperationDescriptor {
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(field.name.to_string(), field.schema());
            if field.required {
                required.push(Value::String(field.name.to_string()));
            }
        }
        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false
        });
        if !required.is_empty() {
            schema["required"] = Value::Array(required);
        }
        schema
    }

    pub fn requires_auth(&self) -> bool {
        self.access.requires_auth()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("operation '{0}' is already registered")]
    DuplicateOperation(&'static str),
}

/// Ordered, name-indexed operation table. The only authority on which tool
/// names the dispatcher accepts.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: Vec<OperationDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every Etsy operation this server exposes.
    pub fn etsy() -> Self {
        let mut registry = Self::new();
        for descriptor in crate::tools::etsy_operations() {
            let registered = registry.register(descriptor);
            debug_assert!(registered.is_ok(), "catalog entry rejected: {registered:?}");
        }
        registry
    }

    pub fn register(&mut self, descriptor: OperationDescriptor) -> Result<(), RegistryError> {
        if self.index.contains_key(descriptor.name) {
            return Err(RegistryError::DuplicateOperation(descriptor.name));
        }
        self.index.insert(descriptor.name, self.operations.len());
        self.operations.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.index.get(name).map(|&i| &self.operations[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Catalog as JSON, used by `tools/list` and the `catalog` subcommand.
    pub fn tools_payload(&self) -> Value {
        let tools: Vec<Value> = self
            .iter()
            .map(|op| {
                json!({
                    "name": op.name,
                    "description": op.description,
                    "inputSchema": op.input_schema(),
                })
            })
            .collect();
        json!({ "tools": tools })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Map<String, Value>, _: &Credentials) -> Result<ApiRequest, DispatchError> {
        Ok(ApiRequest::get("/noop"))
    }

    fn descriptor(name: &'static str) -> OperationDescriptor {
        OperationDescriptor {
            name,
            description: "test",
            access: Access::Read,
            method: Method::GET,
            path: "/noop",
            fields: vec![
                InputField::required("id", FieldKind::Integer, "Identifier"),
                InputField::optional("limit", FieldKind::Integer, "Page size")
                    .default_value(FieldDefault::Integer(25))
                    .minimum(1)
                    .maximum(100),
                InputField::optional("order", FieldKind::String, "Direction")
                    .one_of(&["asc", "desc"]),
                InputField::optional("includes", FieldKind::StringArray, "Embeds")
                    .one_of(&["Images"]),
            ],
            planner: noop,
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = OperationRegistry::new();
        registry.register(descriptor("a")).unwrap();
        assert_eq!(
            registry.register(descriptor("a")),
            Err(RegistryError::DuplicateOperation("a"))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_preserves_registration_order() {
        let mut registry = OperationRegistry::new();
        registry.register(descriptor("b")).unwrap();
        registry.register(descriptor("a")).unwrap();
        let names: Vec<_> = registry.iter().map(|op| op.name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(registry.get("a").is_some());
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn etsy_registry_keeps_every_catalog_entry() {
        let registry = OperationRegistry::etsy();
        let catalog = crate::tools::etsy_operations();
        assert_eq!(registry.len(), catalog.len());
        for op in &catalog {
            assert!(registry.get(op.name).is_some(), "{}", op.name);
        }
    }

    #[test]
    fn input_schema_reflects_fields() {
        let schema = descriptor("a").input_schema();
        assert_eq!(schema["required"], json!(["id"]));
        assert_eq!(schema["additionalProperties"], false);
        let props = &schema["properties"];
        assert_eq!(props["limit"]["default"], 25);
        assert_eq!(props["limit"]["minimum"], 1);
        assert_eq!(props["limit"]["maximum"], 100);
        assert_eq!(props["id"]["minimum"], 0);
        assert_eq!(props["order"]["enum"], json!(["asc", "desc"]));
        assert_eq!(props["includes"]["items"]["enum"], json!(["Images"]));
    }
}

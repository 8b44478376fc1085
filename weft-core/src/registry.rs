//! Named component types and functions
//!
//! Manifests refer to component types and function values by name. A
//! [`Registry`] resolves those names. Function values appear in manifest
//! data as a single-key map, `{"$fn": "add"}`.

use crate::library::{self, ops, TerminalKind};
use crate::manifest::ManifestError;
use crate::node::Construct;
use crate::schema::InstanceConfig;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use weft_types::{Callable, Map, Value};

/// Map key marking a function reference
pub const FN_KEY: &str = "$fn";

#[derive(Clone, Default)]
pub struct Registry {
    types: IndexMap<String, Arc<dyn Construct>>,
    functions: IndexMap<String, Callable>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the stock components and functions
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(library::collate()));
        registry.register(Arc::new(library::map()));
        registry.register(Arc::new(library::take()));
        registry.register(Arc::new(TerminalKind));
        for (name, function) in ops::all() {
            registry.register_function(name, function);
        }
        registry
    }

    /// Register a component type under its own type name
    pub fn register(&mut self, kind: Arc<dyn Construct>) {
        let name = kind.type_name().to_string();
        self.register_as(name, kind);
    }

    pub fn register_as(&mut self, name: impl Into<String>, kind: Arc<dyn Construct>) {
        let name = name.into();
        tracing::trace!(kind = %name, "component type registered");
        self.types.insert(name, kind);
    }

    pub fn register_function(&mut self, name: impl Into<String>, function: Callable) {
        self.functions.insert(name.into(), function);
    }

    pub fn kind(&self, name: &str) -> Option<Arc<dyn Construct>> {
        self.types.get(name).cloned()
    }

    pub fn function(&self, name: &str) -> Option<Callable> {
        self.functions.get(name).cloned()
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    /// Replace function references with function values, recursively
    pub fn resolve_value(&self, value: Value) -> Result<Value, ManifestError> {
        match value {
            Value::Map(map) => {
                if map.len() == 1 {
                    if let Some(Value::String(name)) = map.get(FN_KEY) {
                        return self
                            .function(name)
                            .map(Value::Function)
                            .ok_or_else(|| ManifestError::UnknownFunction(name.clone()));
                    }
                }
                map.into_iter()
                    .map(|(key, value)| -> Result<(String, Value), ManifestError> {
                        Ok((key, self.resolve_value(value)?))
                    })
                    .collect::<Result<Map, _>>()
                    .map(Value::Map)
            }
            Value::List(items) => items
                .into_iter()
                .map(|item| self.resolve_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Ok(other),
        }
    }

    pub fn resolve_config(&self, config: &InstanceConfig) -> Result<InstanceConfig, ManifestError> {
        config
            .iter()
            .map(|(key, value)| -> Result<(String, Value), ManifestError> {
                Ok((key.clone(), self.resolve_value(value.clone())?))
            })
            .collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.type_names())
            .field("functions", &self.function_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins() {
        let registry = Registry::with_builtins();

        assert_eq!(registry.type_names(), vec!["collate", "map", "take", "terminal"]);
        assert!(registry.function("add").is_some());
        assert!(registry.kind("widget").is_none());
    }

    #[test]
    fn test_resolve_nested_function_refs() {
        let registry = Registry::with_builtins();
        let value = Value::from(json!({ "ops": [{ "$fn": "add" }, 3], "label": "x" }));

        let resolved = registry.resolve_value(value).unwrap();
        let ops = resolved.get("ops").and_then(Value::as_list).unwrap();
        assert_eq!(ops[0].as_callable().and_then(Callable::name), Some("add"));
        assert_eq!(ops[1], Value::from(3));
        assert_eq!(resolved.get("label"), Some(&Value::from("x")));
    }

    #[test]
    fn test_unknown_function() {
        let registry = Registry::new();
        let err = registry
            .resolve_value(Value::from(json!({ "$fn": "nope" })))
            .unwrap_err();
        assert!(matches!(err, ManifestError::UnknownFunction(name) if name == "nope"));
    }
}

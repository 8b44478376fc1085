//! Config schemas and instance configs
//!
//! A [`ConfigSchema`] declares the options a component type accepts. At
//! construction it is validated against an [`InstanceConfig`], producing the
//! resolved [`ConfigMap`] the instance keeps for its lifetime.

use crate::error::{WireError, WireResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use weft_types::{Map, UnknownKind, Value, ValueKind};

/// Resolved per-instance configuration
pub type ConfigMap = Map;

/// Predicate over a supplied option value
pub type AssertFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Expected runtime type of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Skip the type check
    Any,
    Kind(ValueKind),
}

impl FromStr for Expect {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Expect::Any),
            other => other.parse().map(Expect::Kind),
        }
    }
}

/// One entry of a config schema
#[derive(Clone, Default)]
pub struct ConfigOption {
    pub optional: bool,
    pub default: Option<Value>,
    pub expect: Option<Expect>,
    pub assert: Option<AssertFn>,
    /// `Some(false)` marks the option as settable after construction
    pub constant: Option<bool>,
}

impl ConfigOption {
    /// An option that must be supplied unless it has a default
    pub fn required() -> Self {
        Self::default()
    }

    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Self::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn of_type(mut self, kind: ValueKind) -> Self {
        self.expect = Some(Expect::Kind(kind));
        self
    }

    pub fn any(mut self) -> Self {
        self.expect = Some(Expect::Any);
        self
    }

    pub fn with_assert(mut self, assert: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.assert = Some(Arc::new(assert));
        self
    }

    /// Allow the option to be changed through its setter input
    pub fn reconfigurable(mut self) -> Self {
        self.constant = Some(false);
        self
    }

    pub fn is_required(&self) -> bool {
        !self.optional && self.default.is_none()
    }

    pub fn is_reconfigurable(&self) -> bool {
        self.constant == Some(false)
    }

    /// The kind a supplied value is checked against, if any
    ///
    /// Without an explicit expectation the default's kind is used.
    pub fn expected_kind(&self) -> Option<ValueKind> {
        match self.expect {
            Some(Expect::Kind(kind)) => Some(kind),
            Some(Expect::Any) => None,
            None => self.default.as_ref().map(Value::kind),
        }
    }
}

impl fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOption")
            .field("optional", &self.optional)
            .field("default", &self.default)
            .field("expect", &self.expect)
            .field("assert", &self.assert.is_some())
            .field("constant", &self.constant)
            .finish()
    }
}

/// Ordered set of named config options
#[derive(Debug, Clone, Default)]
pub struct ConfigSchema {
    options: IndexMap<String, ConfigOption>,
}

impl ConfigSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn option(mut self, name: impl Into<String>, option: ConfigOption) -> Self {
        self.insert(name, option);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, option: ConfigOption) {
        self.options.insert(name.into(), option);
    }

    pub fn get(&self, name: &str) -> Option<&ConfigOption> {
        self.options.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigOption)> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Resolve an instance config against this schema
    ///
    /// Options are checked in declaration order and the first failure wins.
    /// Supplied keys the schema does not declare are dropped. Absent options
    /// without a default are left out of the result.
    pub fn validate(&self, instance: &InstanceConfig) -> WireResult<ConfigMap> {
        let mut resolved = ConfigMap::new();

        for (name, option) in &self.options {
            let supplied = instance.get(name);

            let Some(value) = supplied else {
                if option.is_required() {
                    return Err(WireError::MissingConfig(name.clone()));
                }
                if let Some(default) = &option.default {
                    resolved.insert(name.clone(), default.clone());
                }
                continue;
            };

            if let Some(expected) = option.expected_kind() {
                let found = value.kind();
                if found != expected {
                    return Err(WireError::ConfigType {
                        option: name.clone(),
                        expected,
                        found,
                    });
                }
            }

            if let Some(assert) = &option.assert {
                if !assert(value) {
                    return Err(WireError::ConfigAssertion(name.clone()));
                }
            }

            resolved.insert(name.clone(), value.clone());
        }

        Ok(resolved)
    }
}

/// Caller-supplied configuration for one instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceConfig(Map);

impl InstanceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map {
        &self.0
    }

    pub fn into_inner(self) -> Map {
        self.0
    }
}

impl From<Map> for InstanceConfig {
    fn from(map: Map) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for InstanceConfig {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

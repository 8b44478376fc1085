//! Error types for component construction

use std::fmt;
use thiserror::Error;
use weft_types::ValueKind;

/// Which side of a component a port lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Construction-time failure
///
/// Every variant is raised synchronously while an instance is being built;
/// no partially wired instance is ever returned.
#[derive(Debug, Error)]
pub enum WireError {
    /// A required option was not supplied
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// A supplied option has the wrong runtime type
    #[error("Expected {option} to be of type {expected}, got {found}")]
    ConfigType {
        option: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// An option's assert predicate rejected the supplied value
    #[error("Assertion failed for configuration parameter: {0}")]
    ConfigAssertion(String),

    /// A port path names a component that was never declared
    #[error("No such component defined: {0}")]
    UnresolvedComponent(String),

    /// A port path names a port the component does not have
    #[error("Component {component} has no {direction} port named {port}")]
    UnresolvedPort {
        component: String,
        direction: Direction,
        port: String,
    },

    /// A port path is not of the form `owner.port`
    #[error("Invalid port path: {0:?}")]
    InvalidPortPath(String),

    /// A behavior-backed input has no entry in the behavior map
    #[error("Input {0} has no behavior defined")]
    MissingBehavior(String),

    /// A sub-component failed to construct
    #[error("Failed to construct component {name}: {source}")]
    Child {
        name: String,
        #[source]
        source: Box<WireError>,
    },

    /// The post-construction hook failed
    #[error("Construct hook failed: {0}")]
    Hook(String),
}

impl WireError {
    /// Whether this is one of the config validation failures
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            WireError::MissingConfig(_) | WireError::ConfigType { .. } | WireError::ConfigAssertion(_)
        )
    }

    /// The innermost error, looking through sub-component wrappers
    pub fn root_cause(&self) -> &WireError {
        match self {
            WireError::Child { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type using WireError
pub type WireResult<T> = std::result::Result<T, WireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        insta::assert_snapshot!(
            WireError::MissingConfig("seed".into()).to_string(),
            @"Missing required configuration: seed"
        );
        insta::assert_snapshot!(
            WireError::ConfigType {
                option: "op".into(),
                expected: ValueKind::Function,
                found: ValueKind::String,
            }
            .to_string(),
            @"Expected op to be of type function, got string"
        );
        insta::assert_snapshot!(
            WireError::UnresolvedPort {
                component: "sum".into(),
                direction: Direction::Output,
                port: "total".into(),
            }
            .to_string(),
            @"Component sum has no output port named total"
        );
    }

    #[test]
    fn test_root_cause_unwraps_children() {
        let err = WireError::Child {
            name: "outer".into(),
            source: Box::new(WireError::Child {
                name: "inner".into(),
                source: Box::new(WireError::MissingConfig("seed".into())),
            }),
        };

        assert!(matches!(err.root_cause(), WireError::MissingConfig(name) if name == "seed"));
        assert!(err.root_cause().is_config_error());
        assert!(!err.is_config_error());
    }
}

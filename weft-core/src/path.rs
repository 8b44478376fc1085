//! Port paths
//!
//! Connections and path-declared ports name their endpoints as
//! `"<owner>.<port>"`, where owner is either `this` or a sub-component name.

use crate::error::WireError;
use std::fmt;
use std::str::FromStr;

/// Owner name that refers to the enclosing instance
pub const THIS: &str = "this";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PortOwner {
    This,
    Child(String),
}

impl PortOwner {
    pub fn name(&self) -> &str {
        match self {
            PortOwner::This => THIS,
            PortOwner::Child(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortPath {
    pub owner: PortOwner,
    pub port: String,
}

impl PortPath {
    pub fn this(port: impl Into<String>) -> Self {
        Self {
            owner: PortOwner::This,
            port: port.into(),
        }
    }

    pub fn child(component: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            owner: PortOwner::Child(component.into()),
            port: port.into(),
        }
    }

    pub fn is_this(&self) -> bool {
        self.owner == PortOwner::This
    }
}

impl FromStr for PortPath {
    type Err = WireError;

    /// Split on the first `.`; the port part may itself contain dots
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WireError::InvalidPortPath(s.to_string());
        let (owner, port) = s.split_once('.').ok_or_else(invalid)?;
        if owner.is_empty() || port.is_empty() {
            return Err(invalid());
        }

        Ok(if owner == THIS {
            PortPath::this(port)
        } else {
            PortPath::child(owner, port)
        })
    }
}

impl fmt::Display for PortPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner.name(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let path: PortPath = "this.output".parse().unwrap();
        assert_eq!(path, PortPath::this("output"));

        let path: PortPath = "collate.reset".parse().unwrap();
        assert_eq!(path, PortPath::child("collate", "reset"));
    }

    #[test]
    fn test_port_may_contain_dots() {
        let path: PortPath = "screen.props.title".parse().unwrap();
        assert_eq!(path.owner, PortOwner::Child("screen".into()));
        assert_eq!(path.port, "props.title");
        insta::assert_snapshot!(path.to_string(), @"screen.props.title");
    }

    #[test]
    fn test_invalid_paths() {
        for raw in ["output", ".output", "this.", ""] {
            let err = raw.parse::<PortPath>().unwrap_err();
            assert!(matches!(err, WireError::InvalidPortPath(ref path) if path == raw));
        }
    }
}

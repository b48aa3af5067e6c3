//! Namespaced identifiers (`namespace:path`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::foundation::error::LocationError;

/// Namespace used when an identifier omits one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A validated `namespace:path` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocation {
    namespace: String,
    path: String,
}

fn valid_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn valid_path_char(c: char) -> bool {
    valid_namespace_char(c) || c == '/'
}

impl ResourceLocation {
    /// Builds an identifier from its two parts, validating both.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, LocationError> {
        let namespace = namespace.into();
        let path = path.into();
        if !namespace.chars().all(valid_namespace_char) {
            return Err(LocationError::InvalidNamespace(namespace));
        }
        if path.is_empty() {
            return Err(LocationError::EmptyPath);
        }
        if !path.chars().all(valid_path_char) {
            return Err(LocationError::InvalidPath(path));
        }
        let namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE.to_string()
        } else {
            namespace
        };
        Ok(Self { namespace, path })
    }

    /// Parses `namespace:path`, or `path` in the default namespace.
    pub fn parse(s: &str) -> Result<Self, LocationError> {
        match s.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, s),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ResourceLocation {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

//! Generic access to parsed kubelet configuration documents.
//!
//! Both config files (JSON or YAML) and the live `configz` endpoint are decoded into a
//! [`ParsedDocument`], which is then queried with a [`KeyPath`].

use serde_json::Value;
use std::fmt;

/// One step of a [`KeyPath`]: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Key(key) => write!(f, "{}", key),
            KeySegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// An ordered sequence of segments addressing a value inside nested mappings and sequences,
/// for example `authentication.x509.clientCAFile`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPath {
    segments: Vec<KeySegment>,
}

impl KeyPath {
    /// Builds a path made only of mapping keys.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: keys
                .into_iter()
                .map(|key| KeySegment::Key(key.into()))
                .collect(),
        }
    }

    /// Appends a mapping key.
    pub fn key<S: Into<String>>(mut self, key: S) -> Self {
        self.segments.push(KeySegment::Key(key.into()));
        self
    }

    /// Appends a sequence index.
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(KeySegment::Index(index));
        self
    }

    /// Returns a copy of this path nested one level deeper, under `key`.
    pub fn under<S: Into<String>>(&self, key: S) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(KeySegment::Key(key.into()));
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                KeySegment::Key(_) if i > 0 => write!(f, ".{}", segment)?,
                _ => write!(f, "{}", segment)?,
            }
        }
        Ok(())
    }
}

/// The effective value of a setting, as far as one source could tell.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    /// The setting was found.
    Present(Value),
    /// The source answered but the setting is not in it.
    Absent,
    /// The source is configured but could not be read or reached.
    SourceUnavailable(String),
    /// The source answered with content that could not be parsed.
    MalformedSource(String),
}

impl ResolvedValue {
    /// True for `Absent` and for an explicit `null`, which kubelet treats the same way.
    pub fn is_absent_or_null(&self) -> bool {
        matches!(self, ResolvedValue::Absent | ResolvedValue::Present(Value::Null))
    }
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedValue::Present(value) => write!(f, "{}", value),
            ResolvedValue::Absent => write!(f, "absent"),
            ResolvedValue::SourceUnavailable(reason) => write!(f, "unavailable ({})", reason),
            ResolvedValue::MalformedSource(reason) => write!(f, "malformed ({})", reason),
        }
    }
}

/// A decoded configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    root: Value,
}

impl ParsedDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Looks up `path`. Missing keys, out of range indexes and indexing into a scalar all yield
    /// `Absent`.
    pub fn get(&self, path: &KeyPath) -> ResolvedValue {
        let mut current = &self.root;
        for segment in path.segments() {
            let next = match (segment, current) {
                (KeySegment::Key(key), Value::Object(map)) => map.get(key),
                (KeySegment::Index(index), Value::Array(items)) => items.get(*index),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return ResolvedValue::Absent,
            }
        }
        ResolvedValue::Present(current.clone())
    }
}

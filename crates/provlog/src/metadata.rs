//! Sources of the free-form metadata attached to each entry.
//!
//! The ledger signs whatever object a source returns and never looks inside
//! it. Device adapters (cameras, sensor buses) plug in by implementing
//! [`MetadataSource`].

use provlog_core::Metadata;
use serde_json::Value;

/// Something that can describe the context of a capture.
pub trait MetadataSource {
    /// Produce the metadata object for the next entry.
    fn collect(&self) -> Metadata;
}

impl<F> MetadataSource for F
where
    F: Fn() -> Metadata,
{
    fn collect(&self) -> Metadata {
        self()
    }
}

/// A fixed metadata object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticMetadata(Metadata);

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Build from `key=value` pairs.
    ///
    /// Values that parse as JSON keep their type; anything else is stored as
    /// a string. Pairs without `=` become `true` flags.
    pub fn from_pairs<I, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut metadata = Metadata::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (
                    k,
                    serde_json::from_str(v).unwrap_or_else(|_| Value::from(v)),
                ),
                None => (pair, Value::Bool(true)),
            };
            metadata.insert(key.to_string(), value);
        }
        Self(metadata)
    }

    pub fn into_inner(self) -> Metadata {
        self.0
    }
}

impl From<Metadata> for StaticMetadata {
    fn from(metadata: Metadata) -> Self {
        Self(metadata)
    }
}

impl MetadataSource for StaticMetadata {
    fn collect(&self) -> Metadata {
        self.0.clone()
    }
}

/// Named sections, each filled by its own source.
///
/// Collecting yields one object with a key per section, for example
/// `{"camera": {...}, "sensors": {...}}`. Sections that produce an empty
/// object are omitted.
#[derive(Default)]
pub struct CompositeMetadata {
    sections: Vec<(String, Box<dyn MetadataSource + Send + Sync>)>,
}

impl CompositeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named section. A later section with the same name wins.
    pub fn section(
        mut self,
        name: impl Into<String>,
        source: impl MetadataSource + Send + Sync + 'static,
    ) -> Self {
        self.sections.push((name.into(), Box::new(source)));
        self
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl MetadataSource for CompositeMetadata {
    fn collect(&self) -> Metadata {
        let mut merged = Metadata::new();
        for (name, source) in &self.sections {
            let section = source.collect();
            if !section.is_empty() {
                merged.insert(name.clone(), Value::Object(section));
            }
        }
        merged
    }
}

impl std::fmt::Debug for CompositeMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeMetadata")
            .field(
                "sections",
                &self.sections.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish()
    }
}

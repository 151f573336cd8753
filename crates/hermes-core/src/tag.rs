//! Tags: immutable labels placed on the timeline.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::category::Category;
use crate::error::ValidationError;

/// An immutable label identifying the nature of a time event.
///
/// Equality and hashing are structural over the name and the optional
/// category and source. Metadata rides along but never takes part in
/// comparisons, so two tags differing only in metadata are the same tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawTag", into = "RawTag")]
pub struct Tag {
    name: String,
    category: Option<Category>,
    source: Option<String>,
    metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct RawTag {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
}

impl Tag {
    /// Creates an uncategorized tag.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::builder(name).build()
    }

    /// Starts building a tag with metadata.
    pub fn builder(name: impl Into<String>) -> TagBuilder {
        TagBuilder {
            name: name.into(),
            category: None,
            source: None,
            metadata: Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }

    /// Where the tag came from (an importer, a calendar, a person).
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Opaque JSON data attached to the tag.
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// A copy of this tag filed under `category`.
    #[must_use]
    pub fn recategorized(&self, category: Category) -> Self {
        Self {
            category: Some(category),
            ..self.clone()
        }
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.category == other.category && self.source == other.source
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.category.hash(state);
        self.source.hash(state);
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag('{}')", self.name)
    }
}

/// Builder returned by [`Tag::builder`].
#[derive(Debug, Clone)]
pub struct TagBuilder {
    name: String,
    category: Option<Category>,
    source: Option<String>,
    metadata: Map<String, Value>,
}

impl TagBuilder {
    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Replaces the tag's metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets one metadata entry.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Validates and builds the tag.
    pub fn build(self) -> Result<Tag, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyTagName);
        }
        if self.source.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ValidationError::Empty {
                field: "tag source",
            });
        }
        Ok(Tag {
            name: self.name,
            category: self.category,
            source: self.source,
            metadata: self.metadata,
        })
    }
}

impl TryFrom<RawTag> for Tag {
    type Error = ValidationError;

    fn try_from(raw: RawTag) -> Result<Self, Self::Error> {
        let mut builder = Tag::builder(raw.name);
        builder.category = raw.category;
        builder.source = raw.source;
        builder.metadata = raw.metadata;
        builder.build()
    }
}

impl From<Tag> for RawTag {
    fn from(tag: Tag) -> Self {
        Self {
            name: tag.name,
            category: tag.category,
            source: tag.source,
            metadata: tag.metadata,
        }
    }
}

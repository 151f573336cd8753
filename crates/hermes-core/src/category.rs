//! Hierarchical tag categories and the pools that cache them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::account::TimeAccount;
use crate::error::ValidationError;
use crate::tag::Tag;

/// Pattern every category name must match.
pub const CATEGORY_NAME_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9:\- ]*$";

static CATEGORY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CATEGORY_NAME_PATTERN).unwrap());

/// A named category, optionally nested under a parent.
///
/// Categories serialize as their full `/`-separated path (e.g. `"Work/Reviews"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category {
    name: String,
    parent: Option<Arc<Category>>,
}

impl Category {
    /// Creates a top-level category.
    pub fn root(name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::with_parent(name.into(), None)
    }

    /// Creates a subcategory of this one.
    pub fn child(&self, name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::with_parent(name.into(), Some(Arc::new(self.clone())))
    }

    fn with_parent(name: String, parent: Option<Arc<Self>>) -> Result<Self, ValidationError> {
        if !CATEGORY_NAME_RE.is_match(&name) {
            return Err(ValidationError::InvalidCategory {
                name,
                pattern: CATEGORY_NAME_PATTERN,
            });
        }
        Ok(Self { name, parent })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Self> {
        self.parent.as_deref()
    }

    /// This category followed by each of its ancestors, innermost first.
    pub fn lineage(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |cat| cat.parent())
    }

    /// The `/`-separated path from the root down to this category.
    pub fn full_path(&self) -> String {
        let mut names: Vec<&str> = self.lineage().map(Self::name).collect();
        names.reverse();
        names.join("/")
    }

    /// True if `tag` is filed under this category or one of its descendants.
    pub fn contains(&self, tag: &Tag) -> bool {
        tag.category()
            .is_some_and(|cat| cat.lineage().any(|ancestor| ancestor == self))
    }
}

/// Splits a category path into trimmed, non-empty segments.
fn path_segments(path: &str) -> Result<Vec<&str>, ValidationError> {
    let segments: Vec<&str> = path.split('/').map(str::trim).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ValidationError::InvalidCategoryPath {
            path: path.to_string(),
        });
    }
    Ok(segments)
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let mut segments = path_segments(path)?.into_iter();
        // path_segments never returns an empty list: "".split('/') yields one empty segment
        let first = segments.next().unwrap_or_default();
        segments.try_fold(Self::root(first)?, |parent, name| parent.child(name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_path())
    }
}

impl TryFrom<String> for Category {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.full_path()
    }
}

/// A cache of categories keyed by full path.
///
/// Looking a path up reuses the pooled categories for every prefix that is
/// already known, so categories handed out by one pool share their parents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPool {
    categories: BTreeMap<String, Category>,
}

impl CategoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every category (and its ancestors) used by the tags in `account`.
    pub fn from_account(account: &TimeAccount) -> Self {
        let mut pool = Self::new();
        for category in account.iter().filter_map(Tag::category) {
            pool.insert(category);
        }
        pool
    }

    /// Stores `category` along with all of its ancestors.
    pub fn insert(&mut self, category: &Category) {
        for cat in category.lineage() {
            self.categories
                .entry(cat.full_path())
                .or_insert_with(|| cat.clone());
        }
    }

    /// Resolves `path` without modifying the pool.
    ///
    /// Unknown segments are built fresh on top of the deepest pooled prefix.
    pub fn get(&self, path: &str) -> Result<Category, ValidationError> {
        let segments = path_segments(path)?;
        self.resolve(&segments)
    }

    /// Resolves `path`, storing any categories that had to be built.
    pub fn get_or_create(&mut self, path: &str) -> Result<Category, ValidationError> {
        let category = self.get(path)?;
        self.insert(&category);
        Ok(category)
    }

    fn resolve(&self, segments: &[&str]) -> Result<Category, ValidationError> {
        let key = segments.join("/");
        if let Some(category) = self.categories.get(&key) {
            return Ok(category.clone());
        }
        match segments.split_last() {
            Some((name, [])) => Category::root(*name),
            Some((name, parents)) => self.resolve(parents)?.child(*name),
            None => Err(ValidationError::InvalidCategoryPath { path: key }),
        }
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.categories.contains_key(&category.full_path())
    }

    pub fn contains_path(&self, path: &str) -> bool {
        path_segments(path).is_ok_and(|segments| self.categories.contains_key(&segments.join("/")))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Pooled categories in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Category)> {
        self.categories.iter().map(|(path, cat)| (path.as_str(), cat))
    }
}

//! Inheritable annotations attached to every node of the group tree.
//!
//! Each node carries the keys it declared itself plus everything its parent
//! carries, except for keys configured as non-inheritable. A node's metadata
//! is computed once when it is declared and never changes afterwards.

use std::{
    borrow::{Borrow, Cow},
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use crate::{filter::Criterion, id::NodeId, whatever::BoxedWhatever};

/// Symbolic metadata key such as `slow` or `focus`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetaKey(Cow<'static, str>);

impl MetaKey {
    pub const fn from_static(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for MetaKey {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for MetaKey {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl Borrow<str> for MetaKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type KeySet = BTreeSet<MetaKey>;

/// Keys the engine itself interprets.
pub mod keys {
    /// Conditional marker, `if: false` excludes a node from every run.
    pub const IF: &str = "if";
    /// Conditional marker, `unless: true` excludes a node from every run.
    pub const UNLESS: &str = "unless";
    /// Do not run the example, report it as pending.
    pub const SKIP: &str = "skip";
    /// Run the example and expect it to fail.
    pub const PENDING: &str = "pending";
    /// Name of the ordering strategy for a group's children.
    pub const ORDER: &str = "order";
}

/// A metadata value.
///
/// The common scalar shapes get their own variants so they can be written in
/// configuration files and compared without downcasting. Anything else goes
/// into [`MetaValue::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Str(Cow<'static, str>),
    List(Vec<MetaValue>),
    Other(BoxedWhatever),
}

impl MetaValue {
    pub fn other<T>(value: T) -> Self
    where
        T: fmt::Debug + fmt::Display + Clone + Eq + 'static,
    {
        Self::Other(Box::new(value))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetaValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Everything except `false` counts as set.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, MetaValue::Bool(false))
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Int(i) => write!(f, "{i}"),
            MetaValue::Str(s) => write!(f, "{s:?}"),
            MetaValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            MetaValue::Other(other) => write!(f, "{other}"),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for MetaValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for MetaValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&'static str> for MetaValue {
    fn from(value: &'static str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }
}

impl<T: Into<MetaValue>> From<Vec<T>> for MetaValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Source position of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub file: Arc<str>,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<Arc<str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    pub(crate) fn from_caller(caller: &'static std::panic::Location<'static>) -> Self {
        Self::new(caller.file(), caller.line())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// The metadata a declaration spells out itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredMetadata(BTreeMap<MetaKey, MetaValue>);

impl DeclaredMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<MetaKey>, value: impl Into<MetaValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Shorthand for `with(key, true)`.
    pub fn tag(self, key: impl Into<MetaKey>) -> Self {
        self.with(key, true)
    }

    pub fn insert(&mut self, key: impl Into<MetaKey>, value: impl Into<MetaValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetaKey, &MetaValue)> {
        self.0.iter()
    }
}

impl<K: Into<MetaKey>, V: Into<MetaValue>> FromIterator<(K, V)> for DeclaredMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Builds [`DeclaredMetadata`] inline.
///
/// Bare keys are tags and get the value `true`.
///
/// ```
/// use kispec::meta;
///
/// let declared = meta! { slow, kind: "db", retries: 3 };
/// assert_eq!(declared.get("slow"), Some(&true.into()));
/// ```
#[macro_export]
macro_rules! meta {
    (@value) => {
        true
    };
    (@value $value:expr) => {
        $value
    };
    () => {
        $crate::metadata::DeclaredMetadata::new()
    };
    ($($key:ident $(: $value:expr)?),+ $(,)?) => {{
        let mut declared = $crate::metadata::DeclaredMetadata::new();
        $(declared.insert(stringify!($key), $crate::meta!(@value $($value)?));)+
        declared
    }};
}

/// Everything a declaration contributes to its node's metadata.
#[derive(Debug, Clone)]
pub(crate) struct Declaration {
    pub description: Cow<'static, str>,
    pub location: Location,
    pub id: NodeId,
    pub declared: DeclaredMetadata,
}

/// Merged metadata of a node.
#[derive(Debug, Clone)]
pub struct Metadata {
    description: Cow<'static, str>,
    full_description: String,
    location: Location,
    id: NodeId,
    parent: Option<NodeId>,
    values: BTreeMap<MetaKey, MetaValue>,
    declared: KeySet,
}

impl Metadata {
    pub(crate) fn build(
        parent: Option<&Metadata>,
        declaration: Declaration,
        non_inheritable: &KeySet,
    ) -> Self {
        let Declaration {
            description,
            location,
            id,
            declared,
        } = declaration;

        let full_description = match parent {
            Some(parent) => join_description(&parent.full_description, &description),
            None => description.to_string(),
        };
        let declared_keys = declared.0.keys().cloned().collect();
        let values = inherit(parent.map(|p| &p.values), declared, non_inheritable);

        Self {
            description,
            full_description,
            location,
            id,
            parent: parent.map(|p| p.id.clone()),
            values,
            declared: declared_keys,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn full_description(&self) -> &str {
        &self.full_description
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Non-owning back reference to the enclosing group.
    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether `key` was declared on this node rather than inherited.
    pub fn declared_locally(&self, key: &str) -> bool {
        self.declared.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetaKey, &MetaValue)> {
        self.values.iter()
    }

    pub fn matches(&self, criterion: &Criterion) -> bool {
        criterion.matches(self)
    }

    pub fn matches_all<'c>(&self, criteria: impl IntoIterator<Item = &'c Criterion>) -> bool {
        criteria.into_iter().all(|c| c.matches(self))
    }
}

/// Copy the parent's values, drop the non-inheritable ones, overlay `own`.
pub(crate) fn inherit(
    parent: Option<&BTreeMap<MetaKey, MetaValue>>,
    own: DeclaredMetadata,
    non_inheritable: &KeySet,
) -> BTreeMap<MetaKey, MetaValue> {
    let mut values: BTreeMap<MetaKey, MetaValue> = parent
        .into_iter()
        .flatten()
        .filter(|(key, _)| !non_inheritable.contains(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    values.extend(own.0);
    values
}

fn join_description(parent: &str, own: &str) -> String {
    if parent.is_empty() {
        return own.to_string();
    }
    if own.is_empty() {
        return parent.to_string();
    }
    match own.starts_with('#') || own.starts_with('.') || own.starts_with("::") {
        true => format!("{parent}{own}"),
        false => format!("{parent} {own}"),
    }
}

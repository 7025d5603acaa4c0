use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Stable identifier of a node in the group tree.
///
/// Rendered as `<file>[<path-of-indices>]`, for example `tests/math.rs[1:2:1]`:
/// the first top level group declared in `tests/math.rs`, its second child and
/// that child's first child. Indices are 1-based and count groups and examples
/// together in declaration order, so an id survives edits elsewhere in the file
/// as long as earlier siblings stay put.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    file: Arc<str>,
    path: Vec<u32>,
}

impl NodeId {
    pub fn new(file: impl Into<Arc<str>>, path: impl Into<Vec<u32>>) -> Self {
        Self {
            file: file.into(),
            path: path.into(),
        }
    }

    pub(crate) fn top_level(file: Arc<str>, index: u32) -> Self {
        Self {
            file,
            path: vec![index],
        }
    }

    pub(crate) fn child(&self, index: u32) -> Self {
        let mut path = self.path.clone();
        path.push(index);
        Self {
            file: Arc::clone(&self.file),
            path,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn path(&self) -> &[u32] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// The id of the enclosing group, `None` for top level groups.
    pub fn parent(&self) -> Option<NodeId> {
        match self.path.len() {
            0 | 1 => None,
            len => Some(Self {
                file: Arc::clone(&self.file),
                path: self.path[..len - 1].to_vec(),
            }),
        }
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &NodeId) -> bool {
        self.file == other.file && other.path.starts_with(&self.path)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.file)?;
        for (i, index) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}

/// Parses the scoped part between the brackets, `1:2:1`.
pub(crate) fn parse_scoped_path(raw: &str) -> Option<Vec<u32>> {
    raw.split(':')
        .map(|index| index.trim().parse::<u32>().ok().filter(|i| *i > 0))
        .collect()
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidId(s.to_string());
        let open = s.rfind('[').ok_or_else(invalid)?;
        let scoped = s[open..]
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(invalid)?;
        let file = &s[..open];
        if file.is_empty() {
            return Err(invalid());
        }
        let path = parse_scoped_path(scoped).ok_or_else(invalid)?;
        Ok(NodeId::new(file, path))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

use std::{fmt, str::FromStr, sync::Arc};

use crate::{
    error::Error,
    id::{NodeId, parse_scoped_path},
};

/// Directly targets a node, bypassing ordinary inclusion and exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationSelector {
    /// The declaration nearest at or above `line` in `file`.
    Line { file: Arc<str>, line: u32 },
    /// The node with exactly this id.
    Id(NodeId),
}

impl LocationSelector {
    pub fn file(&self) -> &str {
        match self {
            LocationSelector::Line { file, .. } => file,
            LocationSelector::Id(id) => id.file(),
        }
    }
}

impl fmt::Display for LocationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationSelector::Line { file, line } => write!(f, "{file}:{line}"),
            LocationSelector::Id(id) => write!(f, "{id}"),
        }
    }
}

/// One entry of the file list handed to a run.
///
/// Accepted forms:
/// - `tests/stack.rs` runs the whole file
/// - `tests/stack.rs:12:40` targets the declarations at lines 12 and 40
/// - `tests/stack.rs[1:2,1:3]` targets the nodes with those scoped ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub file: Arc<str>,
    pub selectors: Vec<LocationSelector>,
}

impl FileSelection {
    pub fn whole_file(file: impl Into<Arc<str>>) -> Self {
        Self {
            file: file.into(),
            selectors: Vec::new(),
        }
    }

    pub fn is_located(&self) -> bool {
        !self.selectors.is_empty()
    }
}

pub(crate) fn normalize_file(file: &str) -> &str {
    file.strip_prefix("./").unwrap_or(file)
}

impl FromStr for FileSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidLocation(s.to_string());
        let raw = normalize_file(s.trim());
        if raw.is_empty() {
            return Err(invalid());
        }

        if let Some(open) = raw.find('[') {
            let file: Arc<str> = raw[..open].into();
            let scoped = raw[open + 1..].strip_suffix(']').ok_or_else(invalid)?;
            let selectors = scoped
                .split(',')
                .map(|path| {
                    parse_scoped_path(path)
                        .map(|path| LocationSelector::Id(NodeId::new(Arc::clone(&file), path)))
                        .ok_or_else(invalid)
                })
                .collect::<Result<Vec<_>, _>>()?;
            if file.is_empty() {
                return Err(invalid());
            }
            return Ok(Self { file, selectors });
        }

        let mut parts = raw.split(':');
        let file: Arc<str> = parts.next().ok_or_else(invalid)?.into();
        let selectors = parts
            .map(|line| {
                line.parse::<u32>()
                    .map(|line| LocationSelector::Line {
                        file: Arc::clone(&file),
                        line,
                    })
                    .map_err(|_| invalid())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { file, selectors })
    }
}

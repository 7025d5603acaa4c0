//! Run configuration.
//!
//! [`Configuration`] is assembled in code with `with_*` builders and can be
//! seeded from a TOML file:
//!
//! ```toml
//! seed = 1234
//! order = "random"
//! run_all_when_everything_filtered = true
//! fail_fast = 3
//!
//! [include]
//! focus = true
//!
//! [exclude]
//! slow = true
//! ```

use std::{collections::BTreeMap, fs, num::NonZeroUsize, path::Path};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    filter::Criterion,
    metadata::{KeySet, MetaKey, MetaValue, keys},
    ordering::{Order, OrderScope, OrderingRegistry},
};

#[derive(Debug, Clone)]
pub struct Configuration {
    pub(crate) inclusions: Vec<Criterion>,
    pub(crate) exclusions: Vec<Criterion>,
    pub(crate) ordering: OrderingRegistry,
    pub(crate) seed: Option<u64>,
    pub(crate) run_all_when_everything_filtered: bool,
    pub(crate) non_inheritable: KeySet,
    pub(crate) fail_fast: Option<NonZeroUsize>,
    pub(crate) only_failures: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            inclusions: Vec::new(),
            exclusions: vec![
                Criterion::new(keys::IF, false).absolute(),
                Criterion::new(keys::UNLESS, true).absolute(),
            ],
            ordering: OrderingRegistry::default(),
            seed: None,
            run_all_when_everything_filtered: false,
            non_inheritable: [keys::IF, keys::UNLESS].into_iter().map(MetaKey::from).collect(),
            fail_fast: None,
            only_failures: false,
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inclusion(mut self, criterion: Criterion) -> Self {
        self.inclusions.push(criterion);
        self
    }

    pub fn with_exclusion(mut self, criterion: Criterion) -> Self {
        self.exclusions.push(criterion);
        self
    }

    /// Shorthand for including everything tagged with `key`.
    pub fn with_tag(self, key: impl Into<MetaKey>) -> Self {
        self.with_inclusion(Criterion::new(key, true))
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    /// Use `order` at every scope.
    pub fn with_order(mut self, order: Order) -> Self {
        self.ordering.set_all(order);
        self
    }

    pub fn with_scoped_order(mut self, scope: OrderScope, order: Order) -> Self {
        self.ordering.set(scope, order);
        self
    }

    /// Register a strategy groups can select with `order` metadata.
    pub fn with_named_order(mut self, name: impl Into<String>, order: Order) -> Self {
        self.ordering.register(name, order);
        self
    }

    pub fn with_run_all_when_everything_filtered(self, enabled: bool) -> Self {
        Self {
            run_all_when_everything_filtered: enabled,
            ..self
        }
    }

    pub fn with_non_inheritable(mut self, key: impl Into<MetaKey>) -> Self {
        self.non_inheritable.insert(key.into());
        self
    }

    pub fn with_fail_fast(self, failures: NonZeroUsize) -> Self {
        Self {
            fail_fast: Some(failures),
            ..self
        }
    }

    pub fn with_only_failures(self, enabled: bool) -> Self {
        Self {
            only_failures: enabled,
            ..self
        }
    }

    pub fn inclusions(&self) -> &[Criterion] {
        &self.inclusions
    }

    pub fn exclusions(&self) -> &[Criterion] {
        &self.exclusions
    }

    pub fn ordering(&self) -> &OrderingRegistry {
        &self.ordering
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn run_all_when_everything_filtered(&self) -> bool {
        self.run_all_when_everything_filtered
    }

    pub fn non_inheritable(&self) -> &KeySet {
        &self.non_inheritable
    }

    pub fn fail_fast(&self) -> Option<NonZeroUsize> {
        self.fail_fast
    }

    pub fn only_failures(&self) -> bool {
        self.only_failures
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Self::default().merge(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::default().merge(ConfigFile::load(path)?)
    }

    /// Apply the settings present in `file` on top of this configuration.
    pub fn merge(mut self, file: ConfigFile) -> Result<Self> {
        if let Some(order) = file.order {
            let (name, seed) = match order.split_once(':') {
                Some((name, seed)) => {
                    let seed = seed
                        .parse()
                        .map_err(|_| Error::UnknownOrdering(order.clone()))?;
                    (name.to_string(), Some(seed))
                }
                None => (order, None),
            };
            let resolved = self.ordering.resolve(&name)?.clone();
            self.ordering.set_all(resolved);
            self.seed = seed.or(self.seed);
        }
        self.seed = file.seed.or(self.seed);
        if let Some(enabled) = file.run_all_when_everything_filtered {
            self.run_all_when_everything_filtered = enabled;
        }
        if let Some(failures) = file.fail_fast {
            self.fail_fast = NonZeroUsize::new(failures);
        }
        if let Some(enabled) = file.only_failures {
            self.only_failures = enabled;
        }
        if let Some(keys) = file.non_inheritable {
            self.non_inheritable = keys.into_iter().map(MetaKey::from).collect();
        }
        for (key, value) in file.include {
            self.inclusions.push(Criterion::new(key, meta_value(value)));
        }
        for (key, value) in file.exclude {
            self.exclusions.push(Criterion::new(key, meta_value(value)));
        }
        Ok(self)
    }
}

/// The on-disk form of a [`Configuration`]. Absent fields keep their
/// current value when merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub seed: Option<u64>,
    /// `defined`, `random`, `random:<seed>` or a registered name.
    pub order: Option<String>,
    pub run_all_when_everything_filtered: Option<bool>,
    /// `0` turns fail fast off.
    pub fail_fast: Option<usize>,
    pub only_failures: Option<bool>,
    pub non_inheritable: Option<Vec<String>>,
    pub include: BTreeMap<String, toml::Value>,
    pub exclude: BTreeMap<String, toml::Value>,
}

impl ConfigFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }
}

fn meta_value(value: toml::Value) -> MetaValue {
    match value {
        toml::Value::Boolean(b) => MetaValue::Bool(b),
        toml::Value::Integer(i) => MetaValue::Int(i),
        toml::Value::String(s) => MetaValue::from(s),
        toml::Value::Array(items) => MetaValue::List(items.into_iter().map(meta_value).collect()),
        other => MetaValue::from(other.to_string()),
    }
}

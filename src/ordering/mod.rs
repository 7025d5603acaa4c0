//! Ordering of sibling groups and examples.
//!
//! A strategy permutes one set of siblings at a time. Strategies are
//! registered per scope (top level groups, a group's child groups, a group's
//! direct examples) and by name, so a group can pick one for its children
//! through its `order` metadata.

use std::{cmp, collections::HashMap, fmt, rc::Rc};

use crate::{
    error::Error,
    metadata::{Metadata, keys},
};

mod random;
pub use random::random_seed;

pub type CompareFn = Rc<dyn Fn(&Metadata, &Metadata) -> cmp::Ordering>;

#[derive(Clone, Default)]
pub enum Order {
    /// Declaration order.
    #[default]
    Defined,
    /// Seeded shuffle, reproducible from the run seed.
    Random,
    /// Stable sort by a caller supplied total order.
    Custom(CompareFn),
}

impl Order {
    pub fn custom<F>(compare: F) -> Self
    where
        F: Fn(&Metadata, &Metadata) -> cmp::Ordering + 'static,
    {
        Self::Custom(Rc::new(compare))
    }

    /// Permute `items` in place.
    ///
    /// `context` identifies the sibling set, so random ordering gives every
    /// set its own permutation for the same seed.
    pub fn apply<T>(&self, items: &mut [T], metadata: impl Fn(&T) -> &Metadata, seed: u64, context: &str) {
        match self {
            Order::Defined => (),
            Order::Random => random::shuffle(items, seed, context),
            Order::Custom(compare) => items.sort_by(|a, b| compare(metadata(a), metadata(b))),
        }
    }

    pub fn is_random(&self) -> bool {
        matches!(self, Order::Random)
    }
}

impl fmt::Debug for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Defined => write!(f, "Defined"),
            Order::Random => write!(f, "Random"),
            Order::Custom(_) => write!(f, "Custom(...)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderScope {
    /// Top level groups.
    Global,
    /// The child groups of a group.
    Context,
    /// The direct examples of a group.
    Example,
}

#[derive(Debug, Clone)]
pub struct OrderingRegistry {
    global: Order,
    context: Order,
    example: Order,
    named: HashMap<String, Order>,
}

impl Default for OrderingRegistry {
    fn default() -> Self {
        let named = HashMap::from([
            ("defined".to_string(), Order::Defined),
            ("random".to_string(), Order::Random),
        ]);
        Self {
            global: Order::Defined,
            context: Order::Defined,
            example: Order::Defined,
            named,
        }
    }
}

impl OrderingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, scope: OrderScope, order: Order) {
        match scope {
            OrderScope::Global => self.global = order,
            OrderScope::Context => self.context = order,
            OrderScope::Example => self.example = order,
        }
    }

    pub fn set_all(&mut self, order: Order) {
        self.global = order.clone();
        self.context = order.clone();
        self.example = order;
    }

    pub fn get(&self, scope: OrderScope) -> &Order {
        match scope {
            OrderScope::Global => &self.global,
            OrderScope::Context => &self.context,
            OrderScope::Example => &self.example,
        }
    }

    pub fn register(&mut self, name: impl Into<String>, order: Order) {
        self.named.insert(name.into(), order);
    }

    pub fn named(&self, name: &str) -> Option<&Order> {
        self.named.get(name)
    }

    /// Look up a named strategy, failing for unregistered names.
    pub fn resolve(&self, name: &str) -> Result<&Order, Error> {
        self.named(name)
            .ok_or_else(|| Error::UnknownOrdering(name.to_string()))
    }

    /// The strategy for the children of `group` in `scope`.
    ///
    /// An `order` metadata value naming a registered strategy takes
    /// precedence over the scope's strategy.
    pub(crate) fn for_children(&self, group: &Metadata, scope: OrderScope) -> &Order {
        let Some(name) = group.get(keys::ORDER).and_then(|v| v.as_str()) else {
            return self.get(scope);
        };
        match self.named(name) {
            Some(order) => order,
            None => {
                tracing::warn!(group = %group.id(), order = name, "unknown ordering strategy, using the default");
                self.get(scope)
            }
        }
    }
}

//! The declared group tree.
//!
//! Groups own their children exclusively. Children refer back to their group
//! only through the parent id stored in their [`Metadata`].

use std::fmt::{self, Debug};

use crate::{
    context::ExampleContext,
    fault::StepResult,
    hooks::HookRegistry,
    id::NodeId,
    metadata::Metadata,
};

#[derive(Debug)]
pub enum Node {
    Group(ExampleGroup),
    Example(Example),
}

impl Node {
    pub fn metadata(&self) -> &Metadata {
        match self {
            Node::Group(group) => &group.metadata,
            Node::Example(example) => &example.metadata,
        }
    }

    pub fn id(&self) -> &NodeId {
        self.metadata().id()
    }

    pub fn as_group(&self) -> Option<&ExampleGroup> {
        match self {
            Node::Group(group) => Some(group),
            Node::Example(_) => None,
        }
    }

    pub fn as_example(&self) -> Option<&Example> {
        match self {
            Node::Example(example) => Some(example),
            Node::Group(_) => None,
        }
    }
}

/// A named node bundling examples, nested groups and hooks.
#[derive(Debug)]
pub struct ExampleGroup {
    pub(crate) metadata: Metadata,
    pub(crate) hooks: HookRegistry,
    pub(crate) children: Vec<Node>,
}

impl ExampleGroup {
    pub(crate) fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            hooks: HookRegistry::new(),
            children: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn id(&self) -> &NodeId {
        self.metadata.id()
    }

    pub fn description(&self) -> &str {
        self.metadata.description()
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Groups and examples, interleaved in declaration order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct child groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = &ExampleGroup> {
        self.children.iter().filter_map(Node::as_group)
    }

    /// Direct child examples in declaration order.
    pub fn examples(&self) -> impl Iterator<Item = &Example> {
        self.children.iter().filter_map(Node::as_example)
    }

    /// Every example below this group, depth first in declaration order.
    pub fn descendant_examples(&self) -> Vec<&Example> {
        let mut found = Vec::new();
        self.collect_examples(&mut found);
        found
    }

    fn collect_examples<'g>(&'g self, found: &mut Vec<&'g Example>) {
        for child in &self.children {
            match child {
                Node::Group(group) => group.collect_examples(found),
                Node::Example(example) => found.push(example),
            }
        }
    }

    /// Visit this group and every node below it, parents before children.
    pub fn walk<'g>(&'g self, visit: &mut impl FnMut(&'g Metadata)) {
        visit(&self.metadata);
        for child in &self.children {
            match child {
                Node::Group(group) => group.walk(visit),
                Node::Example(example) => visit(&example.metadata),
            }
        }
    }

    /// Look up a node strictly below this group by id.
    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        if !self.id().contains(id) || self.id() == id {
            return None;
        }
        let mut children = &self.children;
        for &index in &id.path()[self.id().depth()..] {
            let node = children.get(index.checked_sub(1)? as usize)?;
            if node.id() == id {
                return Some(node);
            }
            children = &node.as_group()?.children;
        }
        None
    }
}

/// A single test case.
#[derive(Debug)]
pub struct Example {
    pub(crate) metadata: Metadata,
    pub(crate) body: Option<ExampleFn>,
}

impl Example {
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn id(&self) -> &NodeId {
        self.metadata.id()
    }

    pub fn description(&self) -> &str {
        self.metadata.description()
    }

    pub fn full_description(&self) -> &str {
        self.metadata.full_description()
    }

    /// Examples declared without a body are reported as not yet implemented.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// The deferred body of an example.
#[non_exhaustive]
pub enum ExampleFn {
    Ptr(fn(&mut ExampleContext) -> StepResult),
    Owned(Box<dyn ExampleBody>),
}

impl Debug for ExampleFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ptr(ptr) => f.debug_tuple("Ptr").field(ptr).finish(),
            Self::Owned(_) => write!(f, "Owned(...)"),
        }
    }
}

impl ExampleFn {
    pub const fn from_const_fn(f: fn(&mut ExampleContext) -> StepResult) -> Self {
        Self::Ptr(f)
    }

    pub fn from_boxed<F, T>(f: F) -> Self
    where
        F: Fn(&mut ExampleContext) -> T + 'static,
        T: Into<StepResult>,
    {
        Self::Owned(Box::new(f))
    }

    pub fn call(&self, ctx: &mut ExampleContext) -> StepResult {
        match self {
            Self::Ptr(f) => f(ctx),
            Self::Owned(f) => f.call_example(ctx),
        }
    }
}

pub trait ExampleBody {
    fn call_example(&self, ctx: &mut ExampleContext) -> StepResult;
}

impl<F, T> ExampleBody for F
where
    F: Fn(&mut ExampleContext) -> T,
    T: Into<StepResult>,
{
    fn call_example(&self, ctx: &mut ExampleContext) -> StepResult {
        (self)(ctx).into()
    }
}

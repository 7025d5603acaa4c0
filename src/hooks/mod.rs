//! Lifecycle hooks.
//!
//! A hook is declared on a group (or on the world, which acts as the
//! outermost scope) and runs either around every example below it (`each`)
//! or once around the group itself (`context`). Hooks are kept in an
//! append-only [`HookRegistry`] per scope; the runner composes them from the
//! outermost scope inwards when it executes an example.
//!
//! Each hook can carry metadata criteria. An `each` hook only applies to
//! examples whose metadata matches all of them, a `context` hook only to
//! groups that do.

use std::fmt;

use crate::{
    context::{ExampleContext, GroupContext},
    fault::StepResult,
    filter::Criterion,
    metadata::{Location, Metadata},
};

mod around;
pub use around::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Before,
    After,
    Around,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookScope {
    /// Around every example below the declaring scope.
    Each,
    /// Once around the declaring group.
    Context,
}

pub type EachHookFn = Box<dyn Fn(&mut ExampleContext) -> StepResult>;
pub type ContextHookFn = Box<dyn Fn(&mut GroupContext) -> StepResult>;
pub type AroundHookFn = Box<dyn Fn(&mut ExampleContext, &mut Procedure<'_>) -> StepResult>;

pub(crate) enum HookCallback {
    Each(EachHookFn),
    Context(ContextHookFn),
    Around(AroundHookFn),
}

pub struct Hook {
    phase: HookPhase,
    criteria: Vec<Criterion>,
    location: Location,
    pub(crate) callback: HookCallback,
}

impl Hook {
    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    pub fn scope(&self) -> HookScope {
        match self.callback {
            HookCallback::Each(_) | HookCallback::Around(_) => HookScope::Each,
            HookCallback::Context(_) => HookScope::Context,
        }
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn is_filtered(&self) -> bool {
        !self.criteria.is_empty()
    }

    /// Whether this hook applies to a node with the given metadata.
    pub fn applies_to(&self, metadata: &Metadata) -> bool {
        metadata.matches_all(&self.criteria)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("phase", &self.phase)
            .field("scope", &self.scope())
            .field("criteria", &self.criteria)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Hooks declared directly on one scope, in declaration order.
#[derive(Debug, Default)]
pub struct HookRegistry {
    hooks: Vec<Hook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hook> {
        self.hooks.iter()
    }

    pub(crate) fn add_each<F, T>(
        &mut self,
        phase: HookPhase,
        criteria: Vec<Criterion>,
        location: Location,
        f: F,
    ) where
        F: Fn(&mut ExampleContext) -> T + 'static,
        T: Into<StepResult>,
    {
        debug_assert!(phase != HookPhase::Around);
        self.hooks.push(Hook {
            phase,
            criteria,
            location,
            callback: HookCallback::Each(Box::new(move |ctx| f(ctx).into())),
        });
    }

    pub(crate) fn add_context<F, T>(
        &mut self,
        phase: HookPhase,
        criteria: Vec<Criterion>,
        location: Location,
        f: F,
    ) where
        F: Fn(&mut GroupContext) -> T + 'static,
        T: Into<StepResult>,
    {
        debug_assert!(phase != HookPhase::Around);
        self.hooks.push(Hook {
            phase,
            criteria,
            location,
            callback: HookCallback::Context(Box::new(move |ctx| f(ctx).into())),
        });
    }

    pub(crate) fn add_around<F, T>(&mut self, criteria: Vec<Criterion>, location: Location, f: F)
    where
        F: Fn(&mut ExampleContext, &mut Procedure<'_>) -> T + 'static,
        T: Into<StepResult>,
    {
        self.hooks.push(Hook {
            phase: HookPhase::Around,
            criteria,
            location,
            callback: HookCallback::Around(Box::new(move |ctx, procedure| f(ctx, procedure).into())),
        });
    }

    /// `each` hooks of `phase` that apply to an example, in declaration order.
    pub(crate) fn each_hooks<'r>(
        &'r self,
        phase: HookPhase,
        example: &'r Metadata,
    ) -> impl Iterator<Item = &'r Hook> + 'r {
        self.hooks
            .iter()
            .filter(move |hook| hook.phase == phase && hook.scope() == HookScope::Each)
            .filter(move |hook| hook.applies_to(example))
    }

    /// `context` hooks of `phase`, in declaration order.
    pub(crate) fn context_hooks(&self, phase: HookPhase) -> impl Iterator<Item = &Hook> {
        self.hooks
            .iter()
            .filter(move |hook| hook.phase == phase && hook.scope() == HookScope::Context)
    }
}

/// Declaration methods shared by everything that owns a [`HookRegistry`].
///
/// Implemented by [`GroupBuilder`](crate::declare::GroupBuilder) for hooks on a
/// group and by [`World`](crate::world::World) for configuration level hooks.
pub trait DeclareHooks {
    #[doc(hidden)]
    fn hook_registry(&mut self) -> &mut HookRegistry;

    #[track_caller]
    fn before_each<F, T>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut ExampleContext) -> T + 'static,
        T: Into<StepResult>,
    {
        self.before_each_where(Vec::new(), f)
    }

    #[track_caller]
    fn before_each_where<F, T>(&mut self, criteria: Vec<Criterion>, f: F) -> &mut Self
    where
        F: Fn(&mut ExampleContext) -> T + 'static,
        T: Into<StepResult>,
    {
        let location = Location::from_caller(std::panic::Location::caller());
        self.hook_registry()
            .add_each(HookPhase::Before, criteria, location, f);
        self
    }

    #[track_caller]
    fn after_each<F, T>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut ExampleContext) -> T + 'static,
        T: Into<StepResult>,
    {
        self.after_each_where(Vec::new(), f)
    }

    #[track_caller]
    fn after_each_where<F, T>(&mut self, criteria: Vec<Criterion>, f: F) -> &mut Self
    where
        F: Fn(&mut ExampleContext) -> T + 'static,
        T: Into<StepResult>,
    {
        let location = Location::from_caller(std::panic::Location::caller());
        self.hook_registry()
            .add_each(HookPhase::After, criteria, location, f);
        self
    }

    #[track_caller]
    fn around_each<F, T>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut ExampleContext, &mut Procedure<'_>) -> T + 'static,
        T: Into<StepResult>,
    {
        self.around_each_where(Vec::new(), f)
    }

    #[track_caller]
    fn around_each_where<F, T>(&mut self, criteria: Vec<Criterion>, f: F) -> &mut Self
    where
        F: Fn(&mut ExampleContext, &mut Procedure<'_>) -> T + 'static,
        T: Into<StepResult>,
    {
        let location = Location::from_caller(std::panic::Location::caller());
        self.hook_registry().add_around(criteria, location, f);
        self
    }

    #[track_caller]
    fn before_context<F, T>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut GroupContext) -> T + 'static,
        T: Into<StepResult>,
    {
        self.before_context_where(Vec::new(), f)
    }

    #[track_caller]
    fn before_context_where<F, T>(&mut self, criteria: Vec<Criterion>, f: F) -> &mut Self
    where
        F: Fn(&mut GroupContext) -> T + 'static,
        T: Into<StepResult>,
    {
        let location = Location::from_caller(std::panic::Location::caller());
        self.hook_registry()
            .add_context(HookPhase::Before, criteria, location, f);
        self
    }

    #[track_caller]
    fn after_context<F, T>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut GroupContext) -> T + 'static,
        T: Into<StepResult>,
    {
        self.after_context_where(Vec::new(), f)
    }

    #[track_caller]
    fn after_context_where<F, T>(&mut self, criteria: Vec<Criterion>, f: F) -> &mut Self
    where
        F: Fn(&mut GroupContext) -> T + 'static,
        T: Into<StepResult>,
    {
        let location = Location::from_caller(std::panic::Location::caller());
        self.hook_registry()
            .add_context(HookPhase::After, criteria, location, f);
        self
    }
}

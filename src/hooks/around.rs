use crate::{
    context::ExampleContext,
    fault::{Fault, FaultOrigin},
};

/// Handle an around hook uses to run everything it wraps.
///
/// The hook must call [`call`](Self::call) exactly once. Not calling it leaves
/// the example not run, calling it a second time is a usage error that is
/// recorded as a fault and otherwise ignored.
pub struct Procedure<'p> {
    run: &'p mut dyn FnMut(&mut ExampleContext),
    calls: usize,
}

impl<'p> Procedure<'p> {
    pub(crate) fn new(run: &'p mut dyn FnMut(&mut ExampleContext)) -> Self {
        Self { run, calls: 0 }
    }

    pub fn call(&mut self, ctx: &mut ExampleContext) {
        self.calls += 1;
        if self.calls > 1 {
            ctx.record(
                Fault::usage(format!(
                    "around hook ran the example {} times, expected exactly once",
                    self.calls
                ))
                .with_origin(FaultOrigin::Around),
            );
            return;
        }
        (self.run)(ctx)
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl std::fmt::Debug for Procedure<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Procedure")
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

//! Panic capture while examples run.
//!
//! Bodies and hooks report most faults by panicking (`assert!` and friends).
//! The default panic hook would print every one of those to stderr and the
//! location would be lost once the panic is caught. While a
//! [`PanicCaptureGuard`] is alive on a thread, panics on that thread are kept
//! quiet and their location is stashed for the fault being built.

use std::{
    cell::{Cell, RefCell},
    panic::{self, PanicHookInfo},
    sync::Once,
};

use crate::metadata::Location;

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC_LOCATION: RefCell<Option<Location>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            if !CAPTURING.get() {
                return previous(info);
            }
            let location = info
                .location()
                .map(|location| Location::new(location.file(), location.line()));
            LAST_PANIC_LOCATION.set(location);
        }));
    });
}

/// Keeps panics on the current thread quiet until dropped.
///
/// The process wide hook is installed once and forwards to whatever hook was
/// set before whenever no guard is active on the panicking thread. Guards nest.
#[derive(Debug)]
pub struct PanicCaptureGuard {
    was_capturing: bool,
}

impl PanicCaptureGuard {
    pub fn install() -> Self {
        install_hook();
        let was_capturing = CAPTURING.replace(true);
        Self { was_capturing }
    }
}

impl Drop for PanicCaptureGuard {
    fn drop(&mut self) {
        CAPTURING.set(self.was_capturing);
    }
}

/// Location of the most recent captured panic on this thread, if any.
pub(crate) fn take_panic_location() -> Option<Location> {
    LAST_PANIC_LOCATION.take()
}

//! End to end runs through the public API.

mod declaration;
mod filtering;
mod hooks;
mod ordering;
mod runs;
mod support;

#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Collaborator implementations kept out of the core: a synthetic load-cell
//! signal source for bench runs and tests, and publish sinks that write
//! serialized event records as JSON lines.

pub mod sinks;
pub mod synthetic;

pub use sinks::JsonlSink;
pub use synthetic::{Segment, SyntheticScale};

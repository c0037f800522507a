#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core event-detection pipeline (hardware-agnostic).
//!
//! This crate turns a raw load-cell sample stream into structured scale-event
//! records. All hardware and transport interactions go through
//! `catscale_traits::Scale` and `catscale_traits::PublishSink`.
//!
//! ## Architecture
//!
//! - **Filters**: moving mean/median, single-pole low/high-pass,
//!   discrete differentiator (`filters` module)
//! - **Cascade**: the fixed filter pipeline plus the hold-switch state
//!   machine that brackets events (`cascade` module)
//! - **Aggregation**: start/stable/end notifications materialized into a
//!   `ScaleEvent` record and published (`event`, `aggregator` modules)
//! - **Plumbing**: bounded notification queue, sampling loop, thread
//!   lifecycle (`queue`, `sampler`, `pipeline` modules)

pub mod aggregator;
pub mod cascade;
pub mod error;
pub mod event;
pub mod filters;
pub mod history;
pub mod mocks;
pub mod pipeline;
pub mod queue;
pub mod sampler;
pub mod tare;

pub use aggregator::EventAggregator;
pub use cascade::{CascadeConfig, CascadeStep, FilterCascade};
pub use error::{CoreError, Result};
pub use event::{EventNotification, ScaleEvent, StablePhase};
pub use pipeline::Pipeline;

//! Valuation pipeline
//!
//! One run goes fetch -> merge -> evaluate -> weight -> aggregate ->
//! publish. [`Pipeline::run_once`] executes a single run and returns its
//! snapshot together with a [`RunReport`]; [`run_continuous`] repeats it on
//! an interval until shutdown. [`build`] wires a pipeline from
//! configuration.

pub mod build;
pub mod pipeline;
pub mod report;
pub mod scheduler;

pub use build::{
    adapter_registry, aggregator, build_pipeline, sink_settings, strategy_registry,
    weighting_policy,
};
pub use pipeline::{Pipeline, RunOutcome};
pub use report::RunReport;
pub use scheduler::{run_continuous, SchedulerStats};

//! Valuation strategies
//!
//! A [`Strategy`] maps merged fundamentals to a fair value per ticker. It
//! is evaluated in batches: local strategies compute each ticker in-process
//! ([`LocalStrategy`]), while a [`RemoteStrategy`] sends the whole batch to
//! a scoring service in one request.
//!
//! The [`Evaluator`] checks required fields, runs every requested strategy
//! concurrently and turns failures into issues so that one strategy never
//! affects another.

pub mod error;
pub mod evaluator;
pub mod local;
pub mod registry;
pub mod remote;
pub mod strategy;

pub use error::{Result, StrategyError};
pub use evaluator::{EvaluationOutcome, Evaluator, StrategyOutcome};
pub use local::{GrahamNumber, Hyperparams, PeterLynch, PriceToSalesReversion};
pub use registry::StrategyRegistry;
pub use remote::{HttpScoringClient, MockScoringClient, RemoteStrategy, ScoringClient};
pub use strategy::{Computation, LocalStrategy, Strategy};

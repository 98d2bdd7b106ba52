//! Strategies evaluated by a remote scoring service

mod client;
mod proxy;

pub use client::{HttpScoringClient, MockScoringClient, ScoringClient};
pub use proxy::RemoteStrategy;

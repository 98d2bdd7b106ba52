//! Recoverable issues collected during a run
//!
//! An issue is scoped to one adapter, strategy, ticker or sink. The run
//! always continues past it; issues are aggregated into the run report and
//! published alongside the results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Ticker;

/// A non-fatal problem observed while producing a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    /// One adapter failed or timed out; its data is excluded from the merge
    AdapterFetch { adapter: String, reason: String },

    /// No adapter supplied any data for the ticker
    IncompleteTicker { ticker: Ticker },

    /// A strategy declined a ticker (missing input or compute refusal)
    StrategyInput {
        strategy: String,
        ticker: Ticker,
        reason: String,
    },

    /// A strategy's whole batch failed (transport, status, timeout)
    StrategyService { strategy: String, reason: String },

    /// The ticker had merged data but every strategy declined it
    NoParticipatingStrategy { ticker: Ticker },

    /// One output sink failed to publish
    SinkPublish { sink: String, reason: String },
}

/// Discriminant of [`Issue`], used for grouping in reports and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    AdapterFetch,
    IncompleteTicker,
    StrategyInput,
    StrategyService,
    NoParticipatingStrategy,
    SinkPublish,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::AdapterFetch => "adapter_fetch",
            IssueKind::IncompleteTicker => "incomplete_ticker",
            IssueKind::StrategyInput => "strategy_input",
            IssueKind::StrategyService => "strategy_service",
            IssueKind::NoParticipatingStrategy => "no_participating_strategy",
            IssueKind::SinkPublish => "sink_publish",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Issue {
    pub fn adapter_fetch(adapter: impl Into<String>, reason: impl fmt::Display) -> Self {
        Issue::AdapterFetch {
            adapter: adapter.into(),
            reason: reason.to_string(),
        }
    }

    pub fn strategy_input(
        strategy: impl Into<String>,
        ticker: Ticker,
        reason: impl Into<String>,
    ) -> Self {
        Issue::StrategyInput {
            strategy: strategy.into(),
            ticker,
            reason: reason.into(),
        }
    }

    pub fn strategy_service(strategy: impl Into<String>, reason: impl fmt::Display) -> Self {
        Issue::StrategyService {
            strategy: strategy.into(),
            reason: reason.to_string(),
        }
    }

    pub fn sink_publish(sink: impl Into<String>, reason: impl fmt::Display) -> Self {
        Issue::SinkPublish {
            sink: sink.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> IssueKind {
        match self {
            Issue::AdapterFetch { .. } => IssueKind::AdapterFetch,
            Issue::IncompleteTicker { .. } => IssueKind::IncompleteTicker,
            Issue::StrategyInput { .. } => IssueKind::StrategyInput,
            Issue::StrategyService { .. } => IssueKind::StrategyService,
            Issue::NoParticipatingStrategy { .. } => IssueKind::NoParticipatingStrategy,
            Issue::SinkPublish { .. } => IssueKind::SinkPublish,
        }
    }

    /// Ticker the issue is scoped to, if any
    pub fn ticker(&self) -> Option<&Ticker> {
        match self {
            Issue::IncompleteTicker { ticker }
            | Issue::NoParticipatingStrategy { ticker }
            | Issue::StrategyInput { ticker, .. } => Some(ticker),
            _ => None,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::AdapterFetch { adapter, reason } => {
                write!(f, "adapter '{}' failed: {}", adapter, reason)
            }
            Issue::IncompleteTicker { ticker } => {
                write!(f, "{}: no adapter supplied any data", ticker)
            }
            Issue::StrategyInput {
                strategy,
                ticker,
                reason,
            } => write!(f, "{}: strategy '{}' declined: {}", ticker, strategy, reason),
            Issue::StrategyService { strategy, reason } => {
                write!(f, "strategy '{}' batch failed: {}", strategy, reason)
            }
            Issue::NoParticipatingStrategy { ticker } => {
                write!(f, "{}: every strategy declined", ticker)
            }
            Issue::SinkPublish { sink, reason } => {
                write!(f, "sink '{}' failed: {}", sink, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_kind_and_ticker() {
        let t = Ticker::new("ACME").unwrap();
        let issue = Issue::strategy_input("peter_lynch", t.clone(), "missing eps_ttm");
        assert_eq!(issue.kind(), IssueKind::StrategyInput);
        assert_eq!(issue.ticker(), Some(&t));

        let issue = Issue::sink_publish("json", "disk full");
        assert_eq!(issue.kind(), IssueKind::SinkPublish);
        assert!(issue.ticker().is_none());
    }

    #[test]
    fn test_issue_serializes_with_kind_tag() {
        let issue = Issue::strategy_service("peter_lynch", "status 500");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "strategy_service");
        assert_eq!(json["strategy"], "peter_lynch");

        let back: Issue = serde_json::from_value(json).unwrap();
        assert_eq!(back, issue);
    }

    #[test]
    fn test_issue_display() {
        let issue = Issue::NoParticipatingStrategy {
            ticker: Ticker::new("x").unwrap(),
        };
        assert_eq!(issue.to_string(), "X: every strategy declined");
        assert_eq!(IssueKind::AdapterFetch.to_string(), "adapter_fetch");
    }
}

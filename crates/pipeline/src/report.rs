//! Per-run summary

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

use common::{Issue, IssueKind};

/// What one run produced and everything that went wrong along the way
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub tickers_requested: usize,
    pub tickers_merged: usize,
    pub records: usize,
    pub undervalued: usize,
    /// Sinks that published successfully
    pub sinks_ok: Vec<String>,
    pub issues: Vec<Issue>,
}

impl RunReport {
    pub fn by_kind(&self) -> BTreeMap<IssueKind, Vec<&Issue>> {
        let mut groups: BTreeMap<IssueKind, Vec<&Issue>> = BTreeMap::new();
        for issue in &self.issues {
            groups.entry(issue.kind()).or_default().push(issue);
        }
        groups
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind() == kind).count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn log(&self) {
        info!(
            run_id = %self.run_id,
            tickers = self.tickers_requested,
            merged = self.tickers_merged,
            records = self.records,
            undervalued = self.undervalued,
            issues = self.issues.len(),
            elapsed_ms = self.duration.as_millis() as u64,
            "Run completed"
        );
        for (kind, issues) in self.by_kind() {
            let details: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
            warn!(
                run_id = %self.run_id,
                kind = %kind,
                count = issues.len(),
                "{}",
                details.join("; ")
            );
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run {}: {} of {} tickers valued, {} undervalued, {} issue(s) in {:.2}s",
            self.run_id,
            self.records,
            self.tickers_requested,
            self.undervalued,
            self.issues.len(),
            self.duration.as_secs_f64()
        )?;
        for (kind, issues) in self.by_kind() {
            writeln!(f, "  {} ({})", kind, issues.len())?;
            for issue in issues {
                writeln!(f, "    - {}", issue)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Ticker;

    fn report(issues: Vec<Issue>) -> RunReport {
        RunReport {
            run_id: "r1".into(),
            started_at: Utc::now(),
            duration: Duration::from_millis(1500),
            tickers_requested: 3,
            tickers_merged: 2,
            records: 2,
            undervalued: 1,
            sinks_ok: vec!["console".into()],
            issues,
        }
    }

    #[test]
    fn test_groups_issues_by_kind() {
        let r = report(vec![
            Issue::adapter_fetch("vendorB", "timed out"),
            Issue::IncompleteTicker {
                ticker: Ticker::new("ZZZ").unwrap(),
            },
            Issue::adapter_fetch("vendorC", "refused"),
        ]);

        let groups = r.by_kind();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&IssueKind::AdapterFetch].len(), 2);
        assert_eq!(r.count(IssueKind::IncompleteTicker), 1);
        assert!(!r.is_clean());
    }

    #[test]
    fn test_display_summary() {
        let text = report(vec![Issue::sink_publish("json", "disk full")]).to_string();
        assert!(text.starts_with("run r1: 2 of 3 tickers valued, 1 undervalued, 1 issue(s) in 1.50s"));
        assert!(text.contains("  sink_publish (1)"));
        assert!(text.contains("disk full"));
    }
}

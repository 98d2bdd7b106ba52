//! Tabular console output

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

use common::IssueKind;

use crate::error::{Result, SinkError};
use crate::sink::Sink;
use crate::snapshot::Snapshot;

const RULE_WIDTH: usize = 88;
const TOP_UNDERVALUED: usize = 5;

pub struct ConsoleSink {
    limit: usize,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl ConsoleSink {
    /// Print to stdout, at most `limit` rows
    pub fn new(limit: usize) -> Self {
        Self::with_writer(limit, Box::new(std::io::stdout()))
    }

    pub fn with_writer(limit: usize, writer: Box<dyn Write + Send>) -> Self {
        Self {
            limit,
            writer: Arc::new(Mutex::new(writer)),
        }
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn publish(&self, snapshot: &Snapshot) -> Result<()> {
        let table = render_table(snapshot, self.limit);
        let writer = Arc::clone(&self.writer);

        // Terminal writes block; keep them off the async workers
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut writer = writer.lock();
            writer.write_all(table.as_bytes())?;
            writer.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| SinkError::Other(format!("console writer task failed: {}", e)))?
    }
}

/// Render the snapshot as a ticker-sorted table
pub fn render_table(snapshot: &Snapshot, limit: usize) -> String {
    let mut out = String::new();
    let rule = "-".repeat(RULE_WIDTH);

    let _ = writeln!(out, "==== fairval results (run {}) ====", snapshot.run_id);
    let _ = writeln!(
        out,
        "Generated: {}  aggregation: {}  min_mos: {:.1}%",
        snapshot.generated_at.to_rfc3339(),
        snapshot.aggregation,
        snapshot.min_mos * 100.0
    );

    if snapshot.records.is_empty() {
        let _ = writeln!(out, "no results");
    } else {
        let mut rows: Vec<_> = snapshot.records.iter().collect();
        rows.sort_by(|a, b| a.ticker.cmp(&b.ticker));

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "{:<8} {:>12} {:>14} {:>10} {:>12} {:>12} {:>10}  {}",
            "Ticker", "Price", "Fair Value", "MoS%", "P25", "P75", "Strategies", "Flag"
        );
        let _ = writeln!(out, "{}", rule);
        for rec in rows.iter().take(limit) {
            let _ = writeln!(
                out,
                "{:<8} {:>12} {:>14.2} {:>10} {:>12.2} {:>12.2} {:>10}  {}",
                rec.ticker,
                rec.price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "-".to_string()),
                rec.fair_value,
                rec.margin_of_safety
                    .map(|m| format!("{:.1}%", m * 100.0))
                    .unwrap_or_else(|| "-".to_string()),
                rec.p25,
                rec.p75,
                rec.contributing_strategies.len(),
                if rec.undervalued { "*" } else { "" }
            );
        }
        let _ = writeln!(out, "{}", rule);
        if rows.len() > limit {
            let _ = writeln!(out, "({} more not shown)", rows.len() - limit);
        }

        let top = snapshot.top_undervalued(TOP_UNDERVALUED);
        if !top.is_empty() {
            let _ = writeln!(out, "Top undervalued:");
            for rec in top {
                let _ = writeln!(
                    out,
                    "  {}: {:.1}%",
                    rec.ticker,
                    rec.margin_of_safety.unwrap_or_default() * 100.0
                );
            }
        }
    }

    if !snapshot.issues.is_empty() {
        let mut by_kind: BTreeMap<IssueKind, usize> = BTreeMap::new();
        for issue in &snapshot.issues {
            *by_kind.entry(issue.kind()).or_default() += 1;
        }
        let summary: Vec<String> = by_kind
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect();
        let _ = writeln!(out, "Issues: {} ({})", snapshot.issues.len(), summary.join(", "));
    }

    out
}

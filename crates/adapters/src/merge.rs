//! Fundamentals merge
//!
//! For each ticker the records are walked in adapter priority order and the
//! first record that defines a usable value for a field wins. Later adapters
//! never overwrite a resolved field. A requested ticker without any usable
//! value is reported as [`Issue::IncompleteTicker`] and left out of the output.

use std::collections::BTreeMap;
use tracing::warn;

use common::{Issue, MergedRecord, Ticker};

use crate::fetch::SourcedRecord;

#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// One record per ticker with data, sorted by ticker
    pub records: Vec<MergedRecord>,
    pub issues: Vec<Issue>,
}

/// Merge fetched records for `tickers`
pub fn merge(tickers: &[Ticker], per_ticker: &BTreeMap<Ticker, Vec<SourcedRecord>>) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    let mut ordered: Vec<&Ticker> = tickers.iter().collect();
    ordered.sort();
    ordered.dedup();

    for ticker in ordered {
        let sourced = match per_ticker.get(ticker) {
            Some(list) if !list.is_empty() => list,
            _ => {
                warn!(ticker = %ticker, "No adapter supplied data, excluding ticker");
                outcome.issues.push(Issue::IncompleteTicker {
                    ticker: ticker.clone(),
                });
                continue;
            }
        };

        let mut merged = MergedRecord::new(ticker.clone());
        for SourcedRecord { adapter, record } in sourced {
            for (name, value) in &record.fields {
                if let Some(value) = value {
                    merged.resolve(name, value, adapter);
                }
            }
        }
        if merged.is_empty() {
            warn!(ticker = %ticker, "Adapters returned only empty values, excluding ticker");
            outcome.issues.push(Issue::IncompleteTicker {
                ticker: ticker.clone(),
            });
            continue;
        }
        outcome.records.push(merged);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{FieldValue, IssueKind, RawRecord};

    fn sourced(adapter: &str, record: RawRecord) -> SourcedRecord {
        SourcedRecord {
            adapter: adapter.to_string(),
            record,
        }
    }

    #[test]
    fn test_first_non_null_wins() {
        let x = Ticker::new("X").unwrap();
        let mut per_ticker = BTreeMap::new();
        per_ticker.insert(
            x.clone(),
            vec![
                sourced("vendor_a", RawRecord::new(x.clone()).with_field("price", 100.0)),
                sourced(
                    "vendor_b",
                    RawRecord::new(x.clone())
                        .with_field("price", 200.0)
                        .with_field("eps_ttm", 2.5),
                ),
            ],
        );

        let outcome = merge(&[x.clone()], &per_ticker);
        assert!(outcome.issues.is_empty());
        let rec = &outcome.records[0];
        assert_eq!(rec.number("price"), Some(100.0));
        assert_eq!(rec.source_of("price"), Some("vendor_a"));
        assert_eq!(rec.number("eps_ttm"), Some(2.5));
        assert_eq!(rec.source_of("eps_ttm"), Some("vendor_b"));
        assert_eq!(rec.len(), 2);
    }

    #[test]
    fn test_swapping_priority_changes_only_the_winner() {
        let x = Ticker::new("X").unwrap();
        let a = sourced("vendor_a", RawRecord::new(x.clone()).with_field("price", 100.0));
        let b = sourced("vendor_b", RawRecord::new(x.clone()).with_field("price", 200.0));

        let mut forward = BTreeMap::new();
        forward.insert(x.clone(), vec![a.clone(), b.clone()]);
        let mut reverse = BTreeMap::new();
        reverse.insert(x.clone(), vec![b, a]);

        assert_eq!(merge(&[x.clone()], &forward).records[0].number("price"), Some(100.0));
        assert_eq!(merge(&[x.clone()], &reverse).records[0].number("price"), Some(200.0));
    }

    #[test]
    fn test_null_and_nan_do_not_block_lower_priority() {
        let x = Ticker::new("X").unwrap();
        let mut per_ticker = BTreeMap::new();
        per_ticker.insert(
            x.clone(),
            vec![
                sourced(
                    "vendor_a",
                    RawRecord::new(x.clone())
                        .with_null("eps_ttm")
                        .with_field("price", f64::NAN),
                ),
                sourced(
                    "vendor_b",
                    RawRecord::new(x.clone())
                        .with_field("eps_ttm", 1.2)
                        .with_field("price", 50.0),
                ),
            ],
        );

        let rec = &merge(&[x.clone()], &per_ticker).records[0];
        assert_eq!(rec.source_of("eps_ttm"), Some("vendor_b"));
        assert_eq!(rec.get("price"), Some(&FieldValue::Number(50.0)));
    }

    #[test]
    fn test_ticker_without_records_is_reported() {
        let x = Ticker::new("X").unwrap();
        let y = Ticker::new("Y").unwrap();
        let mut per_ticker = BTreeMap::new();
        per_ticker.insert(
            y.clone(),
            vec![sourced("mock", RawRecord::new(y.clone()).with_field("price", 1.0))],
        );

        let outcome = merge(&[y.clone(), x.clone()], &per_ticker);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].ticker, y);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind(), IssueKind::IncompleteTicker);
        assert_eq!(outcome.issues[0].ticker(), Some(&x));
    }

    #[test]
    fn test_ticker_with_only_empty_values_is_reported() {
        let x = Ticker::new("X").unwrap();
        let y = Ticker::new("Y").unwrap();
        let mut per_ticker = BTreeMap::new();
        per_ticker.insert(
            x.clone(),
            vec![sourced(
                "vendor_a",
                RawRecord::new(x.clone())
                    .with_null("price")
                    .with_field("eps_ttm", f64::NAN),
            )],
        );
        per_ticker.insert(
            y.clone(),
            vec![sourced("vendor_a", RawRecord::new(y.clone()).with_field("price", 3.0))],
        );

        let outcome = merge(&[x.clone(), y.clone()], &per_ticker);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].ticker, y);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind(), IssueKind::IncompleteTicker);
        assert_eq!(outcome.issues[0].ticker(), Some(&x));
    }

    #[test]
    fn test_output_sorted_by_ticker() {
        let tickers = Ticker::parse_list(["ZZ", "AA", "MM"]).unwrap();
        let per_ticker: BTreeMap<_, _> = tickers
            .iter()
            .map(|t| {
                (
                    t.clone(),
                    vec![sourced("mock", RawRecord::new(t.clone()).with_field("price", 1.0))],
                )
            })
            .collect();

        let order: Vec<_> = merge(&tickers, &per_ticker)
            .records
            .iter()
            .map(|r| r.ticker.to_string())
            .collect();
        assert_eq!(order, vec!["AA", "MM", "ZZ"]);
    }
}

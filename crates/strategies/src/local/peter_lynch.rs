//! Growth-adjusted earnings multiple
//!
//! `fair_value = eps_ttm * clamp(growth% , min_pe, max_pe)`, with a flat
//! `negative_growth_pe` when the growth estimate is not positive.

use std::collections::BTreeSet;

use common::fields;
use common::{MergedRecord, StrategyCategory};

use super::{bounds, param, Hyperparams};
use crate::strategy::{Computation, LocalStrategy};

#[derive(Debug, Clone, PartialEq)]
pub struct PeterLynch {
    pub min_pe: f64,
    pub max_pe: f64,
    pub negative_growth_pe: f64,
    pub confidence: f64,
}

impl PeterLynch {
    pub const NAME: &'static str = "peter_lynch";

    pub fn from_params(params: &Hyperparams) -> Self {
        let defaults = Self::default();
        let (min_pe, max_pe) = bounds(
            params,
            ("min_pe", defaults.min_pe),
            ("max_pe", defaults.max_pe),
        );
        Self {
            min_pe,
            max_pe,
            negative_growth_pe: param(params, "negative_growth_pe", defaults.negative_growth_pe),
            confidence: param(params, "confidence", defaults.confidence),
        }
    }
}

impl Default for PeterLynch {
    fn default() -> Self {
        Self {
            min_pe: 5.0,
            max_pe: 35.0,
            negative_growth_pe: 5.0,
            confidence: 0.6,
        }
    }
}

impl LocalStrategy for PeterLynch {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> StrategyCategory {
        StrategyCategory::GrowthSensitive
    }

    fn required_fields(&self) -> BTreeSet<String> {
        [fields::EPS_TTM, fields::GROWTH_5Y_EST]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn compute(&self, record: &MergedRecord) -> Computation {
        let (Some(eps), Some(growth)) = (
            record.number(fields::EPS_TTM),
            record.number(fields::GROWTH_5Y_EST),
        ) else {
            return Computation::declined("eps_ttm and growth_5y_est must be numeric");
        };
        if eps <= 0.0 {
            return Computation::declined("eps_ttm must be positive");
        }

        let (pe, notes) = if growth <= 0.0 {
            (self.negative_growth_pe, "non-positive growth, floor multiple")
        } else {
            let raw = growth * 100.0;
            let clamped = raw.clamp(self.min_pe, self.max_pe);
            if clamped != raw {
                (clamped, "growth multiple clamped")
            } else {
                (clamped, "")
            }
        };

        Computation::valued(eps * pe, self.confidence)
            .with_notes(notes)
            .with_input(fields::EPS_TTM, eps)
            .with_input(fields::GROWTH_5Y_EST, growth)
            .with_input("pe", pe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{FieldValue, Ticker};

    fn record(eps: f64, growth: f64) -> MergedRecord {
        let mut rec = MergedRecord::new(Ticker::new("X").unwrap());
        rec.resolve(fields::EPS_TTM, &FieldValue::Number(eps), "t");
        rec.resolve(fields::GROWTH_5Y_EST, &FieldValue::Number(growth), "t");
        rec
    }

    fn fair_value(c: Computation) -> Option<f64> {
        match c {
            Computation::Valued { fair_value, .. } => Some(fair_value),
            Computation::Declined(_) => None,
        }
    }

    #[test]
    fn test_growth_multiple() {
        let s = PeterLynch::default();
        let fv = fair_value(s.compute(&record(2.0, 0.12))).unwrap();
        assert!((fv - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_is_clamped() {
        let s = PeterLynch::default();
        assert!((fair_value(s.compute(&record(2.0, 0.80))).unwrap() - 70.0).abs() < 1e-9);
        assert!((fair_value(s.compute(&record(2.0, 0.01))).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_growth_uses_floor() {
        let s = PeterLynch::from_params(&[("negative_growth_pe".to_string(), 4.0)].into());
        assert!((fair_value(s.compute(&record(3.0, -0.05))).unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_pe_bounds_are_swapped() {
        let s = PeterLynch::from_params(
            &[("min_pe".to_string(), 40.0), ("max_pe".to_string(), 10.0)].into(),
        );
        assert_eq!((s.min_pe, s.max_pe), (10.0, 40.0));
        assert!((fair_value(s.compute(&record(2.0, 0.20))).unwrap() - 40.0).abs() < 1e-9);
        assert!((fair_value(s.compute(&record(2.0, 0.90))).unwrap() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_declines_non_positive_eps() {
        let s = PeterLynch::default();
        assert!(matches!(s.compute(&record(-1.0, 0.1)), Computation::Declined(_)));
        assert!(matches!(s.compute(&record(0.0, 0.1)), Computation::Declined(_)));
    }
}

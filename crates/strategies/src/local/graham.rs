//! Graham number: `sqrt(pe_cap * pb_cap * eps * bvps)`

use std::collections::BTreeSet;

use common::fields;
use common::{MergedRecord, StrategyCategory};

use super::{param, Hyperparams};
use crate::strategy::{Computation, LocalStrategy};

#[derive(Debug, Clone, PartialEq)]
pub struct GrahamNumber {
    pub pe_cap: f64,
    pub pb_cap: f64,
    pub confidence: f64,
}

impl GrahamNumber {
    pub const NAME: &'static str = "graham_number";

    pub fn from_params(params: &Hyperparams) -> Self {
        let defaults = Self::default();
        Self {
            pe_cap: param(params, "pe_cap", defaults.pe_cap).clamp(1.0, 40.0),
            pb_cap: param(params, "pb_cap", defaults.pb_cap).clamp(0.2, 10.0),
            confidence: param(params, "confidence", defaults.confidence),
        }
    }
}

impl Default for GrahamNumber {
    fn default() -> Self {
        Self {
            pe_cap: 15.0,
            pb_cap: 1.5,
            confidence: 0.7,
        }
    }
}

impl LocalStrategy for GrahamNumber {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> StrategyCategory {
        StrategyCategory::MultipleReversion
    }

    fn required_fields(&self) -> BTreeSet<String> {
        [fields::EPS_TTM, fields::BOOK_VALUE_PER_SHARE]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn compute(&self, record: &MergedRecord) -> Computation {
        let eps = record.number(fields::EPS_TTM).unwrap_or(0.0);
        let bvps = record.number(fields::BOOK_VALUE_PER_SHARE).unwrap_or(0.0);
        if eps <= 0.0 {
            return Computation::declined("eps_ttm must be positive");
        }
        if bvps <= 0.0 {
            return Computation::declined("book_value_per_share must be positive");
        }

        let fair_value = (self.pe_cap * self.pb_cap * eps * bvps).sqrt();
        Computation::valued(fair_value, self.confidence)
            .with_input(fields::EPS_TTM, eps)
            .with_input(fields::BOOK_VALUE_PER_SHARE, bvps)
    }
}

//! Price-to-sales reversion
//!
//! Values the company at a target P/S multiple applied to sales per share.

use std::collections::BTreeSet;

use common::fields;
use common::{MergedRecord, StrategyCategory};

use super::{bounds, param, Hyperparams};
use crate::strategy::{Computation, LocalStrategy};

#[derive(Debug, Clone, PartialEq)]
pub struct PriceToSalesReversion {
    pub target_ps: f64,
    pub min_ps: f64,
    pub max_ps: f64,
    pub confidence: f64,
}

impl PriceToSalesReversion {
    pub const NAME: &'static str = "psales_rev";

    pub fn from_params(params: &Hyperparams) -> Self {
        let defaults = Self::default();
        let (min_ps, max_ps) = bounds(
            params,
            ("min_ps", defaults.min_ps),
            ("max_ps", defaults.max_ps),
        );
        Self {
            target_ps: param(params, "target_ps", defaults.target_ps),
            min_ps,
            max_ps,
            confidence: param(params, "confidence", defaults.confidence),
        }
    }
}

impl Default for PriceToSalesReversion {
    fn default() -> Self {
        Self {
            target_ps: 3.0,
            min_ps: 0.3,
            max_ps: 8.0,
            confidence: 0.5,
        }
    }
}

impl LocalStrategy for PriceToSalesReversion {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> StrategyCategory {
        StrategyCategory::MultipleReversion
    }

    fn required_fields(&self) -> BTreeSet<String> {
        [fields::REVENUE_TTM, fields::SHARES_OUTSTANDING]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn compute(&self, record: &MergedRecord) -> Computation {
        let (Some(revenue), Some(shares)) = (
            record.number(fields::REVENUE_TTM),
            record.number(fields::SHARES_OUTSTANDING),
        ) else {
            return Computation::declined("revenue_ttm and shares_outstanding must be numeric");
        };
        if shares <= 0.0 {
            return Computation::declined("shares_outstanding must be positive");
        }
        if revenue <= 0.0 {
            return Computation::declined("revenue_ttm must be positive");
        }

        let sales_per_share = revenue / shares;
        let multiple = self.target_ps.clamp(self.min_ps, self.max_ps);
        Computation::valued(sales_per_share * multiple, self.confidence)
            .with_input("sales_per_share", sales_per_share)
            .with_input("ps", multiple)
    }
}

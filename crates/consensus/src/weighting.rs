//! Per-ticker strategy weighting
//!
//! Trust is split between two strategy categories, growth-sensitive and
//! multiple-reversion, by an ordered rule table applied to the ticker's
//! fundamentals. Each rule adjusts a running [`CategorySplit`]:
//!
//! | order | rule | effect |
//! |---|---|---|
//! | 1 | margin band | growth share = low / medium / high band weight |
//! | 2 | growth adjust | growth share x (1 - penalty) or x (1 + boost) |
//! | 3 | earnings override | growth share = override weight, wins over 1-2 |
//!
//! The split starts at the configured default weights, so a ticker with no
//! margin, growth or earnings data keeps the defaults. The category share is
//! divided evenly among that category's participating strategies and the
//! result renormalized over participants only.

use std::collections::BTreeMap;
use tracing::debug;

use common::fields;
use common::{MergedRecord, StrategyCategory, StrategyResult, WeightSet};

/// Thresholds and factors driving the rule table
#[derive(Debug, Clone, PartialEq)]
pub struct WeightingPolicy {
    pub low_margin_threshold: f64,
    pub high_margin_threshold: f64,
    pub negative_growth_penalty: f64,
    /// Growth estimate (decimal) above which the boost applies
    pub high_growth_threshold: f64,
    pub high_growth_boost: f64,
    /// Growth-sensitive share per margin band
    pub low_margin_weight: f64,
    pub medium_margin_weight: f64,
    pub high_margin_weight: f64,
    /// Growth-sensitive share when earnings are negative or absent
    pub earnings_override_weight: f64,
    pub default_growth_weight: f64,
    pub default_reversion_weight: f64,
}

impl Default for WeightingPolicy {
    fn default() -> Self {
        Self {
            low_margin_threshold: 0.05,
            high_margin_threshold: 0.10,
            negative_growth_penalty: 0.3,
            high_growth_threshold: 0.15,
            high_growth_boost: 0.2,
            low_margin_weight: 0.2,
            medium_margin_weight: 0.6,
            high_margin_weight: 0.8,
            earnings_override_weight: 0.1,
            default_growth_weight: 0.5,
            default_reversion_weight: 0.5,
        }
    }
}

/// Fundamentals the rules look at
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightInputs {
    pub net_margin: Option<f64>,
    pub growth: Option<f64>,
    pub eps: Option<f64>,
}

impl WeightInputs {
    /// Read inputs from a merged record, deriving net margin from net
    /// income and revenue when it is not supplied directly
    pub fn from_record(record: &MergedRecord) -> Self {
        let net_margin = record.number(fields::NET_MARGIN).or_else(|| {
            let income = record.number(fields::NET_INCOME_TTM)?;
            let revenue = record.number(fields::REVENUE_TTM)?;
            (revenue > 0.0).then(|| income / revenue)
        });
        Self {
            net_margin,
            growth: record.number(fields::GROWTH_5Y_EST),
            eps: record.number(fields::EPS_TTM),
        }
    }

    fn has_fundamentals(&self) -> bool {
        self.net_margin.is_some() || self.growth.is_some()
    }
}

/// Category shares before distribution to strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategorySplit {
    pub growth_sensitive: f64,
    pub multiple_reversion: f64,
}

impl CategorySplit {
    fn set_growth_share(&mut self, share: f64) {
        self.growth_sensitive = share;
        self.multiple_reversion = 1.0 - share;
    }

    pub fn share(&self, category: StrategyCategory) -> f64 {
        match category {
            StrategyCategory::GrowthSensitive => self.growth_sensitive,
            StrategyCategory::MultipleReversion => self.multiple_reversion,
        }
    }
}

/// One entry of the rule table
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    MarginBand {
        low_threshold: f64,
        high_threshold: f64,
        low_weight: f64,
        medium_weight: f64,
        high_weight: f64,
    },
    GrowthAdjust {
        negative_penalty: f64,
        high_threshold: f64,
        high_boost: f64,
    },
    EarningsOverride {
        weight: f64,
    },
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::MarginBand { .. } => "margin_band",
            Rule::GrowthAdjust { .. } => "growth_adjust",
            Rule::EarningsOverride { .. } => "earnings_override",
        }
    }

    /// Apply the rule; returns true when it changed the split
    pub fn apply(&self, inputs: &WeightInputs, split: &mut CategorySplit) -> bool {
        match *self {
            Rule::MarginBand {
                low_threshold,
                high_threshold,
                low_weight,
                medium_weight,
                high_weight,
            } => {
                let Some(margin) = inputs.net_margin else {
                    return false;
                };
                let share = if margin < low_threshold {
                    low_weight
                } else if margin > high_threshold {
                    high_weight
                } else {
                    medium_weight
                };
                split.set_growth_share(share);
                true
            }
            Rule::GrowthAdjust {
                negative_penalty,
                high_threshold,
                high_boost,
            } => match inputs.growth {
                Some(g) if g < 0.0 => {
                    split.growth_sensitive *= 1.0 - negative_penalty;
                    true
                }
                Some(g) if g > high_threshold => {
                    split.growth_sensitive *= 1.0 + high_boost;
                    true
                }
                _ => false,
            },
            Rule::EarningsOverride { weight } => {
                let poor_earnings = match inputs.eps {
                    Some(eps) => eps <= 0.0,
                    None => inputs.has_fundamentals(),
                };
                if poor_earnings {
                    split.set_growth_share(weight);
                }
                poor_earnings
            }
        }
    }
}

/// Rule table plus the starting split
#[derive(Debug, Clone)]
pub struct WeightingEngine {
    rules: Vec<Rule>,
    defaults: CategorySplit,
}

impl WeightingEngine {
    pub fn new(policy: &WeightingPolicy) -> Self {
        let rules = vec![
            Rule::MarginBand {
                low_threshold: policy.low_margin_threshold,
                high_threshold: policy.high_margin_threshold,
                low_weight: policy.low_margin_weight,
                medium_weight: policy.medium_margin_weight,
                high_weight: policy.high_margin_weight,
            },
            Rule::GrowthAdjust {
                negative_penalty: policy.negative_growth_penalty,
                high_threshold: policy.high_growth_threshold,
                high_boost: policy.high_growth_boost,
            },
            Rule::EarningsOverride {
                weight: policy.earnings_override_weight,
            },
        ];
        Self::with_rules(
            rules,
            CategorySplit {
                growth_sensitive: policy.default_growth_weight,
                multiple_reversion: policy.default_reversion_weight,
            },
        )
    }

    pub fn with_rules(rules: Vec<Rule>, defaults: CategorySplit) -> Self {
        Self { rules, defaults }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run the rule table, returning the split and the rules that fired
    pub fn split(&self, inputs: &WeightInputs) -> (CategorySplit, Vec<&'static str>) {
        let mut split = self.defaults;
        let mut fired = Vec::new();
        for rule in &self.rules {
            if rule.apply(inputs, &mut split) {
                fired.push(rule.name());
            }
        }
        (split, fired)
    }

    /// Weights for the participating `results` of one ticker.
    ///
    /// Declined results and strategies of unknown category get no weight.
    pub fn weights(
        &self,
        record: &MergedRecord,
        results: &[StrategyResult],
        categories: &BTreeMap<String, StrategyCategory>,
    ) -> WeightSet {
        let inputs = WeightInputs::from_record(record);
        let (split, fired) = self.split(&inputs);

        let participants: Vec<(&str, StrategyCategory)> = results
            .iter()
            .filter(|r| r.participating_value().is_some())
            .filter_map(|r| categories.get(&r.strategy).map(|c| (r.strategy.as_str(), *c)))
            .collect();

        let mut per_category: BTreeMap<StrategyCategory, usize> = BTreeMap::new();
        for (_, category) in &participants {
            *per_category.entry(*category).or_default() += 1;
        }

        let raw: BTreeMap<String, f64> = participants
            .iter()
            .map(|(name, category)| {
                let members = per_category.get(category).copied().unwrap_or(1) as f64;
                (name.to_string(), split.share(*category) / members)
            })
            .collect();

        debug!(
            ticker = %record.ticker,
            growth_share = split.growth_sensitive,
            reversion_share = split.multiple_reversion,
            rules = ?fired,
            "Weights computed"
        );
        WeightSet::normalized(raw)
    }
}

impl Default for WeightingEngine {
    fn default() -> Self {
        Self::new(&WeightingPolicy::default())
    }
}

//! Built-in in-process strategies
//!
//! Each strategy reads its tunables from a flat [`Hyperparams`] map; keys
//! that are absent fall back to the documented defaults.

mod graham;
mod peter_lynch;
mod psales;

pub use graham::GrahamNumber;
pub use peter_lynch::PeterLynch;
pub use psales::PriceToSalesReversion;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::strategy::Strategy;

/// Hyperparameter overrides for one strategy
pub type Hyperparams = BTreeMap<String, f64>;

/// Names of the built-in local strategies
pub const BUILTIN: [&str; 3] = [PeterLynch::NAME, PriceToSalesReversion::NAME, GrahamNumber::NAME];

/// Build a built-in strategy by name
pub fn builtin(name: &str, params: &Hyperparams) -> Option<Arc<dyn Strategy>> {
    match name {
        PeterLynch::NAME => Some(Arc::new(PeterLynch::from_params(params))),
        PriceToSalesReversion::NAME => Some(Arc::new(PriceToSalesReversion::from_params(params))),
        GrahamNumber::NAME => Some(Arc::new(GrahamNumber::from_params(params))),
        _ => None,
    }
}

pub(crate) fn param(params: &Hyperparams, key: &str, default: f64) -> f64 {
    params
        .get(key)
        .copied()
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// `(low, high)` bounds read from two keys, swapped if given out of order
pub(crate) fn bounds(
    params: &Hyperparams,
    (low_key, low_default): (&str, f64),
    (high_key, high_default): (&str, f64),
) -> (f64, f64) {
    let low = param(params, low_key, low_default);
    let high = param(params, high_key, high_default);
    if low <= high {
        (low, high)
    } else {
        (high, low)
    }
}

//! Canonical field names shared by adapters, strategies and the weighting engine

pub const PRICE: &str = "price";
pub const EPS_TTM: &str = "eps_ttm";
pub const GROWTH_5Y_EST: &str = "growth_5y_est";
pub const NET_MARGIN: &str = "net_margin";
pub const NET_INCOME_TTM: &str = "net_income_ttm";
pub const REVENUE_TTM: &str = "revenue_ttm";
pub const SHARES_OUTSTANDING: &str = "shares_outstanding";
pub const BOOK_VALUE_PER_SHARE: &str = "book_value_per_share";
pub const SECTOR: &str = "sector";

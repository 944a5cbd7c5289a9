//! Orchestration between the record store and the pure calculators.
//!
//! Every function takes the store as `&dyn FinanceStore` and its as-of
//! instant as an argument; none reads the clock.

pub mod deferred_revenue;
pub mod fixed_assets;

/// One-slot breakdown for checking model constants.
pub mod diagnostic;
/// Monte Carlo probability estimate over independent years.
pub mod estimator;
pub mod kpi;
/// Ascending capacity search.
pub mod search;
pub mod slot;
/// State-of-charge transition rule.
pub mod soc;
pub mod types;
pub mod year;

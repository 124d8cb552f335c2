//! Sufficient statistics and the summary-statistics adapter.

pub mod sufficient;
pub mod summary;

pub use sufficient::SufficientStats;
pub use summary::to_sufficient_statistics;

#![warn(clippy::unwrap_used)]

pub mod embedding;
pub mod engine;
pub mod filter;
pub mod matcher;
pub mod migrator;
pub mod package;
pub mod ranker;
pub mod scorer;
pub mod semantic;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

pub use engine::{DecisionEngine, DecisionOutcome};
pub use filter::{CandidateFilter, EligibilityContext, Ineligibility};
pub use matcher::{RelevancePolicy, TaxonomyMatcher};
pub use migrator::{DeprecationTable, Migration, TaxonomyMigrator};
pub use ranker::Ranker;
pub use scorer::{MatchMode, Scorer};
pub use service::DecisionService;
pub use store::InMemoryCandidateStore;

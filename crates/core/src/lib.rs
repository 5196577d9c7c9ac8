#![warn(clippy::unwrap_used)]

pub mod collaborators;
pub mod config;
pub mod error;
pub mod taxonomy;
pub mod types;
pub mod wire;

pub use config::AppConfig;
pub use error::{DecisionError, DecisionResult};
pub use taxonomy::{IntentStage, TaxonomyError, TaxonomyPath, TaxonomyTarget};

//! Citations: build them from evidence, deduplicate and rank them, and keep
//! recently issued ones available for lookup.

pub mod aggregator;
pub mod cache;
pub mod factory;
pub mod formatting;

pub use aggregator::{aggregate, primary_score, select_primary};
pub use cache::CitationCache;
pub use factory::{citation_id, CitationFactory};

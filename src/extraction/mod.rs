//! Claim extraction: one model call segments a response into typed claims.

pub mod extractor;
pub mod model;
pub mod parse;

pub use extractor::ClaimExtractor;
pub use model::LanguageModel;
pub use parse::{locate_json, parse_claims};

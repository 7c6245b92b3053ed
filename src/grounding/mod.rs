//! Grounding: decide which claims are supported by evidence.
//!
//! `SourcePool` normalizes evidence once per request, `GroundingScorer`
//! combines entity / metric / temporal overlap into a confidence, and
//! `GroundingValidator` turns the best candidate into a `GroundingResult`.

pub mod mentions;
pub mod scorer;
pub mod source_pool;
pub mod validator;

pub use scorer::{GroundingScorer, SourceScore};
pub use source_pool::{PooledSource, SourcePool};
pub use validator::{grounding_score, GroundingValidator};

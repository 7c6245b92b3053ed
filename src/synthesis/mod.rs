//! Response synthesis: place citations in the text and flag weak grounding.

pub mod synthesizer;

pub use synthesizer::{GroundingLevel, ResponseSynthesizer};

//! Shared data structures for the pipeline (no logic beyond identity helpers).

pub mod citation;
pub mod cited_response;
pub mod claim;
pub mod grounding_result;
pub mod source;

pub use citation::{Citation, SourceType};
pub use cited_response::CitedResponse;
pub use claim::{Claim, ClaimType};
pub use grounding_result::GroundingResult;
pub use source::{Calculation, DatabaseRecord, Inference, MemoryEntry, Source};

//! # grounding-citations
//!
//! Verifies model-written answers against the evidence they were generated
//! from: which sentences are supported, by what, and how confidently.
//!
//! ## Modules (9)
//! - `citations`: citation factory, value formatting, aggregation, primary selection, lookup cache
//! - `config`: PipelineConfig and per-stage sections, TOML loading, validation
//! - `errors`: CitationError, RecoveryAction, ErrorChain
//! - `extraction`: LanguageModel trait, claim extraction, strict JSON parsing
//! - `grounding`: source pool, mention scanning, overlap scoring, claim validation
//! - `orchestrator`: memory backends, audit queue, `VerificationOrchestrator::verify`
//! - `storage`: SQLite audit sink (PRAGMAs, schema, migrations, retention)
//! - `synthesis`: inline / footnote citation placement, grounding disclaimers
//! - `types`: Claim, Source, Citation, GroundingResult, CitedResponse

pub mod citations;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod grounding;
pub mod orchestrator;
pub mod storage;
pub mod synthesis;
pub mod types;

pub use config::PipelineConfig;
pub use errors::{CitationError, CitationResult};
pub use extraction::{ClaimExtractor, LanguageModel};
pub use grounding::GroundingValidator;
pub use orchestrator::{AuditSink, MemoryBackend, VerificationOrchestrator};
pub use storage::SqliteAuditSink;
pub use synthesis::ResponseSynthesizer;
pub use types::{
    Calculation, Citation, CitedResponse, Claim, ClaimType, DatabaseRecord, GroundingResult,
    Inference, MemoryEntry, Source, SourceType,
};

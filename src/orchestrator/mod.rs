//! Verification orchestrator: the public entry point of the pipeline.
//!
//! - `memory`: memory-search backends and concurrent evidence gathering
//! - `audit`: audit sink trait and the bounded background queue feeding it
//! - `pipeline`: `VerificationOrchestrator::verify`

pub mod audit;
pub mod memory;
pub mod pipeline;

pub use audit::{AuditQueue, AuditRecord, AuditSink};
pub use memory::{gather_memories, merge_memories, MemoryBackend, MemoryQuery, NoMemory};
pub use pipeline::VerificationOrchestrator;

//! VerificationOrchestrator: extraction, grounding, citation and synthesis
//! wired together under one soft deadline.
//!
//! `verify` never fails. Per-claim and per-backend failures are isolated
//! and recorded in an `ErrorChain`; anything else, including a panicking
//! collaborator, becomes a degraded `CitedResponse` carrying the raw text.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::{json, Value};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::audit::{AuditQueue, AuditRecord, AuditSink};
use super::memory::{gather_memories, MemoryBackend, MemoryQuery, NoMemory};
use crate::citations::{aggregate, select_primary, CitationCache, CitationFactory};
use crate::config::{validate, PipelineConfig};
use crate::errors::{CitationError, CitationResult, ErrorChain, RecoveryAction};
use crate::extraction::{ClaimExtractor, LanguageModel};
use crate::grounding::{grounding_score, GroundingValidator, SourcePool};
use crate::synthesis::ResponseSynthesizer;
use crate::types::{Citation, CitedResponse, Claim, GroundingResult, MemoryEntry, Source};

/// Intermediate state of one `verify` call.
struct Verification {
    claims: Vec<Claim>,
    results: Vec<GroundingResult>,
    memories: Vec<MemoryEntry>,
    deadline_hit: bool,
}

pub struct VerificationOrchestrator<L, G = NoMemory, A = NoMemory> {
    config: PipelineConfig,
    extractor: ClaimExtractor<L>,
    validator: Arc<GroundingValidator>,
    factory: CitationFactory,
    synthesizer: ResponseSynthesizer,
    generic_memory: G,
    asset_memory: A,
    cache: CitationCache,
    audit: Option<AuditQueue>,
}

impl<L: LanguageModel> VerificationOrchestrator<L> {
    /// Build an orchestrator without memory backends or audit sink.
    ///
    /// Fails with `CitationError::Config` when the configuration is invalid.
    pub fn new(config: PipelineConfig, model: L) -> CitationResult<Self> {
        let problems = validate(&config);
        if !problems.is_empty() {
            let summary = problems
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CitationError::Config(summary));
        }

        let factory = CitationFactory::new(config.citations.clone());
        Ok(Self {
            extractor: ClaimExtractor::new(model, config.extraction.clone()),
            validator: Arc::new(GroundingValidator::new(
                config.grounding.clone(),
                factory.clone(),
            )),
            synthesizer: ResponseSynthesizer::from_config(&config.grounding),
            cache: CitationCache::from_config(&config.cache),
            factory,
            generic_memory: NoMemory,
            asset_memory: NoMemory,
            audit: None,
            config,
        })
    }
}

impl<L, G, A> VerificationOrchestrator<L, G, A>
where
    L: LanguageModel,
    G: MemoryBackend,
    A: MemoryBackend,
{
    /// Replace the generic and asset-scoped memory backends.
    pub fn with_memory_backends<G2, A2>(
        self,
        generic: G2,
        asset_scoped: A2,
    ) -> VerificationOrchestrator<L, G2, A2>
    where
        G2: MemoryBackend,
        A2: MemoryBackend,
    {
        VerificationOrchestrator {
            config: self.config,
            extractor: self.extractor,
            validator: self.validator,
            factory: self.factory,
            synthesizer: self.synthesizer,
            generic_memory: generic,
            asset_memory: asset_scoped,
            cache: self.cache,
            audit: self.audit,
        }
    }

    /// Attach an audit sink behind a bounded queue. Must be called within a
    /// Tokio runtime. Ignored when auditing is disabled in the config.
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        if self.config.audit.enabled {
            self.audit = Some(AuditQueue::spawn(sink, self.config.audit.queue_capacity));
        }
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// A citation issued by an earlier `verify` call, while still cached.
    pub fn lookup_citation(&self, id: &str) -> Option<Citation> {
        self.cache.get(id)
    }

    /// Verify a model response against the supplied evidence.
    ///
    /// `memory_sources`: `Some` uses the given entries as-is; `None` searches
    /// the memory backends when memory is enabled.
    pub async fn verify(
        &self,
        raw_response: &str,
        query_text: &str,
        user_id: &str,
        structured_sources: Vec<Source>,
        memory_sources: Option<Vec<MemoryEntry>>,
    ) -> CitedResponse {
        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.run(
            raw_response,
            query_text,
            &structured_sources,
            memory_sources,
            started,
        ))
        .catch_unwind()
        .await;
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(
                    error = %e,
                    action = %RecoveryAction::for_error(&e),
                    "Verification failed, returning degraded response"
                );
                CitedResponse::degraded(raw_response, format!("verification failed: {}", e))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "Verification panicked, returning degraded response");
                CitedResponse::degraded(raw_response, format!("verification panicked: {}", message))
            }
        };

        if let Some(queue) = &self.audit {
            queue.enqueue(AuditRecord::new(response.clone(), user_id, query_text));
        }
        response
    }

    /// Close the audit queue and wait for pending records.
    pub async fn shutdown(&self) {
        if let Some(queue) = &self.audit {
            queue.shutdown().await;
        }
    }

    async fn run(
        &self,
        raw_response: &str,
        query_text: &str,
        structured_sources: &[Source],
        memory_sources: Option<Vec<MemoryEntry>>,
        started: Instant,
    ) -> CitationResult<CitedResponse> {
        check_sources(structured_sources, memory_sources.as_deref())?;
        let deadline = started + Duration::from_millis(self.config.deadline_ms);
        let mut errors = ErrorChain::new();

        let verification = self
            .ground(
                raw_response,
                query_text,
                structured_sources,
                memory_sources,
                deadline,
                &mut errors,
            )
            .await;
        let Verification {
            claims,
            results,
            memories,
            deadline_hit,
        } = verification;

        let score = grounding_score(&claims, &results);
        let ungrounded: Vec<String> = claims
            .iter()
            .zip(&results)
            .filter(|(claim, result)| claim.requires_grounding && !result.is_grounded)
            .map(|(claim, _)| claim.text.clone())
            .collect();
        let grounded_count = claims
            .iter()
            .zip(&results)
            .filter(|(claim, result)| claim.requires_grounding && result.is_grounded)
            .count();

        // Claim-derived citations first so they win confidence ties.
        let mut candidates: Vec<Citation> = results
            .iter()
            .flat_map(|r| r.supporting_citations.iter().cloned())
            .collect();
        candidates.extend(self.factory.from_sources(structured_sources));
        candidates.extend(memories.iter().map(|m| self.factory.from_memory(m)));

        let source_kinds: BTreeSet<&str> = structured_sources
            .iter()
            .map(Source::kind)
            .chain((!memories.is_empty()).then_some("memory"))
            .collect();
        let cap = if source_kinds.len() > 1 {
            self.config.citations.max_citations_multi_source
        } else {
            self.config.citations.max_citations
        };
        let citations = aggregate(&candidates, cap);
        let primary_id = select_primary(&citations).map(|c| c.id.clone());

        let (response_text, used) = self.synthesizer.synthesize(
            raw_response,
            &citations,
            self.config.citations.inline,
            score,
            &ungrounded,
        );

        for chained in errors.iter() {
            debug!(
                stage = chained.stage,
                step = chained.step,
                action = %RecoveryAction::for_error(&chained.error),
                error = %chained.error,
                "Degraded step"
            );
        }

        let duration_ms = started.elapsed().as_secs_f64() * 1_000.0;
        let mut meta: BTreeMap<String, Value> = BTreeMap::new();
        meta.insert("claim_count".into(), json!(claims.len()));
        meta.insert("grounded_count".into(), json!(grounded_count));
        meta.insert("citation_count".into(), json!(citations.len()));
        meta.insert("citations_placed".into(), json!(used.len()));
        meta.insert("source_count".into(), json!(structured_sources.len()));
        meta.insert("memory_count".into(), json!(memories.len()));
        meta.insert("primary_citation_id".into(), json!(primary_id));
        meta.insert("duration_ms".into(), json!(duration_ms));
        meta.insert("deadline_hit".into(), json!(deadline_hit));
        meta.insert("error_count".into(), json!(errors.len()));
        meta.insert(
            "citation_mode".into(),
            json!(if self.config.citations.inline { "inline" } else { "footnote" }),
        );

        self.cache.insert_all(&citations);

        info!(
            claim_count = claims.len(),
            grounded_count,
            citation_count = citations.len(),
            grounding_score = score,
            error_count = errors.len(),
            deadline_hit,
            duration_ms,
            "Response verified"
        );

        Ok(CitedResponse {
            id: uuid::Uuid::new_v4().to_string(),
            response_text,
            citations,
            claims,
            grounding_score: score,
            ungrounded_claims: ungrounded,
            meta,
        })
    }

    /// Gather memory, extract claims and validate them, all within `deadline`.
    async fn ground(
        &self,
        raw_response: &str,
        query_text: &str,
        structured_sources: &[Source],
        memory_sources: Option<Vec<MemoryEntry>>,
        deadline: Instant,
        errors: &mut ErrorChain,
    ) -> Verification {
        let mut deadline_hit = false;

        let memories = match memory_sources {
            Some(entries) => entries,
            None if self.config.memory.enabled => {
                let query = MemoryQuery {
                    text: query_text.to_string(),
                    asset_ids: asset_ids(structured_sources),
                    limit: self.config.memory.limit,
                };
                let budget = Duration::from_millis(self.config.memory.timeout_ms)
                    .min(deadline.saturating_duration_since(Instant::now()));
                gather_memories(
                    &self.generic_memory,
                    &self.asset_memory,
                    &query,
                    budget,
                    errors,
                )
                .await
            }
            None => Vec::new(),
        };

        let claims = match tokio::time::timeout_at(deadline, self.extractor.try_extract(raw_response))
            .await
        {
            Ok(Ok(claims)) => claims,
            Ok(Err(e)) => {
                warn!(error = %e, "Claim extraction failed, continuing without claims");
                errors.push(
                    "extraction",
                    0,
                    CitationError::ExtractionFailed {
                        reason: e.to_string(),
                    },
                );
                Vec::new()
            }
            Err(_) => {
                warn!("Claim extraction missed the deadline, continuing without claims");
                deadline_hit = true;
                errors.push("extraction", 0, self.deadline_error("extraction", deadline));
                Vec::new()
            }
        };

        let pool = Arc::new(SourcePool::build(structured_sources, &memories));
        let mut slots: Vec<Option<GroundingResult>> = vec![None; claims.len()];
        let mut tasks = JoinSet::new();
        for (index, claim) in claims.iter().cloned().enumerate() {
            let validator = Arc::clone(&self.validator);
            let pool = Arc::clone(&pool);
            tasks.spawn(async move { (index, validator.validate_in_pool(&claim, &pool)) });
        }

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(None) => break,
                Ok(Some(Ok((index, Ok(result))))) => slots[index] = Some(result),
                Ok(Some(Ok((index, Err(e))))) => {
                    warn!(claim_index = index, error = %e, "Claim validation failed");
                    slots[index] = Some(GroundingResult::failed(claims[index].text.clone()));
                    errors.push("validation", index, e);
                }
                Ok(Some(Err(e))) => {
                    // Index is lost with the task; the slot is filled below.
                    warn!(error = %e, "Claim validation task aborted");
                }
                Err(_) => {
                    warn!(pending = tasks.len(), "Claim validation missed the deadline");
                    deadline_hit = true;
                    tasks.abort_all();
                    break;
                }
            }
        }

        let results = claims
            .iter()
            .zip(slots)
            .enumerate()
            .map(|(index, (claim, slot))| match slot {
                Some(result) => result,
                None if !claim.requires_grounding => GroundingResult {
                    claim_text: claim.text.clone(),
                    is_grounded: true,
                    confidence: 1.0,
                    supporting_citations: Vec::new(),
                    validation_time_ms: 0.0,
                },
                None => {
                    let error = if deadline_hit {
                        self.deadline_error("validation", deadline)
                    } else {
                        CitationError::ClaimValidationFailed {
                            claim: claim.text.clone(),
                            reason: "validation task aborted".to_string(),
                        }
                    };
                    errors.push("validation", index, error);
                    GroundingResult::failed(claim.text.clone())
                }
            })
            .collect();

        Verification {
            claims,
            results,
            memories,
            deadline_hit,
        }
    }

    fn deadline_error(&self, stage: &str, deadline: Instant) -> CitationError {
        let budget = Duration::from_millis(self.config.deadline_ms);
        let started = deadline.checked_sub(budget).unwrap_or(deadline);
        CitationError::DeadlineExceeded {
            stage: stage.to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Every citation needs an identity key: records need a table and id, memories an id.
fn check_sources(structured: &[Source], memories: Option<&[MemoryEntry]>) -> CitationResult<()> {
    let memory_ids = structured
        .iter()
        .filter_map(|source| match source {
            Source::MemoryEntry(entry) => Some(entry.memory_id.as_str()),
            _ => None,
        })
        .chain(memories.unwrap_or_default().iter().map(|m| m.memory_id.as_str()));
    for id in memory_ids {
        if id.trim().is_empty() {
            return Err(CitationError::InvalidInput(
                "memory entry without memory_id".to_string(),
            ));
        }
    }
    for source in structured {
        if let Source::DatabaseRecord(record) = source {
            if record.table.trim().is_empty() || record.record_id.trim().is_empty() {
                return Err(CitationError::InvalidInput(format!(
                    "database record '{}/{}' lacks a table or record id",
                    record.table, record.record_id
                )));
            }
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Distinct asset identifiers named by the structured sources, in order.
fn asset_ids(sources: &[Source]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    sources
        .iter()
        .filter_map(|source| match source {
            Source::DatabaseRecord(record) => record.asset(),
            _ => None,
        })
        .filter(|asset| seen.insert(asset.clone()))
        .collect()
}

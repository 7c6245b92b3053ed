//! Audit hand-off: a bounded queue drained by one background worker.
//!
//! `enqueue` never waits. When the queue is full or closed the record is
//! dropped with a warning; sink failures are logged by the worker.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::CitationResult;
use crate::types::CitedResponse;

/// One verified response plus its attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub response: CitedResponse,
    pub user_id: String,
    pub query_text: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(response: CitedResponse, user_id: &str, query_text: &str) -> Self {
        Self {
            response,
            user_id: user_id.to_string(),
            query_text: query_text.to_string(),
            recorded_at: Utc::now(),
        }
    }
}

/// Persists audit records. Called from a blocking worker thread.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord) -> CitationResult<()>;
}

/// Bounded queue in front of an `AuditSink`.
#[derive(Debug)]
pub struct AuditQueue {
    sender: Mutex<Option<mpsc::Sender<AuditRecord>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AuditQueue {
    /// Start the worker. Must be called from within a Tokio runtime.
    pub fn spawn(sink: Arc<dyn AuditSink>, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<AuditRecord>(capacity.max(1));
        let worker = tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                let sink = Arc::clone(&sink);
                let response_id = record.response.id.clone();
                match tokio::task::spawn_blocking(move || sink.record(&record)).await {
                    Ok(Ok(())) => debug!(response_id = %response_id, "Audit record written"),
                    Ok(Err(e)) => {
                        warn!(response_id = %response_id, error = %e, "Audit sink failed")
                    }
                    Err(e) => {
                        warn!(response_id = %response_id, error = %e, "Audit sink task panicked")
                    }
                }
            }
            debug!("Audit worker stopped");
        });
        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Hand a record to the worker without waiting. Returns false if it was dropped.
    pub fn enqueue(&self, record: AuditRecord) -> bool {
        let guard = match self.sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(sender) = guard.as_ref() else {
            warn!(response_id = %record.response.id, "Audit queue closed, dropping record");
            return false;
        };
        match sender.try_send(record) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(record)) => {
                warn!(response_id = %record.response.id, "Audit queue full, dropping record");
                false
            }
            Err(mpsc::error::TrySendError::Closed(record)) => {
                warn!(response_id = %record.response.id, "Audit worker gone, dropping record");
                false
            }
        }
    }

    /// Close the queue and wait for queued records to drain.
    pub async fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);
        let worker = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(error = %e, "Audit worker ended abnormally");
            }
        }
    }
}

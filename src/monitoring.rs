// Stage timing for the export pipeline
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::sync::Mutex;
use tracing::{debug, info};

/// Status of a tracked operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Completed,
    Failed,
}

/// Timing summary produced when an operation finishes
#[derive(Debug, Clone)]
pub struct OperationMetric {
    pub operation_name: String,
    pub status: OperationStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub records_processed: Option<usize>,
    pub metadata: Vec<(String, String)>,
}

/// Tracks one pipeline stage from start to completion
pub struct OperationTracker {
    operation_name: String,
    start_time: DateTime<Utc>,
    metadata: Mutex<Vec<(String, String)>>,
}

impl OperationTracker {
    /// Start tracking a new operation
    pub fn start(operation_name: &str) -> Self {
        debug!(operation_name = operation_name, "Started operation");

        Self {
            operation_name: operation_name.to_string(),
            start_time: Utc::now(),
            metadata: Mutex::new(Vec::new()),
        }
    }

    /// Add metadata to the operation
    pub fn add_metadata(&self, key: &str, value: impl Display) {
        let value = value.to_string();
        debug!(
            operation_name = %self.operation_name,
            key = key,
            value = %value,
            "Added operation metadata"
        );
        if let Ok(mut metadata) = self.metadata.lock() {
            metadata.push((key.to_string(), value));
        }
    }

    /// Mark operation as successfully completed
    pub fn complete_success(&self, records_processed: usize) -> OperationMetric {
        let metric = self.finish(OperationStatus::Completed, Some(records_processed));

        info!(
            operation_name = %metric.operation_name,
            duration_ms = metric.duration_ms,
            records_processed = records_processed,
            "Operation completed successfully"
        );

        metric
    }

    /// Mark operation as failed.
    ///
    /// Recorded at debug level only; the caller that gives up on the error
    /// owns the single error line for it.
    pub fn complete_failure(&self, err: &impl Display) -> OperationMetric {
        let metric = self.finish(OperationStatus::Failed, None);

        debug!(
            operation_name = %metric.operation_name,
            duration_ms = metric.duration_ms,
            error = %err,
            "Operation failed"
        );

        metric
    }

    fn finish(&self, status: OperationStatus, records_processed: Option<usize>) -> OperationMetric {
        let end_time = Utc::now();
        let duration_ms = end_time
            .signed_duration_since(self.start_time)
            .num_milliseconds()
            .max(0) as u64;
        let metadata = self
            .metadata
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default();

        OperationMetric {
            operation_name: self.operation_name.clone(),
            status,
            start_time: self.start_time,
            end_time,
            duration_ms,
            records_processed,
            metadata,
        }
    }
}

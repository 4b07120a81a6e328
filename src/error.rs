use std::fmt;

use thiserror::Error;

/// Result alias used across the kitchen core.
pub type Result<T, E = KitchenError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum KitchenError {
    #[error("Order queue corrupted: {0}")]
    QueueCorruption(String),

    #[error("Completion log {stage} failed: {source}")]
    LogWrite {
        stage: LogStage,
        #[source]
        source: std::io::Error,
    },

    #[error("Completion log corrupted: {0}")]
    LogCorruption(String),

    #[error("Completion log is already closed")]
    LogClosed,

    #[error("Worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("Kitchen service already started")]
    AlreadyStarted,

    #[error("Order #{0} has an empty description")]
    EmptyDescription(u64),

    #[error("Worker {worker} cannot handle {event} while {state}")]
    InvalidTransition {
        worker: String,
        state: crate::worker::WorkerState,
        event: crate::worker::WorkerEvent,
    },

    #[error("Worker {0} panicked")]
    WorkerPanicked(String),

    #[error("Malformed log line {line}: {reason}")]
    MalformedLog { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// The completion log operation that hit an I/O failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LogStage {
    Initialize,
    Append,
    Finalize,
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStage::Initialize => write!(f, "initialize"),
            LogStage::Append => write!(f, "append"),
            LogStage::Finalize => write!(f, "finalize"),
        }
    }
}

impl KitchenError {
    pub(crate) fn log_write(stage: LogStage) -> impl FnOnce(std::io::Error) -> Self {
        move |source| KitchenError::LogWrite { stage, source }
    }
}

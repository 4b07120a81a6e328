use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a cook.
///
/// Each cook flows through: RUNNING → (PROCESSING → LOGGING → RUNNING)* → TERMINATED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    Running,
    Processing,
    Logging,
    Terminated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Running => write!(f, "RUNNING"),
            WorkerState::Processing => write!(f, "PROCESSING"),
            WorkerState::Logging => write!(f, "LOGGING"),
            WorkerState::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// Something that happened to a cook, driving its next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerEvent {
    /// An order was taken from the queue.
    Took,
    /// The queue reported empty.
    QueueEmpty,
    /// The shared cancel flag was raised.
    Cancelled,
    /// The simulated preparation finished.
    Prepared,
    /// The completion record was written.
    Logged,
    /// Taking or logging failed.
    Failed,
}

impl fmt::Display for WorkerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerEvent::Took => write!(f, "TOOK"),
            WorkerEvent::QueueEmpty => write!(f, "QUEUE_EMPTY"),
            WorkerEvent::Cancelled => write!(f, "CANCELLED"),
            WorkerEvent::Prepared => write!(f, "PREPARED"),
            WorkerEvent::Logged => write!(f, "LOGGED"),
            WorkerEvent::Failed => write!(f, "FAILED"),
        }
    }
}

impl WorkerState {
    /// Computes the state reached by applying `event`, or `None` when the
    /// event makes no sense in the current state.
    ///
    /// - `Running` takes an order (`Processing`) or stops on empty,
    ///   cancellation or failure.
    /// - `Processing` only ever finishes preparing.
    /// - `Logging` returns to `Running` once written, or stops on failure.
    /// - `Terminated` is final.
    pub fn next(self, event: WorkerEvent) -> Option<WorkerState> {
        use WorkerEvent as E;
        use WorkerState as S;

        match (self, event) {
            (S::Running, E::Took) => Some(S::Processing),
            (S::Running, E::QueueEmpty | E::Cancelled | E::Failed) => Some(S::Terminated),
            (S::Processing, E::Prepared) => Some(S::Logging),
            (S::Logging, E::Logged) => Some(S::Running),
            (S::Logging, E::Failed) => Some(S::Terminated),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == WorkerState::Terminated
    }
}

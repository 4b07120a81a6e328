//! Concurrent kitchen simulation.
//!
//! A [`Kitchen`] owns a shared [`WorkQueue`] of orders and an append-only
//! [`CompletionLog`]. Starting the kitchen spawns one OS thread per cook;
//! each cook pulls orders until the queue is empty, simulates the
//! preparation, and records the completion. The kitchen joins every cook
//! and closes the log with a footer before returning.

pub mod error;
pub mod kitchen;
pub mod log;
pub mod menu;
pub mod observer;
pub mod order;
pub mod queue;
pub mod worker;

pub use error::{KitchenError, LogStage, Result};
pub use kitchen::{Kitchen, RunSummary};
pub use log::{CompletionLog, CompletionRecord, LogFormat, LogMedium, ParsedLog};
pub use observer::{KitchenObserver, NoopObserver};
pub use order::WorkItem;
pub use queue::WorkQueue;
pub use worker::{PrepTime, Worker, WorkerReport, WorkerState};

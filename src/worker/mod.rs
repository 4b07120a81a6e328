mod cook;
mod prep;
mod state;

pub use cook::{Worker, WorkerContext, WorkerReport, worker_name};
pub use prep::PrepTime;
pub use state::{WorkerEvent, WorkerState};

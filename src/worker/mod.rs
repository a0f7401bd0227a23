//! Queue consumers: the score-ordered killmail queue, the handlers that process its entries
//! and the pool that runs them.

pub mod handler;
pub mod pool;
pub mod queue;

pub use handler::{Disposition, ImportHandler, MessageHandler, RecalculateHandler};
pub use pool::{WorkerPool, WorkerPoolConfig};
pub use queue::{KillmailQueue, KillmailQueueConfig};

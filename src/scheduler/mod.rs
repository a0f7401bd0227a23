//! Background work that runs on a timer rather than off the queue: the expired entity
//! refreshers and the daily market price cron job.

pub mod cron;
pub mod refresh;

pub use refresh::{Alliances, Characters, Corporations, RefreshConfig, Refresher};

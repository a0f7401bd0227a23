//! Domain models passed between the queue, services and workers.

pub mod killmail;

//! Business logic layered over the repositories, the cache and ESI.

pub mod eve;
pub mod killmail;
pub mod market;
pub mod retry;

//! Constant values shared across tests.

/// User agent string for test ESI client requests.
pub static TEST_USER_AGENT: &str = "wreckage-tests/1.0 (contact@example.com)";

/// Killmail time used by killmail fixtures, prices are dated relative to it.
pub static TEST_KILLMAIL_TIME: &str = "2024-06-15T18:30:00Z";

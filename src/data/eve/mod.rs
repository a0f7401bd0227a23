pub mod alliance;
pub mod blueprint;
pub mod character;
pub mod corporation;
pub mod types;
pub mod universe;

/// Refresh bookkeeping shared by alliances, corporations and characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshState {
    pub cached_until: i64,
    pub etag: Option<String>,
    pub not_modified_count: i32,
    pub update_priority: i32,
    pub update_error: i32,
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricingError {
    /// A blueprint's material tree references a type already being priced on the current path.
    #[error("blueprint material cycle detected while pricing type {type_id}: {path:?}")]
    BlueprintCycle { type_id: i64, path: Vec<i64> },
}

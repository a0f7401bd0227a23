use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestError {
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),
    #[error(transparent)]
    RedisError(#[from] fred::error::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

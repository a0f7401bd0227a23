//! Connection setup shared by every subcommand.

use fred::prelude::{ClientLike, Config as RedisConfig, Pool};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::{
    config::Config,
    error::{Error, ResultExt},
    esi::{EsiClient, EsiTracker},
};

/// Valkey connections in the shared pool
const VALKEY_POOL_SIZE: usize = 6;

/// Build the ESI client around the process wide error budget tracker
pub fn build_esi_client(config: &Config, tracker: EsiTracker) -> Result<EsiClient, Error> {
    EsiClient::new(&config.esi_url, &config.user_agent, tracker)
}

/// Connect to the database and run migrations
pub async fn connect_to_database(config: &Config) -> Result<DatabaseConnection, Error> {
    use migration::{Migrator, MigratorTrait};

    let mut opt = ConnectOptions::new(&config.database_url);
    opt.sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .context("failed to connect to database")?;

    Migrator::up(&db, None)
        .await
        .context("failed to run database migrations")?;

    Ok(db)
}

/// Connect to Valkey for the cache, queues and notifications
pub async fn connect_to_valkey(config: &Config) -> Result<Pool, Error> {
    let redis_config = RedisConfig::from_url(&config.valkey_url)?;
    let pool = Pool::new(redis_config, None, None, None, VALKEY_POOL_SIZE)?;

    pool.connect();
    pool.wait_for_connect()
        .await
        .context("failed to connect to valkey")?;

    Ok(pool)
}
